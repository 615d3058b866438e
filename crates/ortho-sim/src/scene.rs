// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON scene files: world settings plus a list of bodies.

use ortho_dynamics::{Body, BodyHandle, BodyKind, ConfigError, DynamicsWorld, WorldConfig};
use ortho_geom::Collider;
use ortho_math::{Fix64, Rotation, Vec3};
use serde::Deserialize;

/// Collider shape as written in a scene.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeSpec {
    /// Half extents `[hx, hy, hz]`.
    Box([Fix64; 3]),
    /// Radius.
    Sphere(Fix64),
}

/// One body entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodySpec {
    /// Optional label used in the report.
    #[serde(default)]
    pub name: Option<String>,
    pub kind: BodyKind,
    pub shape: ShapeSpec,
    #[serde(default)]
    pub position: [Fix64; 3],
    /// Rotation about the vertical axis, radians.
    #[serde(default)]
    pub angle: Fix64,
    /// Only honoured for rigid bodies.
    #[serde(default)]
    pub mass: Option<Fix64>,
    #[serde(default)]
    pub velocity: [Fix64; 3],
    #[serde(default)]
    pub drag: Fix64,
    #[serde(default)]
    pub air_drag: Fix64,
    #[serde(default)]
    pub bounciness: Fix64,
    #[serde(default)]
    pub kinematic: bool,
}

impl BodySpec {
    fn collider(&self) -> Collider {
        let [x, y, z] = self.position;
        let position = Vec3::new(x, y, z);
        match self.shape {
            ShapeSpec::Box([hx, hy, hz]) => {
                Collider::new_box(Vec3::new(hx, hy, hz), position, Rotation::from_angle(self.angle))
            }
            ShapeSpec::Sphere(radius) => Collider::new_sphere(radius, position),
        }
    }

    /// Builds the body this entry describes.
    pub fn build(&self) -> Body {
        let [vx, vy, vz] = self.velocity;
        let mut body = Body::new(self.kind, self.collider())
            .with_velocity(Vec3::new(vx, vy, vz))
            .with_drag(self.drag)
            .with_air_drag(self.air_drag)
            .with_bounciness(self.bounciness)
            .with_kinematic(self.kinematic);
        if let Some(mass) = self.mass {
            body.set_mass(mass);
        }
        body
    }

    /// Report label: the name, or `#index`.
    pub fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{index}"))
    }
}

/// A complete scene file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    #[serde(default)]
    pub world: WorldConfig,
    pub bodies: Vec<BodySpec>,
}

impl Scene {
    /// Parses a scene and checks world tuning and shape sizes.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scene: Self = serde_json::from_str(json)?;
        scene.world.validate()?;
        for (index, spec) in scene.bodies.iter().enumerate() {
            let positive = match spec.shape {
                ShapeSpec::Box(half) => half.into_iter().all(Fix64::is_positive),
                ShapeSpec::Sphere(radius) => radius.is_positive(),
            };
            if !positive {
                return Err(ConfigError::Invalid {
                    field: "bodies.shape",
                    reason: format!("body {index} has a non-positive size"),
                });
            }
        }
        Ok(scene)
    }

    /// Creates the world and adds every body in file order.
    pub fn build(&self) -> (DynamicsWorld, Vec<BodyHandle>) {
        let mut world = DynamicsWorld::with_config(&self.world);
        let handles = self
            .bodies
            .iter()
            .map(|spec| world.add_body(spec.build()))
            .collect();
        (world, handles)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    const DROP: &str = r#"{
        "world": { "gravity": -10.0 },
        "bodies": [
            { "name": "floor", "kind": "static", "shape": { "box": [5.0, 0.5, 5.0] }, "position": [0.0, 0.5, 0.0] },
            { "kind": "rigid", "shape": { "sphere": 0.5 }, "position": [0.0, 4.0, 0.0], "mass": 2.0, "bounciness": 0.5 },
            { "kind": "trigger", "shape": { "box": [1.0, 1.0, 1.0] }, "angle": 0.5, "kinematic": true }
        ]
    }"#;

    #[test]
    fn parses_bodies_with_defaults() {
        let scene = Scene::from_json_str(DROP).expect("scene parses");
        assert_eq!(scene.world.gravity, Fix64::from_int(-10));
        assert_eq!(scene.world.velocity_iterations, 8);
        assert_eq!(scene.bodies.len(), 3);
        assert_eq!(scene.bodies[0].label(0), "floor");
        assert_eq!(scene.bodies[1].label(1), "#1");
        assert_eq!(scene.bodies[1].shape, ShapeSpec::Sphere(Fix64::HALF));
        assert_eq!(scene.bodies[2].velocity, [Fix64::ZERO; 3]);
        assert!(scene.bodies[2].kinematic);
    }

    #[test]
    fn build_applies_body_settings() {
        let scene = Scene::from_json_str(DROP).expect("scene parses");
        let (world, handles) = scene.build();
        assert_eq!(world.len(), 3);
        assert_eq!(world.gravity(), Fix64::from_int(-10));
        let ball = world.body(handles[1]).expect("ball");
        assert_eq!(ball.mass(), Fix64::TWO);
        assert_eq!(ball.bounciness(), Fix64::HALF);
        assert_eq!(world.trigger_bodies(), &handles[2..]);
    }

    #[test]
    fn rejects_degenerate_shapes_and_unknown_fields() {
        let flat = r#"{ "bodies": [ { "kind": "static", "shape": { "sphere": 0.0 } } ] }"#;
        assert!(matches!(
            Scene::from_json_str(flat),
            Err(ConfigError::Invalid { field: "bodies.shape", .. })
        ));
        let typo = r#"{ "bodies": [ { "kind": "rigid", "shape": { "sphere": 1.0 }, "veloctiy": [1, 0, 0] } ] }"#;
        assert!(matches!(Scene::from_json_str(typo), Err(ConfigError::Json(_))));
        let capsule = r#"{ "bodies": [ { "kind": "rigid", "shape": { "capsule": 1.0 } } ] }"#;
        assert!(Scene::from_json_str(capsule).is_err());
    }
}
