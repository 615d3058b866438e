// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Sequential-impulse velocity pass and capped positional correction.

use ortho_math::{Fix64, Vec2};
use serde::{Deserialize, Serialize};

use crate::body::{BodyKind, BodySet};
use crate::constraint::{ConstraintBuffers, ContactConstraint};

/// Positional-correction constants. Stacking and jitter behaviour depend on
/// these non-obviously; change them together.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverTuning {
    /// Fraction of the penetration removed per position iteration.
    pub correction_scale: Fix64,
    /// Extra depth added before scaling.
    pub correction_slop: Fix64,
    /// Hard cap on a single correction.
    pub max_correction: Fix64,
}

impl SolverTuning {
    /// `0.2` scale, `0.005` slop, `0.1` cap.
    pub const DEFAULT: Self = Self {
        correction_scale: Fix64::from_ratio(1, 5),
        correction_slop: Fix64::from_ratio(1, 200),
        max_correction: Fix64::from_ratio(1, 10),
    };

    fn correction(&self, depth: Fix64) -> Fix64 {
        self.max_correction
            .min(depth)
            .min(self.correction_scale * (depth + self.correction_slop))
    }

    fn retraction(&self, distance: Fix64) -> Fix64 {
        self.max_correction
            .min(distance)
            .min((Fix64::ONE - self.correction_scale) * (distance + self.correction_slop))
    }
}

impl Default for SolverTuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Iteration counts and thresholds for both solver passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSolver {
    /// Velocity iterations over the current slot.
    pub velocity_iterations: u32,
    /// Position iterations per ring slot.
    pub position_iterations: u32,
    /// Static contacts needed before the trap branch takes over.
    pub trap_threshold: u32,
    /// Correction constants.
    pub tuning: SolverTuning,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self {
            velocity_iterations: crate::DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: crate::DEFAULT_POSITION_ITERATIONS,
            trap_threshold: trap_threshold_for(crate::DEFAULT_CONSTRAINT_BUFFER_COUNT),
            tuning: SolverTuning::DEFAULT,
        }
    }
}

/// Trap threshold derived from the ring length.
pub(crate) fn trap_threshold_for(slots: usize) -> u32 {
    u32::try_from(slots).unwrap_or(u32::MAX).saturating_add(1)
}

impl ContactSolver {
    /// Runs the velocity iterations over one slot.
    pub fn solve_velocity(&self, buffers: &mut ConstraintBuffers, slot: usize, bodies: &mut BodySet) {
        for _ in 0..self.velocity_iterations {
            buffers.for_each_in_slot(slot, |c| solve_velocity_constraint(c, bodies));
        }
    }

    /// Runs the position iterations over one slot.
    pub fn solve_position(&self, buffers: &mut ConstraintBuffers, slot: usize, bodies: &mut BodySet) {
        for _ in 0..self.position_iterations {
            buffers.for_each_in_slot(slot, |c| self.solve_position_constraint(c, bodies));
        }
    }

    fn solve_position_constraint(&self, c: &mut ContactConstraint, bodies: &mut BodySet) {
        let Some((b1, b2)) = bodies.pair_mut(c.body1, c.body2) else {
            return;
        };
        let normal = c.manifold.normal;
        let depth = c.manifold.penetration_depth(b1.transform(), b2.transform());
        if depth < Fix64::EPSILON {
            return;
        }

        if b2.kind() == BodyKind::Static && b1.static_collision_count() >= self.trap_threshold {
            if c.trap_penetration_depth > depth {
                c.trap_penetration_depth = depth;
                b1.translate_2d(-normal * self.tuning.correction(depth));
            } else {
                let movement = b1.transform().position().xz() - b1.collision_free_position();
                let sqr = movement.sqr_magnitude();
                if sqr > Fix64::EPSILON {
                    let distance = sqr.sqrt();
                    let retract = self.tuning.retraction(distance);
                    b1.translate_2d(movement / distance * -retract);
                }
            }
            return;
        }

        let push: Vec2 = normal * self.tuning.correction(depth) * c.normal_mass;
        let (inv1, inv2) = (b1.inverse_mass(), b2.inverse_mass());
        b1.translate_2d(-push * inv1);
        b2.translate_2d(push * inv2);
    }
}

fn solve_velocity_constraint(c: &mut ContactConstraint, bodies: &mut BodySet) {
    let Some((b1, b2)) = bodies.pair_mut(c.body1, c.body2) else {
        return;
    };
    let normal = c.manifold.normal;
    let vn = (b1.velocity() - b2.velocity()).xz().dot(normal);
    if vn.abs() < Fix64::EPSILON {
        return;
    }
    let delta = c.normal_mass * (vn + c.restitution_bias);
    let accumulated = (c.normal_impulse + delta).max(Fix64::ZERO);
    let applied = accumulated - c.normal_impulse;
    c.normal_impulse = accumulated;
    let impulse = normal * applied;
    b1.add_impulse_2d(-impulse);
    b2.add_impulse_2d(impulse);
}

/// Approach speed along the normal, scaled by the combined bounciness.
pub(crate) fn restitution_bias(
    velocity1: Vec2,
    velocity2: Vec2,
    normal: Vec2,
    bounciness: Fix64,
) -> Fix64 {
    bounciness * (velocity1 - velocity2).dot(normal).max(Fix64::ZERO)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use ortho_geom::{Collider, ContactManifold};
    use ortho_math::{Rotation, Vec3};

    use super::*;
    use crate::body::{Body, BodyHandle};

    /// Unit-wide rigid box at `body_x` touching a static box at `wall_x` on
    /// its +X face, already at the trap threshold.
    fn trapped_pair(body_x: Fix64, wall_x: Fix64) -> (BodySet, BodyHandle, ContactConstraint) {
        let half = Vec3::ONE * Fix64::HALF;
        let mut bodies = BodySet::new();
        let mover = bodies.insert(Body::rigid(Collider::new_box(half, Vec3::ZERO, Rotation::IDENTITY)));
        let wall = bodies.insert(Body::fixed(Collider::new_box(
            half,
            Vec3::new(wall_x, Fix64::ZERO, Fix64::ZERO),
            Rotation::IDENTITY,
        )));
        let body = bodies.get_mut(mover).expect("mover");
        body.transform_mut()
            .set_position(Vec3::new(body_x, Fix64::ZERO, Fix64::ZERO));
        for _ in 0..trap_threshold_for(crate::DEFAULT_CONSTRAINT_BUFFER_COUNT) {
            body.count_static_collision();
        }
        let manifold = ContactManifold {
            normal: Vec2::UNIT_X,
            point1: Vec2::new(Fix64::HALF, Fix64::ZERO),
            point2: Vec2::new(-Fix64::HALF, Fix64::ZERO),
        };
        let constraint = ContactConstraint::new(mover, wall, Fix64::ONE, Fix64::ZERO, manifold);
        (bodies, mover, constraint)
    }

    fn depth_of(bodies: &BodySet, c: &ContactConstraint) -> Fix64 {
        let (b1, b2) = (bodies.get(c.body1).expect("b1"), bodies.get(c.body2).expect("b2"));
        c.manifold.penetration_depth(b1.transform(), b2.transform())
    }

    fn solve_once(bodies: &mut BodySet, constraint: ContactConstraint) -> ContactConstraint {
        let solver = ContactSolver {
            position_iterations: 1,
            ..ContactSolver::default()
        };
        let mut buffers = ConstraintBuffers::new(1);
        let id = buffers.push(constraint);
        let slot = buffers.current();
        solver.solve_position(&mut buffers, slot, bodies);
        *buffers.get(id).expect("pushed")
    }

    #[test]
    fn trap_pushes_out_along_normal_on_deepest_contact() {
        let t = SolverTuning::DEFAULT;
        let (mut bodies, mover, constraint) = trapped_pair(Fix64::ZERO, Fix64::from_ratio(9, 10));
        let depth = depth_of(&bodies, &constraint);
        assert!(depth > Fix64::EPSILON);

        let after = solve_once(&mut bodies, constraint);
        assert_eq!(after.trap_penetration_depth, depth);
        let position = bodies.get(mover).expect("mover").transform().position();
        assert_eq!(position.x, -t.correction(depth));
        assert_eq!(position.z, Fix64::ZERO);
        assert!(t.correction(depth) < depth);
    }

    #[test]
    fn trap_retracts_toward_collision_free_position_otherwise() {
        let t = SolverTuning::DEFAULT;
        let body_x = Fix64::from_ratio(3, 10);
        let (mut bodies, mover, mut constraint) = trapped_pair(body_x, Fix64::from_ratio(12, 10));
        constraint.trap_penetration_depth = Fix64::ZERO;
        assert!(depth_of(&bodies, &constraint) > Fix64::EPSILON);
        let start = bodies.get(mover).expect("mover").collision_free_position();
        assert_eq!(start, Vec2::ZERO);

        let after = solve_once(&mut bodies, constraint);
        assert_eq!(after.trap_penetration_depth, Fix64::ZERO);

        let movement = Vec2::new(body_x, Fix64::ZERO) - start;
        let distance = movement.sqr_magnitude().sqrt();
        let expected = body_x + (movement / distance * -t.retraction(distance)).x;
        let position = bodies.get(mover).expect("mover").transform().position();
        assert_eq!(position.x, expected);
        assert!(position.x < body_x && position.x > Fix64::ZERO);
        assert_eq!(position.z, Fix64::ZERO);
    }

    #[test]
    fn correction_is_capped_three_ways() {
        let t = SolverTuning::DEFAULT;
        assert_eq!(t.correction(Fix64::ONE), t.max_correction);
        let shallow = Fix64::from_ratio(1, 1000);
        assert_eq!(t.correction(shallow), shallow);
        let mid = Fix64::from_ratio(1, 50);
        assert_eq!(t.correction(mid), t.correction_scale * (mid + t.correction_slop));
    }

    #[test]
    fn receding_contacts_get_no_bias() {
        let n = Vec2::UNIT_X;
        let away = restitution_bias(-Vec2::UNIT_X, Vec2::UNIT_X, n, Fix64::ONE);
        assert_eq!(away, Fix64::ZERO);
        let toward = restitution_bias(Vec2::UNIT_X, -Vec2::UNIT_X, n, Fix64::HALF);
        assert_eq!(toward, Fix64::ONE);
    }
}
