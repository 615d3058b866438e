// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::{Rotation, Vec2, Vec3};

/// Placement of a collider: a 3D position plus a rotation about the vertical axis.
///
/// Conventions:
/// - `position` in metres, world space; Y is height.
/// - 2D conversions operate on the XZ plane:
///   `world = position.xz + rotation · local`, and the inverse uses the
///   conjugate rotation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Transform {
    position: Vec3,
    rotation: Rotation,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Rotation::IDENTITY,
    };

    /// Creates a transform from components.
    pub const fn new(position: Vec3, rotation: Rotation) -> Self {
        Self { position, rotation }
    }

    /// Position component.
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation component.
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Replaces the position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Replaces the rotation.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Shifts the position on the ground plane, leaving height untouched.
    pub fn translate_xz(&mut self, delta: Vec2) {
        self.position.x += delta.x;
        self.position.z += delta.y;
    }

    /// Local ground-plane point to world.
    pub fn to_world_2d(&self, local: Vec2) -> Vec2 {
        self.position.xz() + self.rotation.rotate(local)
    }

    /// World ground-plane point to local.
    pub fn to_local_2d(&self, world: Vec2) -> Vec2 {
        self.rotation.inverse().rotate(world - self.position.xz())
    }
}
