// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::{Fix64, Vec2};

use crate::Transform;

/// Result of contact generation for one pair.
///
/// `normal` points from body 1 toward body 2 on the ground plane. Contact
/// points are stored in each body's local space so they follow the bodies
/// while the solver moves them. A zero normal means "no contact".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ContactManifold {
    /// World-space contact normal, body 1 → body 2.
    pub normal: Vec2,
    /// Contact point on body 1, in body 1's local space.
    pub point1: Vec2,
    /// Contact point on body 2, in body 2's local space.
    pub point2: Vec2,
}

impl ContactManifold {
    /// The "no contact" sentinel.
    pub const EMPTY: Self = Self {
        normal: Vec2::ZERO,
        point1: Vec2::ZERO,
        point2: Vec2::ZERO,
    };

    /// `true` for the sentinel (zero normal).
    pub fn is_empty(&self) -> bool {
        self.normal == Vec2::ZERO
    }

    /// Same contact seen from the other body.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            point1: self.point2,
            point2: self.point1,
        }
    }

    /// Current penetration along the normal given the bodies' latest
    /// transforms; positive while the shapes overlap.
    pub fn penetration_depth(&self, transform1: &Transform, transform2: &Transform) -> Fix64 {
        let p1 = transform1.to_world_2d(self.point1);
        let p2 = transform2.to_world_2d(self.point2);
        (p1 - p2).dot(self.normal)
    }
}
