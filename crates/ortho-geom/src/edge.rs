// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::Vec2;

/// Oriented segment `point1 → point2` with its cached unit direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Start point.
    pub point1: Vec2,
    /// End point.
    pub point2: Vec2,
    /// `normalize(point2 - point1)`.
    pub direction: Vec2,
}

impl Edge {
    /// Builds an edge and derives its direction.
    pub fn new(point1: Vec2, point2: Vec2) -> Self {
        Self {
            point1,
            point2,
            direction: (point2 - point1).normalize(),
        }
    }

    /// Point of this (incident) edge closest to the deeper end of `reference`.
    ///
    /// The reference endpoint with the smaller projection on this edge's normal
    /// is projected onto this edge's direction and clamped into its extent.
    pub fn contact_point(&self, reference: &Self) -> Vec2 {
        let normal = self.direction.perpendicular();
        let reference_point = if reference.point1.dot(normal) < reference.point2.dot(normal) {
            reference.point1
        } else {
            reference.point2
        };
        let lo = self.point1.dot(self.direction);
        let hi = self.point2.dot(self.direction);
        let along = reference_point.dot(self.direction).clamp(lo, hi);
        self.point1 + self.direction * (along - lo)
    }
}
