// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::{Fix64, Vec2};

/// Closed 1D range `[min, max]`, typically a shape projected onto an axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    /// Lower end.
    pub min: Fix64,
    /// Upper end.
    pub max: Fix64,
}

impl Interval {
    /// Constructs an interval (no ordering check).
    pub const fn new(min: Fix64, max: Fix64) -> Self {
        Self { min, max }
    }

    /// Interval of `center ± radius`.
    pub fn around(center: Fix64, radius: Fix64) -> Self {
        Self::new(center - radius, center + radius)
    }

    /// Projection of `points` onto `axis`.
    pub fn project(points: &[Vec2], axis: Vec2) -> Self {
        let mut iter = points.iter().map(|p| axis.dot(*p));
        let first = iter.next().unwrap_or(Fix64::ZERO);
        iter.fold(Self::new(first, first), |acc, d| {
            Self::new(acc.min.min(d), acc.max.max(d))
        })
    }

    /// Signed overlap `min(a.max - b.min, b.max - a.min)`; negative means disjoint.
    pub fn overlap(&self, other: &Self) -> Fix64 {
        (self.max - other.min).min(other.max - self.min)
    }
}
