// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::{Fix64, Vec2, Vec3};

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `min <= max` component-wise, except for [`Bounds::INVALID`].
/// - `INVALID` (`min = (1,1,1)`, `max = (-1,-1,-1)`) is the identity of
///   [`Bounds::safe_combine`], so unions can be folded from it.
///
/// Intersection tests are strict (open intervals): boxes that only touch do
/// not intersect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Bounds {
    /// Sentinel used as the starting value of incremental unions.
    pub const INVALID: Self = Self {
        min: Vec3::ONE,
        max: Vec3::new(
            Fix64::from_int(-1),
            Fix64::from_int(-1),
            Fix64::from_int(-1),
        ),
    };

    /// Constructs bounds from corners (no validation).
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds centred at `center` with the given half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * Fix64::HALF
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// `true` unless this is the invalid sentinel or otherwise inverted.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Ground-plane footprint.
    pub const fn xz(&self) -> Bounds2D {
        Bounds2D::new(self.min.xz(), self.max.xz())
    }

    /// Strict overlap on all three axes.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }

    /// Strict overlap on X and Z only.
    pub fn intersects_2d(&self, other: &Self) -> bool {
        self.xz().intersects(&other.xz())
    }

    /// `true` when the vertical extents are disjoint (touching counts as overlap).
    pub fn separated_vertically(&self, other: &Self) -> bool {
        self.min.y > other.max.y || other.min.y > self.max.y
    }

    /// Smallest box containing both inputs.
    pub fn combine(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Like [`Bounds::combine`] but treats [`Bounds::INVALID`] as empty.
    pub fn safe_combine(&self, other: &Self) -> Self {
        if *self == Self::INVALID {
            return *other;
        }
        if *other == Self::INVALID {
            return *self;
        }
        self.combine(other)
    }
}

/// Axis-aligned rectangle on the XZ ground plane (`x` = world X, `y` = world Z).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Bounds2D {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Default for Bounds2D {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Bounds2D {
    /// Sentinel used as the starting value of incremental unions.
    pub const INVALID: Self = Self {
        min: Vec2::ONE,
        max: Vec2::new(Fix64::from_int(-1), Fix64::from_int(-1)),
    };

    /// Constructs bounds from corners (no validation).
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Midpoint.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * Fix64::HALF
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// `true` unless inverted.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Strict overlap on both axes.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Smallest rectangle containing both inputs.
    pub fn combine(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Like [`Bounds2D::combine`] but treats [`Bounds2D::INVALID`] as empty.
    pub fn safe_combine(&self, other: &Self) -> Self {
        if *self == Self::INVALID {
            return *other;
        }
        if *other == Self::INVALID {
            return *self;
        }
        self.combine(other)
    }
}
