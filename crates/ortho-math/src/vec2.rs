// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::{Fix64, MathError, Vec3};

/// Deterministic 2D vector over [`Fix64`].
///
/// In the simulation the two components are the world X and Z axes of the
/// ground plane; `Vec3::xz` and `Vec2::to_xz` convert between the two.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    /// First component (world X).
    pub x: Fix64,
    /// Second component (world Z).
    pub y: Fix64,
}

impl Vec2 {
    /// `(0, 0)`.
    pub const ZERO: Self = Self::new(Fix64::ZERO, Fix64::ZERO);
    /// `(1, 1)`.
    pub const ONE: Self = Self::new(Fix64::ONE, Fix64::ONE);
    /// `(1, 0)`.
    pub const UNIT_X: Self = Self::new(Fix64::ONE, Fix64::ZERO);
    /// `(0, 1)`.
    pub const UNIT_Y: Self = Self::new(Fix64::ZERO, Fix64::ONE);

    /// Creates a vector from components.
    pub const fn new(x: Fix64, y: Fix64) -> Self {
        Self { x, y }
    }

    /// Creates a vector from integer components.
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fix64::from_int(x), Fix64::from_int(y))
    }

    /// Lifts `(x, y)` into 3D as `(x, height, y)`.
    pub const fn to_xz(self, height: Fix64) -> Vec3 {
        Vec3::new(self.x, height, self.y)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> Fix64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar (z-component) cross product.
    pub fn cross(self, other: Self) -> Fix64 {
        self.x * other.y - self.y * other.x
    }

    /// Counter-clockwise perpendicular `(-y, x)`.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Squared length.
    pub fn sqr_magnitude(self) -> Fix64 {
        self.dot(self)
    }

    /// Length.
    pub fn magnitude(self) -> Fix64 {
        self.sqr_magnitude().sqrt()
    }

    /// Unit-length copy; vectors with `sqr_magnitude < EPSILON` come back unchanged.
    pub fn normalize(self) -> Self {
        let sqr = self.sqr_magnitude();
        if sqr < Fix64::EPSILON {
            return self;
        }
        self / sqr.sqrt()
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: Fix64) -> Self {
        let t = t.clamp(Fix64::ZERO, Fix64::ONE);
        self + (other - self) * t
    }

    /// Per-component [`Fix64::approximately`].
    pub fn approximately(self, other: Self) -> bool {
        self.x.approximately(other.x) && self.y.approximately(other.y)
    }

    /// Checked component access.
    pub fn component(self, index: usize) -> Result<Fix64, MathError> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            _ => Err(MathError::ComponentIndex { index, len: 2 }),
        }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<Fix64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: Fix64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for Fix64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl Div<Fix64> for Vec2 {
    type Output = Self;

    fn div(self, rhs: Fix64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<Fix64> for Vec2 {
    fn mul_assign(&mut self, rhs: Fix64) {
        *self = *self * rhs;
    }
}

impl Index<usize> for Vec2 {
    type Output = Fix64;

    #[allow(clippy::panic)]
    fn index(&self, index: usize) -> &Fix64 {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Vec2 index {index} out of range"),
        }
    }
}

impl IndexMut<usize> for Vec2 {
    #[allow(clippy::panic)]
    fn index_mut(&mut self, index: usize) -> &mut Fix64 {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("Vec2 index {index} out of range"),
        }
    }
}

impl From<[Fix64; 2]> for Vec2 {
    fn from([x, y]: [Fix64; 2]) -> Self {
        Self::new(x, y)
    }
}
