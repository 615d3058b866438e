// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::{Fix64, MathError, Vec2};

/// Deterministic 3D vector over [`Fix64`].
///
/// * Components are world-space metres; Y is the vertical axis.
/// * Points and directions share the type; callers decide the meaning.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    /// X component.
    pub x: Fix64,
    /// Y (vertical) component.
    pub y: Fix64,
    /// Z component.
    pub z: Fix64,
}

impl Vec3 {
    /// `(0, 0, 0)`.
    pub const ZERO: Self = Self::new(Fix64::ZERO, Fix64::ZERO, Fix64::ZERO);
    /// `(1, 1, 1)`.
    pub const ONE: Self = Self::new(Fix64::ONE, Fix64::ONE, Fix64::ONE);
    /// Unit vector along +X.
    pub const UNIT_X: Self = Self::new(Fix64::ONE, Fix64::ZERO, Fix64::ZERO);
    /// Unit vector along +Y.
    pub const UNIT_Y: Self = Self::new(Fix64::ZERO, Fix64::ONE, Fix64::ZERO);
    /// Unit vector along +Z.
    pub const UNIT_Z: Self = Self::new(Fix64::ZERO, Fix64::ZERO, Fix64::ONE);

    /// Creates a vector from components.
    pub const fn new(x: Fix64, y: Fix64, z: Fix64) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector from integer components.
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fix64::from_int(x), Fix64::from_int(y), Fix64::from_int(z))
    }

    /// Boundary conversion from `f32` components.
    pub fn from_f32s([x, y, z]: [f32; 3]) -> Self {
        Self::new(Fix64::from_f32(x), Fix64::from_f32(y), Fix64::from_f32(z))
    }

    /// Components as `f32` for display and interop.
    pub fn to_f32s(self) -> [f32; 3] {
        [self.x.to_f32(), self.y.to_f32(), self.z.to_f32()]
    }

    /// Ground-plane projection `(x, z)`.
    pub const fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> Fix64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared length.
    pub fn sqr_magnitude(self) -> Fix64 {
        self.dot(self)
    }

    /// Length.
    pub fn magnitude(self) -> Fix64 {
        self.sqr_magnitude().sqrt()
    }

    /// Unit-length copy; degenerate vectors (`sqr_magnitude < EPSILON`) are
    /// returned unchanged.
    pub fn normalize(self) -> Self {
        let sqr = self.sqr_magnitude();
        if sqr < Fix64::EPSILON {
            return self;
        }
        self / sqr.sqrt()
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: Fix64) -> Self {
        let t = t.clamp(Fix64::ZERO, Fix64::ONE);
        self + (other - self) * t
    }

    /// Per-component [`Fix64::approximately`].
    pub fn approximately(self, other: Self) -> bool {
        self.x.approximately(other.x)
            && self.y.approximately(other.y)
            && self.z.approximately(other.z)
    }

    /// Checked component access.
    pub fn component(self, index: usize) -> Result<Fix64, MathError> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            2 => Ok(self.z),
            _ => Err(MathError::ComponentIndex { index, len: 3 }),
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Fix64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: Fix64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for Fix64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl Div<Fix64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: Fix64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<Fix64> for Vec3 {
    fn mul_assign(&mut self, rhs: Fix64) {
        *self = *self * rhs;
    }
}

impl Index<usize> for Vec3 {
    type Output = Fix64;

    #[allow(clippy::panic)]
    fn index(&self, index: usize) -> &Fix64 {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index {index} out of range"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    #[allow(clippy::panic)]
    fn index_mut(&mut self, index: usize) -> &mut Fix64 {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Vec3 index {index} out of range"),
        }
    }
}

impl From<[Fix64; 3]> for Vec3 {
    fn from([x, y, z]: [Fix64; 3]) -> Self {
        Self::new(x, y, z)
    }
}
