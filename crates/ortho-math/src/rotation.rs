// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::ops::{Index, Mul, MulAssign};

use crate::{Fix64, MathError, Vec2};

/// Planar rotation stored as a unit complex number `(cos θ, sin θ)`.
///
/// Composition is complex multiplication and the inverse is the conjugate, so
/// no angle ever has to be re-derived during a step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    cos: Fix64,
    sin: Fix64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        cos: Fix64::ONE,
        sin: Fix64::ZERO,
    };

    /// Builds a rotation from raw complex parts without normalizing.
    pub const fn from_parts(cos: Fix64, sin: Fix64) -> Self {
        Self { cos, sin }
    }

    /// Rotation by `angle` radians.
    pub fn from_angle(angle: Fix64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { cos, sin }
    }

    /// Rotation taking `(1, 0)` onto `direction`; degenerate directions yield
    /// the identity.
    pub fn from_direction(direction: Vec2) -> Self {
        if direction.sqr_magnitude() < Fix64::EPSILON {
            return Self::IDENTITY;
        }
        let d = direction.normalize();
        Self { cos: d.x, sin: d.y }
    }

    /// Real part.
    pub const fn cos(self) -> Fix64 {
        self.cos
    }

    /// Imaginary part.
    pub const fn sin(self) -> Fix64 {
        self.sin
    }

    /// Angle in `(-π, π]`.
    pub fn angle(self) -> Fix64 {
        Fix64::atan2(self.sin, self.cos)
    }

    /// Image of `(1, 0)`.
    pub const fn direction(self) -> Vec2 {
        Vec2::new(self.cos, self.sin)
    }

    /// Conjugate.
    pub fn inverse(self) -> Self {
        Self {
            cos: self.cos,
            sin: -self.sin,
        }
    }

    /// Rotates a vector.
    pub fn rotate(self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// Dot product of the two complex numbers as 2D vectors; `cos` of the angle
    /// between the rotations.
    pub fn dot(self, other: Self) -> Fix64 {
        self.cos * other.cos + self.sin * other.sin
    }

    /// Re-normalizes accumulated drift; degenerate values collapse to identity.
    pub fn normalized(self) -> Self {
        Self::from_direction(self.direction())
    }

    /// Checked component access (`0 → cos`, `1 → sin`).
    pub fn component(self, index: usize) -> Result<Fix64, MathError> {
        match index {
            0 => Ok(self.cos),
            1 => Ok(self.sin),
            _ => Err(MathError::ComponentIndex { index, len: 2 }),
        }
    }
}

impl Mul for Rotation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            cos: self.cos * rhs.cos - self.sin * rhs.sin,
            sin: self.sin * rhs.cos + self.cos * rhs.sin,
        }
    }
}

impl MulAssign for Rotation {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec2> for Rotation {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        self.rotate(rhs)
    }
}

impl Index<usize> for Rotation {
    type Output = Fix64;

    #[allow(clippy::panic)]
    fn index(&self, index: usize) -> &Fix64 {
        match index {
            0 => &self.cos,
            1 => &self.sin,
            _ => panic!("Rotation index {index} out of range"),
        }
    }
}
