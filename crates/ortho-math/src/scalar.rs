// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Deterministic Q32.32 fixed-point scalar.
//!
//! Every physics quantity in Ortho flows through [`Fix64`]. The value is an
//! `i64` scaled by `2^32`, so two machines fed the same inputs produce the same
//! bits regardless of FPU mode, compiler flags, or libm flavour.
//!
//! Determinism contract:
//! - Addition, subtraction and negation saturate at `MIN`/`MAX`.
//! - Multiplication and division round to nearest, ties to even.
//! - Transcendentals (`sqrt`, `sin`, `cos`, `atan2`) are evaluated in integer
//!   space; no platform float routine is ever consulted.
//! - `from_f32`/`to_f32` are bit-level conversions meant for I/O boundaries.

use core::cmp::Ordering;
use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::fixed_q32_32 as q;
use crate::trig;

/// Deterministic fixed-point scalar with Q32.32 encoding stored in an `i64`.
///
/// ```text
/// real_value = raw / 2^32
/// ```
///
/// Ordering and equality are those of the raw integer, so they are total and
/// exact.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fix64 {
    raw: i64,
}

impl Fix64 {
    /// `0`.
    pub const ZERO: Self = Self { raw: 0 };
    /// `1`.
    pub const ONE: Self = Self { raw: q::ONE_RAW };
    /// `2`.
    pub const TWO: Self = Self { raw: 2 * q::ONE_RAW };
    /// `0.5`.
    pub const HALF: Self = Self { raw: q::HALF_RAW };
    /// π rounded to the nearest representable value.
    pub const PI: Self = Self { raw: 13_493_037_705 };
    /// π / 2.
    pub const HALF_PI: Self = Self { raw: 6_746_518_852 };
    /// 2π.
    pub const TAU: Self = Self { raw: 26_986_075_409 };
    /// Largest representable value (≈ 2.1e9).
    pub const MAX: Self = Self { raw: i64::MAX };
    /// Smallest representable value.
    pub const MIN: Self = Self { raw: i64::MIN };
    /// Degeneracy threshold used across the engine (`2^-16`, ≈ 1.5e-5).
    ///
    /// Not the resolution of the type (that is `2^-32`); values closer than
    /// this are treated as equal by geometric predicates.
    pub const EPSILON: Self = Self { raw: 1 << 16 };

    /// Constructs a value from its raw Q32.32 integer (no scaling).
    pub const fn from_raw(raw: i64) -> Self {
        Self { raw }
    }

    /// Returns the raw Q32.32 storage.
    pub const fn raw(self) -> i64 {
        self.raw
    }

    /// Exact conversion from an integer.
    #[allow(clippy::cast_lossless)]
    pub const fn from_int(value: i32) -> Self {
        Self {
            raw: (value as i64) << q::FRAC_BITS,
        }
    }

    /// `num / den` truncated toward zero; a zero denominator yields `0`.
    ///
    /// Usable in `const` items, e.g. `Fix64::from_ratio(1, 5)` for `0.2`.
    #[allow(clippy::cast_lossless)]
    pub const fn from_ratio(num: i32, den: i32) -> Self {
        if den == 0 {
            return Self::ZERO;
        }
        Self {
            raw: ((num as i64) << q::FRAC_BITS) / den as i64,
        }
    }

    /// Deterministic conversion from `f32` (NaN → 0, ±∞ saturate).
    pub fn from_f32(value: f32) -> Self {
        Self::from_raw(q::from_f32(value))
    }

    /// Nearest `f32`, ties to even.
    pub fn to_f32(self) -> f32 {
        q::to_f32(self.raw)
    }

    /// Absolute value (saturating: `|MIN| == MAX`).
    pub fn abs(self) -> Self {
        Self::from_raw(self.raw.saturating_abs())
    }

    /// Smaller of the two values.
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    /// Larger of the two values.
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Clamps into `[lo, hi]`.
    ///
    /// Unlike [`Ord::clamp`] this never panics: with `lo > hi` the result is
    /// `hi`.
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// `self * self`.
    pub fn square(self) -> Self {
        self * self
    }

    /// Square root; negative inputs yield `0`.
    pub fn sqrt(self) -> Self {
        Self::from_raw(q::sqrt(self.raw))
    }

    /// `1 / self`.
    pub fn recip(self) -> Self {
        Self::ONE / self
    }

    /// Sine of an angle in radians.
    pub fn sin(self) -> Self {
        trig::sin_cos(self).0
    }

    /// Cosine of an angle in radians.
    pub fn cos(self) -> Self {
        trig::sin_cos(self).1
    }

    /// `(sin, cos)` sharing one range reduction.
    pub fn sin_cos(self) -> (Self, Self) {
        trig::sin_cos(self)
    }

    /// Four-quadrant arctangent of `y / x`, in `(-π, π]`. `atan2(0, 0) == 0`.
    pub fn atan2(y: Self, x: Self) -> Self {
        trig::atan2(y, x)
    }

    /// Nearest integer, ties away from zero, saturating to the `i32` range.
    pub fn round_to_int(self) -> i32 {
        let n = q::round_to_int(self.raw);
        i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
    }

    /// Largest integral value `<= self`.
    pub fn floor(self) -> Self {
        Self::from_raw(self.raw & !(q::ONE_RAW - 1))
    }

    /// `|self - other| < EPSILON`.
    pub fn approximately(self, other: Self) -> bool {
        (self - other).abs() < Self::EPSILON
    }

    /// `true` for values strictly below zero.
    pub const fn is_negative(self) -> bool {
        self.raw < 0
    }

    /// `true` for values strictly above zero.
    pub const fn is_positive(self) -> bool {
        self.raw > 0
    }

    /// `-1`, `0` or `1`.
    pub fn signum(self) -> Self {
        match self.raw.cmp(&0) {
            Ordering::Less => -Self::ONE,
            Ordering::Equal => Self::ZERO,
            Ordering::Greater => Self::ONE,
        }
    }

    /// Multiplies by an integer without rounding.
    pub fn mul_int(self, k: i64) -> Self {
        Self::from_raw(q::saturate_i128(i128::from(self.raw) * i128::from(k)))
    }

    /// Divides by an integer, truncating toward zero. Division by zero yields `0`.
    pub fn div_int(self, k: i64) -> Self {
        if k == 0 {
            return Self::ZERO;
        }
        Self::from_raw(q::saturate_i128(i128::from(self.raw) / i128::from(k)))
    }
}

impl fmt::Debug for Fix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fix64({} raw={:#x})", self.to_f32(), self.raw)
    }
}

impl fmt::Display for Fix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl From<i32> for Fix64 {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl Add for Fix64 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.raw.saturating_add(rhs.raw))
    }
}

impl Sub for Fix64 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.raw.saturating_sub(rhs.raw))
    }
}

impl Mul for Fix64 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_raw(q::mul(self.raw, rhs.raw))
    }
}

impl Div for Fix64 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::from_raw(q::div(self.raw, rhs.raw))
    }
}

impl Neg for Fix64 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_raw(self.raw.saturating_neg())
    }
}

impl AddAssign for Fix64 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fix64 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fix64 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fix64 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Sum for Fix64 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Fix64 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_f32().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Fix64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = f32::deserialize(deserializer)?;
        Ok(Self::from_f32(v))
    }
}
