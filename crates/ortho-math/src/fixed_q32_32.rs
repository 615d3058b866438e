// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Raw Q32.32 helpers shared by [`crate::Fix64`].
//!
//! The representation is an `i64` storing an integer scaled by `2^32`:
//! `real_value = raw / 2^32`. Everything here works on raw integers only so
//! results are identical on every target.

/// Number of fractional bits in the Q32.32 encoding.
pub(crate) const FRAC_BITS: u32 = 32;

/// Raw value of `1.0`.
pub(crate) const ONE_RAW: i64 = 1_i64 << FRAC_BITS;

/// Raw value of `0.5`.
pub(crate) const HALF_RAW: i64 = 1_i64 << (FRAC_BITS - 1);

pub(crate) fn saturate_i128(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Shifts `value` right by `shift` bits, rounding to nearest with ties to even.
fn round_shift_right(value: u128, shift: u32) -> u128 {
    if shift == 0 {
        return value;
    }
    if shift >= 128 {
        return 0;
    }
    let q = value >> shift;
    let r = value & ((1_u128 << shift) - 1);
    let half = 1_u128 << (shift - 1);
    if r > half || (r == half && (q & 1) == 1) {
        q + 1
    } else {
        q
    }
}

/// Multiplies two raw values, rounding the discarded fraction to nearest even.
pub(crate) fn mul(a: i64, b: i64) -> i64 {
    let prod = i128::from(a) * i128::from(b);
    let rounded = round_shift_right(prod.unsigned_abs(), FRAC_BITS);
    let magnitude = i128::try_from(rounded).unwrap_or(i128::MAX);
    saturate_i128(if prod.is_negative() {
        -magnitude
    } else {
        magnitude
    })
}

/// Divides two raw values, rounding to nearest even.
///
/// `0 / 0` yields `0`; `x / 0` saturates towards the sign of `x`.
pub(crate) fn div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return match a.signum() {
            0 => 0,
            1 => i64::MAX,
            _ => i64::MIN,
        };
    }
    let num = (i128::from(a) << FRAC_BITS).unsigned_abs();
    let den = i128::from(b).unsigned_abs();
    let q = num / den;
    let r = num % den;
    let twice_r = r.saturating_mul(2);
    let rounded = if twice_r > den || (twice_r == den && (q & 1) == 1) {
        q.saturating_add(1)
    } else {
        q
    };
    let magnitude = i128::try_from(rounded).unwrap_or(i128::MAX);
    saturate_i128(if (a < 0) ^ (b < 0) {
        -magnitude
    } else {
        magnitude
    })
}

/// Integer square root (floor) of a `u128`, bit by bit.
pub(crate) fn isqrt_u128(n: u128) -> u128 {
    let mut rem = n;
    let mut root = 0_u128;
    let mut bit = 1_u128 << 126;
    while bit > n {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

/// Square root of a raw value; non-positive inputs map to `0`.
pub(crate) fn sqrt(raw: i64) -> i64 {
    if raw <= 0 {
        return 0;
    }
    let scaled = u128::from(raw.unsigned_abs()) << FRAC_BITS;
    i64::try_from(isqrt_u128(scaled)).unwrap_or(i64::MAX)
}

/// Rounds a raw value to the nearest integer, ties away from zero.
pub(crate) fn round_to_int(raw: i64) -> i64 {
    let magnitude = (i128::from(raw).unsigned_abs() + u128::from(HALF_RAW.unsigned_abs())) >> FRAC_BITS;
    let magnitude = i128::try_from(magnitude).unwrap_or(i128::MAX);
    saturate_i128(if raw.is_negative() {
        -magnitude
    } else {
        magnitude
    })
}

/// Deterministically converts an `f32` to a raw Q32.32 value.
///
/// - `NaN` maps to `0`.
/// - `±∞` saturate to `i64::MAX` / `i64::MIN`.
/// - Finite values round to nearest with ties to even at the Q32.32 boundary.
pub(crate) fn from_f32(value: f32) -> i64 {
    if value.is_nan() {
        return 0;
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            i64::MAX
        } else {
            i64::MIN
        };
    }

    let bits = value.to_bits();
    let negative = (bits >> 31) != 0;
    // Masked to eight bits.
    #[allow(clippy::cast_possible_truncation)]
    let exp = i32::from(((bits >> 23) & 0xff) as u8);
    let mant = bits & 0x007f_ffff;
    if exp == 0 && mant == 0 {
        return 0;
    }

    let (mantissa, unbiased) = if exp == 0 {
        (u128::from(mant), -126)
    } else {
        (u128::from((1_u32 << 23) | mant), exp - 127)
    };
    #[allow(clippy::cast_possible_wrap)]
    let shift = unbiased + (FRAC_BITS as i32 - 23);

    let magnitude: i128 = if shift >= 0 {
        let left = shift.unsigned_abs();
        if left > 103 {
            i128::MAX
        } else {
            i128::try_from(mantissa << left).unwrap_or(i128::MAX)
        }
    } else {
        i128::try_from(round_shift_right(mantissa, shift.unsigned_abs())).unwrap_or(i128::MAX)
    };

    saturate_i128(if negative { -magnitude } else { magnitude })
}

/// Deterministically converts a raw Q32.32 value to the nearest `f32`
/// (ties to even). Zero is always `+0.0`.
pub(crate) fn to_f32(raw: i64) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    let negative = raw.is_negative();
    let abs = raw.unsigned_abs();

    // Highest set bit `k` places the value in [2^(k-32), 2^(k-31)).
    let k = 63_u32 - abs.leading_zeros();
    #[allow(clippy::cast_possible_wrap)]
    let mut exp = k as i32 - FRAC_BITS as i32;

    let mut sig: u128 = if k > 23 {
        round_shift_right(u128::from(abs), k - 23)
    } else {
        u128::from(abs) << (23 - k)
    };
    if sig >= (1_u128 << 24) {
        sig >>= 1;
        exp += 1;
    }

    #[allow(clippy::cast_sign_loss)]
    let exp_field = (exp + 127) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let mantissa = (sig & ((1_u128 << 23) - 1)) as u32;
    f32::from_bits((u32::from(negative) << 31) | (exp_field << 23) | mantissa)
}
