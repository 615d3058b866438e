// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Fixed-point `sin`/`cos`/`atan2`.
//!
//! Strategy:
//! - reduce `|angle|` into `[0, TAU)` with an integer remainder
//! - split into a quarter wave by comparison against `HALF_PI` multiples
//! - evaluate truncated Taylor series with Horner's scheme; every divisor is an
//!   integer so no rounding depends on the platform
//! - restore quadrant symmetries and the sign of the input
//!
//! Absolute error stays below `1e-8` over the quarter wave, well under
//! [`Fix64::EPSILON`].

use crate::Fix64;

/// `tan(π/8)`, the split point for the arctangent range reduction.
const TAN_PI_8: Fix64 = Fix64::from_raw(1_779_033_704);
const QUARTER_PI: Fix64 = Fix64::from_raw(3_373_259_426);

// (2n)(2n+1) for the sine series, innermost first.
const SIN_DIVISORS: [i64; 7] = [210, 156, 110, 72, 42, 20, 6];
// (2n-1)(2n) for the cosine series, innermost first.
const COS_DIVISORS: [i64; 8] = [240, 182, 132, 90, 56, 30, 12, 2];

fn sin_quarter(x: Fix64) -> Fix64 {
    let x2 = x.square();
    let mut t = Fix64::ONE;
    for k in SIN_DIVISORS {
        t = Fix64::ONE - (x2 * t).div_int(k);
    }
    x * t
}

fn cos_quarter(x: Fix64) -> Fix64 {
    let x2 = x.square();
    let mut t = Fix64::ONE;
    for k in COS_DIVISORS {
        t = Fix64::ONE - (x2 * t).div_int(k);
    }
    t
}

/// Returns `(sin(angle), cos(angle))`.
///
/// `sin(-x)` is the exact negation of `sin(x)` and `cos(-x) == cos(x)`.
pub(crate) fn sin_cos(angle: Fix64) -> (Fix64, Fix64) {
    let negative = angle.is_negative();
    let r = Fix64::from_raw(angle.abs().raw() % Fix64::TAU.raw());

    let three_half_pi = Fix64::PI + Fix64::HALF_PI;
    let (quadrant, a) = if r < Fix64::HALF_PI {
        (0_u8, r)
    } else if r < Fix64::PI {
        (1, r - Fix64::HALF_PI)
    } else if r < three_half_pi {
        (2, r - Fix64::PI)
    } else {
        (3, r - three_half_pi)
    };

    let s = sin_quarter(a).clamp(-Fix64::ONE, Fix64::ONE);
    let c = cos_quarter(a).clamp(-Fix64::ONE, Fix64::ONE);
    let (s, c) = match quadrant {
        0 => (s, c),
        1 => (c, -s),
        2 => (-s, -c),
        _ => (-c, s),
    };

    if negative {
        (-s, c)
    } else {
        (s, c)
    }
}

/// Arctangent of `t` for `|t| <= tan(π/8)`.
fn atan_series(t: Fix64) -> Fix64 {
    let t2 = t.square();
    let mut s = Fix64::ONE.div_int(23);
    let mut k = 21;
    while k >= 1 {
        s = Fix64::ONE.div_int(k) - t2 * s;
        k -= 2;
    }
    t * s
}

/// Arctangent of `z` for `0 <= z <= 1`.
fn atan_unit(z: Fix64) -> Fix64 {
    if z <= TAN_PI_8 {
        atan_series(z)
    } else {
        QUARTER_PI + atan_series((z - Fix64::ONE) / (z + Fix64::ONE))
    }
}

/// Four-quadrant arctangent; `atan2(0, 0) == 0`.
pub(crate) fn atan2(y: Fix64, x: Fix64) -> Fix64 {
    if x == Fix64::ZERO && y == Fix64::ZERO {
        return Fix64::ZERO;
    }
    let (ax, ay) = (x.abs(), y.abs());
    let mut a = if ay <= ax {
        atan_unit(ay / ax)
    } else {
        Fix64::HALF_PI - atan_unit(ax / ay)
    };
    if x.is_negative() {
        a = Fix64::PI - a;
    }
    if y.is_negative() {
        -a
    } else {
        a
    }
}
