// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use ortho_math::Fix64;
use proptest::prelude::*;

fn fx(v: f32) -> Fix64 {
    Fix64::from_f32(v)
}

#[test]
fn constants_and_raw_encoding() {
    assert_eq!(Fix64::ZERO.raw(), 0);
    assert_eq!(Fix64::ONE.raw(), 1_i64 << 32);
    assert_eq!(Fix64::HALF.raw(), 1_i64 << 31);
    assert_eq!(Fix64::EPSILON.raw(), 1_i64 << 16);
    assert_eq!(Fix64::from_int(-3).raw(), -3_i64 << 32);
    assert_eq!(Fix64::from_ratio(1, 4), fx(0.25));
    assert_eq!(Fix64::from_ratio(7, 0), Fix64::ZERO);
}

#[test]
fn arithmetic_matches_exact_dyadics() {
    let a = fx(1.5);
    let b = fx(2.0);
    assert_eq!((a + b).to_f32(), 3.5);
    assert_eq!((b - a).to_f32(), 0.5);
    assert_eq!((a * b).to_f32(), 3.0);
    assert_eq!((b / fx(0.5)).to_f32(), 4.0);
    assert_eq!((-a).to_f32(), -1.5);
}

#[test]
fn overflow_saturates() {
    assert_eq!(Fix64::MAX + Fix64::ONE, Fix64::MAX);
    assert_eq!(Fix64::MIN - Fix64::ONE, Fix64::MIN);
    assert_eq!(-Fix64::MIN, Fix64::MAX);
    assert_eq!(Fix64::MAX * Fix64::TWO, Fix64::MAX);
    assert_eq!(Fix64::ONE / Fix64::ZERO, Fix64::MAX);
    assert_eq!(Fix64::ZERO / Fix64::ZERO, Fix64::ZERO);
}

#[test]
fn sqrt_of_perfect_squares_is_exact() {
    for n in [0, 1, 4, 9, 16, 1024, 65536] {
        let root = Fix64::from_int(n).sqrt();
        let expected = (f64::from(n)).sqrt();
        assert_eq!(f64::from(root.to_f32()), expected, "sqrt({n})");
    }
    assert_eq!(fx(0.25).sqrt(), Fix64::HALF);
    assert_eq!(fx(-4.0).sqrt(), Fix64::ZERO);
}

#[test]
fn rounding_floor_and_clamp() {
    assert_eq!(fx(2.5).round_to_int(), 3);
    assert_eq!(fx(-2.5).round_to_int(), -3);
    assert_eq!(fx(2.49).round_to_int(), 2);
    assert_eq!(Fix64::MAX.round_to_int(), i32::MAX);
    assert_eq!(fx(-1.25).floor(), fx(-2.0));
    assert_eq!(fx(1.75).floor(), Fix64::ONE);
    // Inverted bounds never panic.
    assert_eq!(fx(5.0).clamp(Fix64::TWO, Fix64::ONE), Fix64::ONE);
    assert_eq!(fx(-5.0).clamp(Fix64::ZERO, Fix64::ONE), Fix64::ZERO);
}

#[test]
fn approximately_uses_epsilon() {
    let a = Fix64::ONE;
    assert!(a.approximately(a + Fix64::from_raw(Fix64::EPSILON.raw() - 1)));
    assert!(!a.approximately(a + Fix64::EPSILON));
}

#[test]
fn trig_tracks_libm_over_several_turns() {
    let mut angle = fx(-12.0);
    let step = fx(0.37);
    while angle < fx(12.0) {
        let (s, c) = angle.sin_cos();
        let a = f64::from(angle.to_f32());
        assert!((f64::from(s.to_f32()) - libm::sin(a)).abs() < 2e-5, "sin({a})");
        assert!((f64::from(c.to_f32()) - libm::cos(a)).abs() < 2e-5, "cos({a})");
        angle += step;
    }
}

#[test]
fn atan2_inverts_sin_cos() {
    for deg in (-170..=180).step_by(10) {
        let angle = Fix64::PI * Fix64::from_ratio(deg, 180);
        let (s, c) = angle.sin_cos();
        let back = Fix64::atan2(s, c);
        assert!(
            (back - angle).abs() < fx(1e-4),
            "deg={deg} angle={angle} back={back}"
        );
    }
}

proptest! {
    #[test]
    fn ordering_matches_f32_for_dyadics(a in -100_000_i32..100_000, b in -100_000_i32..100_000) {
        let fa = Fix64::from_ratio(a, 64);
        let fb = Fix64::from_ratio(b, 64);
        prop_assert_eq!(fa < fb, a < b);
        prop_assert_eq!(fa == fb, a == b);
    }

    #[test]
    fn mul_div_round_trip_within_resolution(a in -10_000_i32..10_000, b in 1_i32..10_000) {
        let fa = Fix64::from_ratio(a, 16);
        let fb = Fix64::from_ratio(b, 16);
        let back = (fa * fb) / fb;
        prop_assert!((back - fa).abs() <= Fix64::from_raw(2));
    }
}
