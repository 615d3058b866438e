// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Z-order (Morton) keys for ground-plane positions.
//!
//! Each signed coordinate is biased by `2^31` so the unsigned order matches
//! the signed order, then the two 32-bit values are interleaved: `x` takes the
//! even bits and `y` the odd bits of the 64-bit key.

use ortho_math::Vec2;

const BIAS: u32 = 0x8000_0000;

/// Spreads the low 32 bits of `v` into the even bit positions.
fn spread(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & 0x5555_5555_5555_5555
}

/// Inverse of [`spread`]: gathers the even bits back into 32 bits.
fn gather(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    // Masked to 32 bits above.
    #[allow(clippy::cast_possible_truncation)]
    let out = x as u32;
    out
}

/// Z-order key of an integer grid cell.
pub fn encode(x: i32, y: i32) -> u64 {
    spread(x.cast_unsigned() ^ BIAS) | (spread(y.cast_unsigned() ^ BIAS) << 1)
}

/// Recovers the grid cell from a key produced by [`encode`].
pub fn decode(key: u64) -> (i32, i32) {
    let x = gather(key) ^ BIAS;
    let y = gather(key >> 1) ^ BIAS;
    (x.cast_signed(), y.cast_signed())
}

/// Key of a ground-plane point, rounded to the nearest grid cell.
pub fn key_of(point: Vec2) -> u64 {
    encode(point.x.round_to_int(), point.y.round_to_int())
}
