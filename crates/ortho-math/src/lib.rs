// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ortho math: the deterministic numeric primitive under the physics engine.
//!
//! - [`Fix64`]: Q32.32 fixed-point scalar with saturating, round-to-even
//!   arithmetic and integer-only `sqrt`/`sin`/`cos`/`atan2`.
//! - [`Vec2`] / [`Vec3`]: value-type vectors. `Vec2` lives on the XZ ground
//!   plane, `Vec3` adds the vertical Y axis.
//! - [`Rotation`]: planar rotation as a unit complex number.
//!
//! Nothing in this crate touches `f32` arithmetic except the explicit
//! `from_f32`/`to_f32` boundary conversions.

mod error;
mod fixed_q32_32;
mod rotation;
mod scalar;
mod trig;
mod vec2;
mod vec3;

pub use error::MathError;
pub use rotation::Rotation;
pub use scalar::Fix64;
pub use vec2::Vec2;
pub use vec3::Vec3;
