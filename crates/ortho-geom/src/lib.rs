// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry primitives and narrow-phase collision for Ortho.
//!
//! This crate provides:
//! - Axis-aligned bounds ([`Bounds`], [`Bounds2D`]) with an invalid sentinel
//!   for incremental unions.
//! - Placement ([`Transform`]) on the XZ ground plane plus height.
//! - Box and sphere colliders behind the closed [`Collider`] enum.
//! - Separating-axis overlap tests and contact manifolds in [`collision`].
//!
//! Design notes:
//! - Fixed-point throughout (`ortho_math::Fix64`); no float arithmetic.
//! - "No contact" is a value ([`ContactManifold::EMPTY`]), never an error.

pub mod collision;

mod bounds;
mod collider;
mod edge;
mod interval;
mod shape;
mod transform;

pub use bounds::{Bounds, Bounds2D};
pub use collider::{BoxCollider, Collider, SphereCollider};
pub use collision::ContactManifold;
pub use edge::Edge;
pub use interval::Interval;
pub use shape::{BoxShape, Shape, SphereShape};
pub use transform::Transform;
