// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use ortho_math::{Fix64, Vec3};

/// Box dimensions as half-extents along the local axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BoxShape {
    /// Half-extents `(hx, hy, hz)`.
    pub half_extents: Vec3,
}

impl BoxShape {
    /// Creates a box shape.
    pub const fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }
}

/// Sphere dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SphereShape {
    /// Radius.
    pub radius: Fix64,
}

impl SphereShape {
    /// Creates a sphere shape.
    pub const fn new(radius: Fix64) -> Self {
        Self { radius }
    }
}

/// Shape data for either collider kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shape {
    /// See [`BoxShape`].
    Box(BoxShape),
    /// See [`SphereShape`].
    Sphere(SphereShape),
}

impl From<BoxShape> for Shape {
    fn from(value: BoxShape) -> Self {
        Self::Box(value)
    }
}

impl From<SphereShape> for Shape {
    fn from(value: SphereShape) -> Self {
        Self::Sphere(value)
    }
}
