// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Box and sphere colliders.
//!
//! A collider owns its [`Transform`] and shape and caches world bounds. Hosts
//! mutate the transform or shape and then call `update_bounds` before the next
//! query or step; the cached bounds are never refreshed implicitly.

use core::cell::Cell;

use ortho_math::{Fix64, Rotation, Vec2, Vec3};

use crate::{Bounds, BoxShape, Edge, Interval, Shape, SphereShape, Transform};

/// World-space features of a box derived from its transform, rebuilt lazily.
#[derive(Debug, Copy, Clone)]
struct BoxFeatures {
    // p0=(+x,-z) p1=(+x,+z) p2=(-x,+z) p3=(-x,-z), local half-extent signs.
    corners: [Vec2; 4],
    axes: [Vec2; 2],
    intervals: [Interval; 2],
}

/// Oriented box collider.
#[derive(Debug, Clone)]
pub struct BoxCollider {
    transform: Transform,
    shape: BoxShape,
    bounds: Bounds,
    axis_aligned: bool,
    features: Cell<Option<BoxFeatures>>,
}

impl BoxCollider {
    /// Creates a box at the identity transform with bounds already computed.
    pub fn new(shape: BoxShape) -> Self {
        Self::with_transform(shape, Transform::IDENTITY)
    }

    /// Creates a box at `transform` with bounds already computed.
    pub fn with_transform(shape: BoxShape, transform: Transform) -> Self {
        let mut collider = Self {
            transform,
            shape,
            bounds: Bounds::INVALID,
            axis_aligned: true,
            features: Cell::new(None),
        };
        collider.update_bounds();
        collider
    }

    /// Shape data.
    pub const fn shape(&self) -> BoxShape {
        self.shape
    }

    /// Replaces the shape; returns `true` if it changed. Call
    /// [`BoxCollider::update_bounds`] afterwards.
    pub fn set_shape(&mut self, shape: BoxShape) -> bool {
        let changed = self.shape != shape;
        self.shape = shape;
        changed
    }

    /// Placement.
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable placement. Call [`BoxCollider::update_bounds`] afterwards.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Cached world bounds.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// `true` when the rotation is a multiple of 90° (within epsilon).
    pub const fn is_axis_aligned(&self) -> bool {
        self.axis_aligned
    }

    /// Half of the vertical extent.
    pub const fn half_height(&self) -> Fix64 {
        self.shape.half_extents.y
    }

    /// Recomputes bounds and the axis-alignment flag and invalidates the
    /// cached corners/axes/intervals.
    pub fn update_bounds(&mut self) {
        let rotation = self.transform.rotation();
        let alignment = rotation.dot(Rotation::IDENTITY).abs();
        let quarter_turn = alignment.approximately(Fix64::ZERO);
        self.axis_aligned = alignment.approximately(Fix64::ONE) || quarter_turn;

        let he = self.shape.half_extents;
        let half = if !self.axis_aligned {
            let x = rotation.rotate(Vec2::new(he.x, Fix64::ZERO));
            let z = rotation.rotate(Vec2::new(Fix64::ZERO, he.z));
            let footprint = x.abs() + z.abs();
            Vec3::new(footprint.x, he.y, footprint.y)
        } else if quarter_turn {
            Vec3::new(he.z, he.y, he.x)
        } else {
            he
        };
        self.bounds = Bounds::from_center_half_extents(self.transform.position(), half);
        self.features.set(None);
    }

    fn features(&self) -> BoxFeatures {
        if let Some(features) = self.features.get() {
            return features;
        }
        let features = if self.axis_aligned {
            let (min, max) = (self.bounds.min, self.bounds.max);
            BoxFeatures {
                corners: [
                    Vec2::new(max.x, min.z),
                    Vec2::new(max.x, max.z),
                    Vec2::new(min.x, max.z),
                    Vec2::new(min.x, min.z),
                ],
                axes: [Vec2::UNIT_X, Vec2::UNIT_Y],
                intervals: [
                    Interval::new(min.x, max.x),
                    Interval::new(min.z, max.z),
                ],
            }
        } else {
            let he = self.shape.half_extents;
            let t = &self.transform;
            let corners = [
                t.to_world_2d(Vec2::new(he.x, -he.z)),
                t.to_world_2d(Vec2::new(he.x, he.z)),
                t.to_world_2d(Vec2::new(-he.x, he.z)),
                t.to_world_2d(Vec2::new(-he.x, -he.z)),
            ];
            let axis0 = t.rotation().direction();
            let axes = [axis0, axis0.perpendicular()];
            // Opposite corners p0/p2 bound the projection on both box axes.
            let intervals = axes.map(|axis| {
                let a = axis.dot(corners[0]);
                let b = axis.dot(corners[2]);
                Interval::new(a.min(b), a.max(b))
            });
            BoxFeatures {
                corners,
                axes,
                intervals,
            }
        };
        self.features.set(Some(features));
        features
    }

    /// World corners in `(+x,-z)`, `(+x,+z)`, `(-x,+z)`, `(-x,-z)` order.
    pub fn corners(&self) -> [Vec2; 4] {
        self.features().corners
    }

    /// The two face normals (local X then local Z) in world space.
    pub fn axes(&self) -> [Vec2; 2] {
        self.features().axes
    }

    /// Extent of the box along each of its own axes.
    pub fn intervals(&self) -> [Interval; 2] {
        self.features().intervals
    }

    /// Projection of the box onto an arbitrary axis.
    pub fn interval(&self, axis: Vec2) -> Interval {
        Interval::project(&self.features().corners, axis)
    }

    /// Edge of this box most anti-parallel to `normal`, used for clipping.
    pub fn incident_edge(&self, normal: Vec2) -> Edge {
        let BoxFeatures { corners: p, axes, .. } = self.features();
        let d0 = normal.dot(axes[0]);
        let d1 = normal.dot(axes[1]);
        if d0.abs() < d1.abs() {
            if d1.is_negative() {
                Edge::new(p[0], p[3])
            } else {
                Edge::new(p[2], p[1])
            }
        } else if d0.is_negative() {
            Edge::new(p[3], p[2])
        } else {
            Edge::new(p[1], p[0])
        }
    }
}

/// Sphere collider.
#[derive(Debug, Clone)]
pub struct SphereCollider {
    transform: Transform,
    shape: SphereShape,
    bounds: Bounds,
}

impl SphereCollider {
    /// Creates a sphere at the identity transform with bounds computed.
    pub fn new(shape: SphereShape) -> Self {
        Self::with_transform(shape, Transform::IDENTITY)
    }

    /// Creates a sphere at `transform` with bounds computed.
    pub fn with_transform(shape: SphereShape, transform: Transform) -> Self {
        let mut collider = Self {
            transform,
            shape,
            bounds: Bounds::INVALID,
        };
        collider.update_bounds();
        collider
    }

    /// Shape data.
    pub const fn shape(&self) -> SphereShape {
        self.shape
    }

    /// Replaces the shape; returns `true` if it changed.
    pub fn set_shape(&mut self, shape: SphereShape) -> bool {
        let changed = self.shape != shape;
        self.shape = shape;
        changed
    }

    /// Radius shorthand.
    pub const fn radius(&self) -> Fix64 {
        self.shape.radius
    }

    /// Placement.
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable placement. Call [`SphereCollider::update_bounds`] afterwards.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Cached world bounds.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Radius, the half of the vertical extent.
    pub const fn half_height(&self) -> Fix64 {
        self.shape.radius
    }

    /// Recomputes bounds from the transform and radius.
    pub fn update_bounds(&mut self) {
        let r = self.shape.radius;
        self.bounds =
            Bounds::from_center_half_extents(self.transform.position(), Vec3::new(r, r, r));
    }
}

/// Closed set of collider kinds; all collision code dispatches on it with
/// exhaustive `match`.
#[derive(Debug, Clone)]
pub enum Collider {
    /// Oriented box.
    Box(BoxCollider),
    /// Sphere.
    Sphere(SphereCollider),
}

impl Collider {
    /// Box collider at `position` with `rotation`.
    pub fn new_box(half_extents: Vec3, position: Vec3, rotation: Rotation) -> Self {
        Self::Box(BoxCollider::with_transform(
            BoxShape::new(half_extents),
            Transform::new(position, rotation),
        ))
    }

    /// Sphere collider at `position`.
    pub fn new_sphere(radius: Fix64, position: Vec3) -> Self {
        Self::Sphere(SphereCollider::with_transform(
            SphereShape::new(radius),
            Transform::new(position, Rotation::IDENTITY),
        ))
    }

    /// Placement.
    pub const fn transform(&self) -> &Transform {
        match self {
            Self::Box(b) => b.transform(),
            Self::Sphere(s) => s.transform(),
        }
    }

    /// Mutable placement. Call [`Collider::update_bounds`] afterwards.
    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            Self::Box(b) => b.transform_mut(),
            Self::Sphere(s) => s.transform_mut(),
        }
    }

    /// Cached world bounds.
    pub const fn bounds(&self) -> Bounds {
        match self {
            Self::Box(b) => b.bounds(),
            Self::Sphere(s) => s.bounds(),
        }
    }

    /// Half of the vertical extent, used for ground clamping.
    pub const fn half_height(&self) -> Fix64 {
        match self {
            Self::Box(b) => b.half_height(),
            Self::Sphere(s) => s.half_height(),
        }
    }

    /// Refreshes cached bounds after a transform or shape change.
    pub fn update_bounds(&mut self) {
        match self {
            Self::Box(b) => b.update_bounds(),
            Self::Sphere(s) => s.update_bounds(),
        }
    }

    /// Current shape data.
    pub const fn shape(&self) -> Shape {
        match self {
            Self::Box(b) => Shape::Box(b.shape()),
            Self::Sphere(s) => Shape::Sphere(s.shape()),
        }
    }

    /// Pushes externally edited shape data into the collider.
    ///
    /// Returns `true` when the stored shape changed (the caller then owes an
    /// [`Collider::update_bounds`]). A shape of the other kind is ignored.
    pub fn apply_shape(&mut self, shape: Shape) -> bool {
        match (self, shape) {
            (Self::Box(b), Shape::Box(s)) => b.set_shape(s),
            (Self::Sphere(c), Shape::Sphere(s)) => c.set_shape(s),
            _ => false,
        }
    }
}

impl From<BoxCollider> for Collider {
    fn from(value: BoxCollider) -> Self {
        Self::Box(value)
    }
}

impl From<SphereCollider> for Collider {
    fn from(value: SphereCollider) -> Self {
        Self::Sphere(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_box_swaps_footprint() {
        let b = BoxCollider::with_transform(
            BoxShape::new(Vec3::from_ints(2, 1, 1)),
            Transform::new(Vec3::ZERO, Rotation::from_angle(Fix64::HALF_PI)),
        );
        assert!(b.is_axis_aligned());
        let bounds = b.bounds();
        assert!(bounds.max.x.approximately(Fix64::ONE));
        assert!(bounds.max.z.approximately(Fix64::TWO));
    }

    #[test]
    fn cache_is_invalidated_by_update_bounds() {
        let mut b = BoxCollider::new(BoxShape::new(Vec3::ONE));
        assert_eq!(b.corners()[0], Vec2::from_ints(1, -1));
        b.transform_mut().set_position(Vec3::from_ints(3, 0, 0));
        b.update_bounds();
        assert_eq!(b.corners()[0], Vec2::from_ints(4, -1));
    }
}
