// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Boolean overlap tests.
//!
//! Every test first rejects on disjoint vertical extents, then decides on the
//! ground plane (boxes) or in full 3D (anything involving a sphere).

use ortho_math::{Vec2, Vec3};

use crate::{BoxCollider, Collider, SphereCollider};

/// Overlap test for any pair of colliders.
pub fn intersect(a: &Collider, b: &Collider) -> bool {
    match (a, b) {
        (Collider::Box(a), Collider::Box(b)) => intersect_box_box(a, b),
        (Collider::Box(a), Collider::Sphere(b)) => intersect_box_sphere(a, b),
        (Collider::Sphere(a), Collider::Box(b)) => intersect_box_sphere(b, a),
        (Collider::Sphere(a), Collider::Sphere(b)) => intersect_sphere_sphere(a, b),
    }
}

/// Separating-axis test between two boxes.
pub fn intersect_box_box(a: &BoxCollider, b: &BoxCollider) -> bool {
    let (ba, bb) = (a.bounds(), b.bounds());
    if ba.separated_vertically(&bb) {
        return false;
    }
    if a.is_axis_aligned() && b.is_axis_aligned() {
        return ba.intersects_2d(&bb);
    }
    sat_axes_overlap(a, b) && sat_axes_overlap(b, a)
}

/// `true` when `other` overlaps `reference` on both of `reference`'s axes.
fn sat_axes_overlap(reference: &BoxCollider, other: &BoxCollider) -> bool {
    let axes = reference.axes();
    let intervals = reference.intervals();
    axes.iter()
        .zip(intervals.iter())
        .all(|(axis, own)| !own.overlap(&other.interval(*axis)).is_negative())
}

/// Closest point of `b` to `point` on the ground plane.
pub(crate) fn closest_point_2d(b: &BoxCollider, point: Vec2) -> Vec2 {
    if b.is_axis_aligned() {
        let bounds = b.bounds();
        Vec2::new(
            point.x.clamp(bounds.min.x, bounds.max.x),
            point.y.clamp(bounds.min.z, bounds.max.z),
        )
    } else {
        let [a0, a1] = b.axes();
        let [i0, i1] = b.intervals();
        a0 * point.dot(a0).clamp(i0.min, i0.max) + a1 * point.dot(a1).clamp(i1.min, i1.max)
    }
}

/// Box against sphere, measured in 3D.
pub fn intersect_box_sphere(b: &BoxCollider, s: &SphereCollider) -> bool {
    let (bb, bs) = (b.bounds(), s.bounds());
    if bb.separated_vertically(&bs) {
        return false;
    }
    let center = s.transform().position();
    let closest = closest_point_2d(b, center.xz());
    let closest_y = center.y.clamp(bb.min.y, bb.max.y);
    let delta = center - Vec3::new(closest.x, closest_y, closest.y);
    delta.sqr_magnitude() < s.radius().square()
}

/// Sphere against sphere, measured in 3D.
pub fn intersect_sphere_sphere(a: &SphereCollider, b: &SphereCollider) -> bool {
    if a.bounds().separated_vertically(&b.bounds()) {
        return false;
    }
    let delta = b.transform().position() - a.transform().position();
    delta.sqr_magnitude() < (a.radius() + b.radius()).square()
}

