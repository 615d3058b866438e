// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Ground-plane contact generation.
//!
//! Each function returns a [`ContactManifold`] whose normal points from the
//! first collider toward the second, or [`ContactManifold::EMPTY`] when the
//! shapes do not touch. Vertical extents are not considered here; the world
//! only asks for contacts between bodies whose footprints already overlap.

use ortho_math::{Fix64, Vec2};

use super::intersect::closest_point_2d;
use super::ContactManifold;
use crate::{BoxCollider, Collider, Interval, SphereCollider};

/// Contact manifold for any pair of colliders.
pub fn contact(a: &Collider, b: &Collider) -> ContactManifold {
    match (a, b) {
        (Collider::Box(a), Collider::Box(b)) => contact_box_box(a, b),
        (Collider::Box(a), Collider::Sphere(b)) => contact_box_sphere(a, b),
        (Collider::Sphere(a), Collider::Box(b)) => contact_sphere_box(a, b),
        (Collider::Sphere(a), Collider::Sphere(b)) => contact_sphere_sphere(a, b),
    }
}

/// Box against box.
///
/// Two axis-aligned boxes resolve along the world axis of least penetration.
/// Otherwise the minimum-overlap axis over both boxes' face normals becomes the
/// reference normal and each contact point is clipped from the incident edges.
pub fn contact_box_box(a: &BoxCollider, b: &BoxCollider) -> ContactManifold {
    if a.is_axis_aligned() && b.is_axis_aligned() {
        contact_aligned_boxes(a, b)
    } else {
        contact_oriented_boxes(a, b)
    }
}

fn contact_aligned_boxes(a: &BoxCollider, b: &BoxCollider) -> ContactManifold {
    let (ba, bb) = (a.bounds(), b.bounds());
    let overlap_x = Interval::new(ba.min.x, ba.max.x).overlap(&Interval::new(bb.min.x, bb.max.x));
    if overlap_x.is_negative() {
        return ContactManifold::EMPTY;
    }
    let overlap_z = Interval::new(ba.min.z, ba.max.z).overlap(&Interval::new(bb.min.z, bb.max.z));
    if overlap_z.is_negative() {
        return ContactManifold::EMPTY;
    }

    let pa = a.transform().position();
    let pb = b.transform().position();
    let (normal, world1, world2) = if overlap_x < overlap_z {
        let (normal, x1, x2) = if pa.x < pb.x {
            (Vec2::UNIT_X, ba.max.x, bb.min.x)
        } else {
            (-Vec2::UNIT_X, ba.min.x, bb.max.x)
        };
        let z = if ba.min.z < bb.min.z { bb.min.z } else { bb.max.z };
        (normal, Vec2::new(x1, z), Vec2::new(x2, z))
    } else {
        let (normal, z1, z2) = if pa.z < pb.z {
            (Vec2::UNIT_Y, ba.max.z, bb.min.z)
        } else {
            (-Vec2::UNIT_Y, ba.min.z, bb.max.z)
        };
        let x = if ba.min.x < bb.min.x { bb.min.x } else { bb.max.x };
        (normal, Vec2::new(x, z1), Vec2::new(x, z2))
    };

    ContactManifold {
        normal,
        point1: a.transform().to_local_2d(world1),
        point2: b.transform().to_local_2d(world2),
    }
}

fn contact_oriented_boxes(a: &BoxCollider, b: &BoxCollider) -> ContactManifold {
    let mut best = Fix64::MAX;
    let mut normal = Vec2::ZERO;
    for (reference, other) in [(a, b), (b, a)] {
        for (axis, own) in reference.axes().into_iter().zip(reference.intervals()) {
            let overlap = own.overlap(&other.interval(axis));
            if overlap.is_negative() {
                return ContactManifold::EMPTY;
            }
            if overlap < best {
                best = overlap;
                normal = axis;
            }
        }
    }

    let offset = b.transform().position().xz() - a.transform().position().xz();
    if normal.dot(offset).is_negative() {
        normal = -normal;
    }

    let edge_a = a.incident_edge(normal);
    let edge_b = b.incident_edge(-normal);
    ContactManifold {
        normal,
        point1: a.transform().to_local_2d(edge_a.contact_point(&edge_b)),
        point2: b.transform().to_local_2d(edge_b.contact_point(&edge_a)),
    }
}

/// Box against sphere.
///
/// The normal runs from the box's closest point to the sphere centre. When the
/// centre sits inside the box footprint the face of least overlap decides.
pub fn contact_box_sphere(b: &BoxCollider, s: &SphereCollider) -> ContactManifold {
    let center = s.transform().position().xz();
    let radius = s.radius();
    let closest = closest_point_2d(b, center);
    let to_center = center - closest;
    let sqr_distance = to_center.sqr_magnitude();
    if sqr_distance > radius.square() {
        return ContactManifold::EMPTY;
    }

    let normal = if sqr_distance == Fix64::ZERO {
        match deep_sphere_normal(b, s) {
            Some(n) => n,
            None => return ContactManifold::EMPTY,
        }
    } else {
        to_center / sqr_distance.sqrt()
    };

    ContactManifold {
        normal,
        point1: b.transform().to_local_2d(closest),
        point2: s.transform().to_local_2d(center - normal * radius),
    }
}

/// Face normal for a sphere whose centre lies inside the box footprint.
fn deep_sphere_normal(b: &BoxCollider, s: &SphereCollider) -> Option<Vec2> {
    let center = s.transform().position().xz();
    let radius = s.radius();
    let box_center = b.transform().position().xz();
    if b.is_axis_aligned() {
        let (bb, bs) = (b.bounds(), s.bounds());
        let overlap_x =
            Interval::new(bb.min.x, bb.max.x).overlap(&Interval::new(bs.min.x, bs.max.x));
        let overlap_z =
            Interval::new(bb.min.z, bb.max.z).overlap(&Interval::new(bs.min.z, bs.max.z));
        if overlap_x.is_negative() || overlap_z.is_negative() {
            return None;
        }
        Some(if overlap_x < overlap_z {
            if box_center.x < center.x {
                Vec2::UNIT_X
            } else {
                -Vec2::UNIT_X
            }
        } else if box_center.y < center.y {
            Vec2::UNIT_Y
        } else {
            -Vec2::UNIT_Y
        })
    } else {
        let [a0, a1] = b.axes();
        let [i0, i1] = b.intervals();
        let overlap0 = i0.overlap(&Interval::around(center.dot(a0), radius));
        let overlap1 = i1.overlap(&Interval::around(center.dot(a1), radius));
        if overlap0.is_negative() || overlap1.is_negative() {
            return None;
        }
        let n = if overlap0 < overlap1 { a0 } else { a1 };
        Some(if n.dot(center - box_center).is_negative() {
            -n
        } else {
            n
        })
    }
}

/// Sphere against box: the box/sphere manifold seen from the sphere.
pub fn contact_sphere_box(s: &SphereCollider, b: &BoxCollider) -> ContactManifold {
    contact_box_sphere(b, s).flipped()
}

/// Sphere against sphere.
///
/// The centre offset is nudged by `(EPSILON, EPSILON)` so coincident centres
/// still yield a direction, and `(1, 0)` is used below `EPSILON`.
pub fn contact_sphere_sphere(a: &SphereCollider, b: &SphereCollider) -> ContactManifold {
    let pa = a.transform().position().xz();
    let pb = b.transform().position().xz();
    let (ra, rb) = (a.radius(), b.radius());
    let direction = pb - pa + Vec2::ONE * Fix64::EPSILON;
    let sqr_distance = direction.sqr_magnitude();
    if sqr_distance > (ra + rb).square() {
        return ContactManifold::EMPTY;
    }
    let normal = if sqr_distance < Fix64::EPSILON {
        Vec2::UNIT_X
    } else {
        direction / sqr_distance.sqrt()
    };
    ContactManifold {
        normal,
        point1: a.transform().to_local_2d(pa + normal * ra),
        point2: b.transform().to_local_2d(pb - normal * rb),
    }
}
