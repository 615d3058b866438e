// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Narrow phase: overlap predicates and contact manifolds for every
//! box/sphere pairing.

mod contact;
mod intersect;
mod manifold;

pub use contact::{
    contact, contact_box_box, contact_box_sphere, contact_sphere_box, contact_sphere_sphere,
};
pub use intersect::{intersect, intersect_box_box, intersect_box_sphere, intersect_sphere_sphere};
pub use manifold::ContactManifold;
