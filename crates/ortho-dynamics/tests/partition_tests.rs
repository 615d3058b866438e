// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use ortho_dynamics::partition::zorder;
use ortho_dynamics::{Body, BodyHandle, BodySet, SpatialTree};
use ortho_geom::{Bounds2D, Collider};
use ortho_math::{Fix64, Rotation, Vec2, Vec3};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32, i32),
    Remove(usize),
    Move(usize, i32, i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-12_i32..12, -12_i32..12).prop_map(|(x, z)| Op::Insert(x, z)),
        1 => any::<usize>().prop_map(Op::Remove),
        2 => (any::<usize>(), -12_i32..12, -12_i32..12).prop_map(|(i, x, z)| Op::Move(i, x, z)),
    ]
}

fn tile(x: i32, z: i32) -> Body {
    Body::fixed(Collider::new_box(
        Vec3::ONE * Fix64::from_ratio(1, 4),
        Vec3::from_ints(x, 0, z),
        Rotation::IDENTITY,
    ))
}

fn brute_force(bodies: &BodySet, live: &[BodyHandle], query: &Bounds2D) -> Vec<BodyHandle> {
    let mut hits: Vec<_> = live
        .iter()
        .copied()
        .filter(|&h| bodies.get(h).is_some_and(|b| b.bounds().xz().intersects(query)))
        .collect();
    hits.sort();
    hits
}

proptest! {
    #[test]
    fn zorder_round_trips(x in any::<i32>(), y in any::<i32>()) {
        prop_assert_eq!(zorder::decode(zorder::encode(x, y)), (x, y));
    }

    #[test]
    fn zorder_is_monotone_along_each_axis(x in -100_000_i32..100_000, y in -100_000_i32..100_000) {
        prop_assert!(zorder::encode(x, y) < zorder::encode(x + 1, y));
        prop_assert!(zorder::encode(x, y) < zorder::encode(x, y + 1));
    }

    #[test]
    fn tree_invariants_hold_under_edits(ops in prop::collection::vec(op(), 1..80)) {
        let mut bodies = BodySet::new();
        let mut tree = SpatialTree::new();
        let mut live: Vec<BodyHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(x, z) => {
                    let handle = bodies.insert(tile(x, z));
                    tree.insert(&mut bodies, handle);
                    live.push(handle);
                }
                Op::Remove(i) => {
                    if !live.is_empty() {
                        let handle = live.swap_remove(i % live.len());
                        tree.remove(&mut bodies, handle);
                        prop_assert!(bodies.get(handle).and_then(Body::tree_node).is_none());
                        bodies.remove(handle);
                    }
                }
                Op::Move(i, x, z) => {
                    if !live.is_empty() {
                        let handle = live[i % live.len()];
                        let body = bodies.get_mut(handle).expect("live");
                        body.transform_mut().set_position(Vec3::from_ints(x, 0, z));
                        body.update_bounds();
                        tree.insert(&mut bodies, handle);
                    }
                }
            }
            if let Err(err) = tree.validate(&bodies) {
                return Err(TestCaseError::fail(err.to_string()));
            }
            prop_assert_eq!(tree.is_empty(), live.is_empty());
        }

        let query = Bounds2D::new(Vec2::from_ints(-4, -3), Vec2::from_ints(5, 2));
        let mut hits = Vec::new();
        tree.overlap_bounds(&query, &bodies, &mut hits);
        hits.sort();
        prop_assert_eq!(hits, brute_force(&bodies, &live, &query));
    }
}

#[test]
fn ascending_inserts_stay_logarithmic() {
    let mut bodies = BodySet::new();
    let mut tree = SpatialTree::new();
    for x in 0..256 {
        let handle = bodies.insert(tile(x, 0));
        tree.insert(&mut bodies, handle);
    }
    tree.validate(&bodies).expect("balanced");
    assert!(tree.height() <= 11, "height {}", tree.height());
    assert_eq!(tree.node_count(), 511);
}

#[test]
fn colocated_bodies_share_a_leaf_newest_first() {
    let mut bodies = BodySet::new();
    let mut tree = SpatialTree::new();
    let a = bodies.insert(tile(3, 3));
    let b = bodies.insert(tile(3, 3));
    tree.insert(&mut bodies, a);
    tree.insert(&mut bodies, b);
    let leaf = bodies.get(a).and_then(Body::tree_node).expect("indexed");
    assert_eq!(bodies.get(b).and_then(Body::tree_node), Some(leaf));
    assert_eq!(tree.leaf_bodies(leaf), Some(&[b, a][..]));
    assert_eq!(tree.key(leaf), Some(zorder::encode(3, 3)));

    tree.remove(&mut bodies, b);
    assert_eq!(tree.leaf_bodies(leaf), Some(&[a][..]));
    tree.remove(&mut bodies, a);
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn traversal_visits_every_node_with_its_height() {
    let mut bodies = BodySet::new();
    let mut tree = SpatialTree::new();
    for (x, z) in [(0, 0), (5, 0), (0, 5), (-5, -5)] {
        let handle = bodies.insert(tile(x, z));
        tree.insert(&mut bodies, handle);
    }
    let mut visited = 0;
    let mut tallest = 0;
    tree.traverse_bounds(|bounds, height| {
        assert!(bounds.is_valid());
        visited += 1;
        tallest = tallest.max(height);
    });
    assert_eq!(visited, 7);
    assert_eq!(tallest, tree.height());
}
