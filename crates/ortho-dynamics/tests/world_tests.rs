// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::cast_precision_loss)]

use std::cell::Cell;
use std::rc::Rc;

use ortho_dynamics::{
    Body, BodyHandle, DynamicsWorld, TriggerEventKind, WorldConfig, DEFAULT_MAX_PENETRATION_DEPTH,
};
use ortho_geom::Collider;
use ortho_math::{Fix64, Rotation, Vec2, Vec3};

fn fx(v: f32) -> Fix64 {
    Fix64::from_f32(v)
}

fn v3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(fx(x), fx(y), fx(z))
}

fn dt() -> Fix64 {
    Fix64::from_ratio(1, 60)
}

fn cube(half: f32, at: Vec3) -> Collider {
    Collider::new_box(Vec3::ONE * fx(half), at, Rotation::IDENTITY)
}

fn position(world: &DynamicsWorld, handle: BodyHandle) -> Vec3 {
    world.body(handle).expect("live body").transform().position()
}

fn velocity(world: &DynamicsWorld, handle: BodyHandle) -> Vec3 {
    world.body(handle).expect("live body").velocity()
}

#[test]
fn equal_spheres_exchange_velocities() {
    let mut world = DynamicsWorld::new(true);
    let left = world.add_body(
        Body::rigid(Collider::new_sphere(Fix64::ONE, v3(0.0, 1.0, 0.0)))
            .with_velocity(Vec3::UNIT_X)
            .with_bounciness(Fix64::ONE),
    );
    let right = world.add_body(
        Body::rigid(Collider::new_sphere(Fix64::ONE, v3(2.05, 1.0, 0.0)))
            .with_velocity(-Vec3::UNIT_X)
            .with_bounciness(Fix64::ONE),
    );

    for _ in 0..3 {
        world.simulate(dt());
    }

    let (a, b) = (velocity(&world, left), velocity(&world, right));
    let tolerance = fx(1e-3);
    assert!((a.x + Fix64::ONE).abs() < tolerance, "left {a:?}");
    assert!((b.x - Fix64::ONE).abs() < tolerance, "right {b:?}");
    assert!((a.x + b.x).abs() < tolerance);
    assert!(position(&world, left).x < position(&world, right).x);
}

#[test]
fn inelastic_contact_stops_approach_against_static_wall() {
    for partitioning in [true, false] {
        let mut world = DynamicsWorld::new(partitioning);
        world.add_body(Body::fixed(cube(1.0, v3(0.0, 1.0, 0.0))));
        let ball = world.add_body(
            Body::rigid(Collider::new_sphere(fx(0.5), v3(-3.0, 0.5, 0.0)))
                .with_velocity(v3(3.0, 0.0, 0.0)),
        );
        for _ in 0..120 {
            world.simulate(dt());
        }
        let p = position(&world, ball);
        assert!(p.x <= fx(-1.5) + DEFAULT_MAX_PENETRATION_DEPTH, "x {}", p.x);
        assert!(p.x >= fx(-1.6), "x {}", p.x);
        assert!(velocity(&world, ball).x.abs() < fx(1e-3));
    }
}

#[test]
fn partitioned_and_linear_broad_phase_agree() {
    let run = |partitioning: bool| {
        let mut world = DynamicsWorld::new(partitioning);
        world.set_gravity(fx(-10.0));
        for i in -3..=3 {
            world.add_body(Body::fixed(cube(0.5, v3(i as f32 * 3.0, 0.5, 4.0))));
        }
        for i in 0..4 {
            world.add_body(
                Body::rigid(Collider::new_sphere(fx(0.5), v3(i as f32 * 2.0 - 3.0, 2.0, 0.0)))
                    .with_velocity(v3(0.5, 0.0, 3.0)),
            );
        }
        for _ in 0..90 {
            world.simulate(dt());
        }
        world.state_digest()
    };
    assert_eq!(run(true), run(false));
}

#[test]
fn dropped_box_settles_against_static_box() {
    let mut world = DynamicsWorld::new(true);
    world.set_gravity(fx(-10.0));
    world.add_body(Body::fixed(cube(1.0, v3(0.0, 1.0, 0.0))));
    let crate_box = world.add_body(Body::rigid(cube(0.5, v3(1.49, 3.0, 0.0))));

    for _ in 0..200 {
        world.simulate(dt());
        assert!(position(&world, crate_box).y >= fx(0.5));
    }
    let settled = position(&world, crate_box);
    assert_eq!(settled.y, fx(0.5));
    assert_eq!(velocity(&world, crate_box).y, Fix64::ZERO);
    assert!(settled.x >= fx(1.5) - DEFAULT_MAX_PENETRATION_DEPTH, "x {}", settled.x);
    assert!(settled.x <= fx(1.5) + Fix64::EPSILON, "x {}", settled.x);

    for _ in 0..50 {
        world.simulate(dt());
    }
    let later = position(&world, crate_box);
    assert!((later.x - settled.x).abs() <= DEFAULT_MAX_PENETRATION_DEPTH);
    assert_eq!(later.y, settled.y);
}

fn trigger_run(partitioning: bool) {
    let mut world = DynamicsWorld::new(partitioning);
    let zone = world.add_body(Body::trigger(cube(1.0, Vec3::ZERO)));
    let runner = world.add_body(
        Body::rigid(Collider::new_sphere(fx(0.5), v3(-4.0, 0.5, 0.0)))
            .with_velocity(v3(6.0, 0.0, 0.0)),
    );

    let entered = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&entered);
    world
        .on_trigger(zone, TriggerEventKind::Enter, move |event| {
            assert_eq!(event.other, runner);
            counter.set(counter.get() + 1);
        })
        .expect("trigger body accepts listeners");
    assert!(world
        .on_trigger(runner, TriggerEventKind::Enter, |_| {})
        .is_none());

    let (mut enter, mut stay, mut exit) = (Vec::new(), Vec::new(), Vec::new());
    for step in 0..100_u32 {
        world.simulate(dt());
        for event in world.trigger_events() {
            assert_eq!(event.trigger, zone);
            match event.kind {
                TriggerEventKind::Enter => enter.push(step),
                TriggerEventKind::Stay => stay.push(step),
                TriggerEventKind::Exit => exit.push(step),
            }
        }
    }

    assert_eq!(enter.len(), 1);
    assert_eq!(exit.len(), 1);
    assert_eq!(entered.get(), 1);
    let span = exit[0] - enter[0] - 1;
    assert!(span > 0);
    assert_eq!(stay.len(), span as usize);
    assert!(stay.iter().all(|&s| s > enter[0] && s < exit[0]));
}

#[test]
fn trigger_fires_enter_stays_then_exit() {
    trigger_run(true);
}

#[test]
fn trigger_edges_without_partitioning() {
    trigger_run(false);
}

#[test]
fn removed_listener_stops_firing() {
    let mut world = DynamicsWorld::new(true);
    let zone = world.add_body(Body::trigger(cube(2.0, Vec3::ZERO)));
    world.add_body(Body::rigid(Collider::new_sphere(fx(0.5), v3(0.0, 0.5, 0.0))));

    let stays = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&stays);
    let id = world
        .on_trigger(zone, TriggerEventKind::Stay, move |_| counter.set(counter.get() + 1))
        .expect("listener");
    for _ in 0..3 {
        world.simulate(dt());
    }
    assert_eq!(stays.get(), 2);
    assert!(world.remove_trigger_listener(zone, id));
    assert!(!world.remove_trigger_listener(zone, id));
    world.simulate(dt());
    assert_eq!(stays.get(), 2);
    assert_eq!(world.trigger_events().len(), 1);
}

fn busy_scene(nudge: Fix64) -> DynamicsWorld {
    let mut world = DynamicsWorld::new(true);
    world.set_gravity(fx(-9.81));
    world.add_body(Body::fixed(Collider::new_box(
        v3(4.0, 1.0, 0.5),
        v3(0.0, 1.0, 5.0),
        Rotation::from_angle(fx(0.3)),
    )));
    world.add_body(Body::fixed(cube(1.0, v3(-5.0, 1.0, 0.0))));
    for i in 0..6 {
        let x = i as f32 * 1.1 - 3.0;
        let body = if i % 2 == 0 {
            Body::rigid(Collider::new_sphere(fx(0.5), v3(x, 1.0 + i as f32, 0.0)))
        } else {
            Body::rigid(Collider::new_box(
                v3(0.4, 0.4, 0.4),
                v3(x, 1.0, 0.5),
                Rotation::from_angle(fx(i as f32 * 0.2)),
            ))
        };
        world.add_body(
            body.with_velocity(v3(1.0, 0.0, 2.0 - i as f32 * 0.5))
                .with_bounciness(fx(0.5))
                .with_drag(fx(0.01)),
        );
    }
    let last = *world.rigid_bodies().last().expect("rigid bodies");
    let body = world.body_mut(last).expect("live");
    let v = body.velocity();
    body.set_velocity(Vec3::new(v.x + nudge, v.y, v.z));
    world
}

#[test]
fn identical_runs_produce_identical_digests() {
    let mut a = busy_scene(Fix64::ZERO);
    let mut b = busy_scene(Fix64::ZERO);
    let mut c = busy_scene(fx(0.01));
    for _ in 0..240 {
        a.simulate(dt());
        b.simulate(dt());
        c.simulate(dt());
    }
    assert_eq!(a.state_digest(), b.state_digest());
    assert_ne!(a.state_digest(), c.state_digest());
    assert_eq!(a.step_count(), 240);
}

#[test]
fn overlap_queries_filter_kinematic_and_self() {
    for partitioning in [true, false] {
        let mut world = DynamicsWorld::new(partitioning);
        let near = world.add_body(Body::fixed(cube(0.5, v3(1.0, 0.5, 0.0))));
        let far = world.add_body(Body::fixed(cube(0.5, v3(10.0, 0.5, 0.0))));
        let ghost = world.add_body(Body::fixed(cube(0.5, v3(-1.0, 0.5, 0.0))).with_kinematic(true));
        let ball = world.add_body(Body::rigid(Collider::new_sphere(Fix64::ONE, v3(0.0, 0.5, 0.0))));

        let mut hits = Vec::new();
        world.overlap_box(v3(0.0, 0.5, 0.0), Rotation::IDENTITY, v3(1.0, 1.0, 1.0), &mut hits);
        hits.sort();
        let mut expected = vec![near, ball];
        expected.sort();
        assert_eq!(hits, expected);
        assert!(!hits.contains(&far));
        assert!(!hits.contains(&ghost));

        world.overlap_sphere(v3(10.0, 0.5, 0.0), fx(0.75), &mut hits);
        assert_eq!(hits, vec![far]);

        assert!(world.overlap_body(ball, &mut hits));
        assert_eq!(hits, vec![near]);

        world.remove_body(near);
        assert!(world.overlap_body(ball, &mut hits));
        assert!(hits.is_empty());
        assert!(!world.overlap_body(near, &mut hits));
        if let Some(tree) = world.spatial_tree() {
            tree.validate(world.bodies()).expect("tree stays consistent");
        }
    }
}

#[test]
fn removing_bodies_swaps_kind_lists_and_keeps_insertion_order() {
    let mut world = DynamicsWorld::new(true);
    let handles: Vec<_> = (0..4)
        .map(|i| world.add_body(Body::rigid(Collider::new_sphere(fx(0.25), v3(i as f32 * 3.0, 0.25, 0.0)))))
        .collect();
    let removed = world.remove_body(handles[0]).expect("removed");
    assert_eq!(removed.kind(), ortho_dynamics::BodyKind::Rigid);
    assert!(world.body(handles[0]).is_none());
    assert!(world.remove_body(handles[0]).is_none());
    assert_eq!(world.rigid_bodies(), &[handles[3], handles[1], handles[2]]);
    assert_eq!(world.handles(), &handles[1..]);
    assert_eq!(world.len(), 3);
}

#[test]
fn setters_clamp_instead_of_failing() {
    let config = WorldConfig {
        constraint_buffer_count: 0,
        max_penetration_depth: Fix64::ZERO,
        velocity_iterations: 0,
        ..WorldConfig::default()
    };
    let world = DynamicsWorld::with_config(&config);
    assert_eq!(world.constraint_buffer_count(), 1);
    assert_eq!(world.trap_threshold(), 2);
    assert_eq!(world.max_penetration_depth(), Fix64::EPSILON);
    assert_eq!(world.velocity_iterations(), 0);

    let mut world = DynamicsWorld::default();
    assert_eq!(world.trap_threshold(), 5);
    world.set_constraint_buffer_count(6);
    assert_eq!(world.trap_threshold(), 7);
    assert_eq!(world.config().constraint_buffer_count, 6);
}

#[test]
fn toggling_partitioning_rebuilds_the_tree() {
    let mut world = DynamicsWorld::new(false);
    for i in 0..8 {
        world.add_body(Body::fixed(cube(0.5, v3(i as f32 * 2.0, 0.5, 0.0))));
    }
    assert!(world.spatial_tree().is_none());
    world.set_partitioning(true);
    let tree = world.spatial_tree().expect("tree");
    tree.validate(world.bodies()).expect("valid");
    assert_eq!(tree.node_count(), 15);
    world.set_partitioning(false);
    assert!(world
        .bodies()
        .iter()
        .all(|(_, body)| body.tree_node().is_none()));
}

#[test]
fn moving_an_indexed_body_rekeys_its_leaf() {
    let mut world = DynamicsWorld::new(true);
    let wall = world.add_body(Body::fixed(cube(0.5, v3(0.0, 0.5, 0.0))));
    world.add_body(Body::fixed(cube(0.5, v3(5.0, 0.5, 0.0))));
    assert!(world.set_transform(wall, v3(20.0, 0.5, 20.0), Rotation::IDENTITY));

    let mut hits = Vec::new();
    world.overlap_sphere(v3(20.0, 0.5, 20.0), fx(0.5), &mut hits);
    assert_eq!(hits, vec![wall]);
    world.overlap_sphere(Vec3::ZERO, fx(0.5), &mut hits);
    assert!(hits.is_empty());
    world
        .spatial_tree()
        .expect("tree")
        .validate(world.bodies())
        .expect("valid");
}

#[test]
fn free_fall_integrates_height_once_per_step() {
    let mut world = DynamicsWorld::new(true);
    let gravity = Fix64::from_int(-10);
    world.set_gravity(gravity);
    let ball = world.add_body(Body::rigid(Collider::new_sphere(Fix64::ONE, Vec3::from_ints(0, 5, 0))));

    world.simulate(dt());

    let vy = gravity * dt();
    assert_eq!(velocity(&world, ball).y, vy);
    let p = position(&world, ball);
    assert_eq!(p.y, Fix64::from_int(5) + vy * dt());
    assert_eq!(p.xz(), Vec2::ZERO);
}

#[test]
fn no_step_ends_below_the_ground_plane() {
    let radius = fx(0.5);
    for ground in [Fix64::ZERO, Fix64::ONE, Fix64::from_int(-2)] {
        let mut world = DynamicsWorld::new(true);
        world.set_gravity(Fix64::from_int(-10));
        world.set_ground_height(ground);
        let start = Vec3::new(Fix64::ZERO, ground + fx(0.508), Fix64::ZERO);
        let ball = world.add_body(
            Body::rigid(Collider::new_sphere(radius, start)).with_velocity(v3(0.5, -0.2, 0.0)),
        );
        for step in 0..30 {
            world.simulate(dt());
            let y = position(&world, ball).y;
            assert!(y >= ground + radius, "ground {ground} step {step}: y {y}");
        }
        assert_eq!(position(&world, ball).y, ground + radius);
        assert_eq!(velocity(&world, ball).y, Fix64::ZERO);
        assert!(position(&world, ball).x > Fix64::ZERO);
    }
}

#[test]
fn body_wedged_between_walls_reaches_trap_threshold_without_escaping() {
    let mut world = DynamicsWorld::new(true);
    let wall_half = v3(0.5, 0.5, 2.0);
    world.add_body(Body::fixed(Collider::new_box(wall_half, v3(-0.99, 0.5, 0.0), Rotation::IDENTITY)));
    world.add_body(Body::fixed(Collider::new_box(wall_half, v3(0.99, 0.5, 0.0), Rotation::IDENTITY)));
    let wedged = world.add_body(Body::rigid(cube(0.5, v3(0.0, 0.5, 0.0))));
    let threshold = world.trap_threshold();

    let mut first_trapped = None;
    for step in 0..60 {
        world.simulate(dt());
        let body = world.body(wedged).expect("live body");
        if first_trapped.is_none() && body.static_collision_count() >= threshold {
            first_trapped = Some(step);
        }
        let p = body.transform().position();
        assert!(p.x.abs() < fx(0.5), "step {step}: x {}", p.x);
        assert_eq!(p.y, fx(0.5));
        assert_eq!(p.z, Fix64::ZERO);
    }

    // Two wall contacts per step; the threshold is crossed once three ring
    // slots hold them.
    assert_eq!(first_trapped, Some(2));
    let count = world.body(wedged).expect("live body").static_collision_count();
    assert_eq!(count, 2 * u32::try_from(world.constraint_buffer_count()).unwrap());
}

#[test]
fn body_level_bounds_refresh_leaves_the_index_to_the_world() {
    let mut world = DynamicsWorld::new(true);
    let pillar = world.add_body(Body::fixed(cube(0.5, v3(0.0, 0.5, 0.0))));
    world.add_body(Body::fixed(cube(0.5, v3(6.0, 0.5, 0.0))));

    let body = world.body_mut(pillar).expect("live body");
    body.transform_mut().set_position(v3(-8.0, 0.5, 0.0));
    body.update_bounds();
    let mut hits = Vec::new();
    world.overlap_sphere(v3(-8.0, 0.5, 0.0), fx(0.5), &mut hits);
    assert!(hits.is_empty(), "stale leaf still covers the old spot");

    assert!(world.update_bounds(pillar));
    world.overlap_sphere(v3(-8.0, 0.5, 0.0), fx(0.5), &mut hits);
    assert_eq!(hits, vec![pillar]);
    world
        .spatial_tree()
        .expect("tree")
        .validate(world.bodies())
        .expect("valid");
}

#[test]
fn removal_keeps_digest_order_of_survivors() {
    let ball = |x: i32| Body::rigid(Collider::new_sphere(fx(0.25), Vec3::from_ints(x, 0, 0)));
    let mut edited = DynamicsWorld::new(true);
    let first = edited.add_body(ball(0));
    edited.add_body(ball(3));
    edited.add_body(Body::fixed(cube(0.5, v3(9.0, 0.5, 0.0))));
    edited.add_body(ball(6));
    edited.remove_body(first).expect("removed");

    let mut fresh = DynamicsWorld::new(true);
    fresh.add_body(ball(3));
    fresh.add_body(Body::fixed(cube(0.5, v3(9.0, 0.5, 0.0))));
    fresh.add_body(ball(6));

    assert_eq!(edited.state_digest(), fresh.state_digest());
}
