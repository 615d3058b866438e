// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! The dynamics world: body bookkeeping, queries and the fixed step.

use ortho_geom::collision::{contact, intersect};
use ortho_geom::{Bounds2D, Collider};
use ortho_math::{Fix64, Rotation, Vec3};
use tracing::{debug, instrument, trace_span};

use crate::body::{Body, BodyHandle, BodyKind, BodySet, ListenerId};
use crate::config::WorldConfig;
use crate::constraint::{ConstraintBuffers, ContactConstraint};
use crate::events::{TriggerEvent, TriggerEventKind};
use crate::partition::SpatialTree;
use crate::solver::{restitution_bias, trap_threshold_for, ContactSolver, SolverTuning};

/// BLAKE3 fingerprint of every body's position, rotation and velocity.
pub type StateDigest = [u8; 32];

#[derive(Debug, Default)]
struct KindLists {
    statics: Vec<BodyHandle>,
    rigids: Vec<BodyHandle>,
    triggers: Vec<BodyHandle>,
}

impl KindLists {
    fn list_mut(&mut self, kind: BodyKind) -> &mut Vec<BodyHandle> {
        match kind {
            BodyKind::Static => &mut self.statics,
            BodyKind::Rigid => &mut self.rigids,
            BodyKind::Trigger => &mut self.triggers,
        }
    }
}

/// Candidate gathering shared by the step and the overlap queries.
#[derive(Debug, Default)]
struct BroadPhase {
    tree: Option<SpatialTree>,
    candidates: Vec<BodyHandle>,
}

impl BroadPhase {
    /// Fills `candidates` with static/trigger bodies overlapping `query` (via
    /// the tree when enabled) and rigid bodies from `rigid_start` on.
    fn collect(&mut self, query: &Bounds2D, bodies: &BodySet, lists: &KindLists, rigid_start: usize) {
        self.candidates.clear();
        let hit = |handle: &&BodyHandle| {
            bodies
                .get(**handle)
                .is_some_and(|body| !body.is_kinematic() && body.bounds().xz().intersects(query))
        };
        if let Some(tree) = &mut self.tree {
            tree.overlap_bounds(query, bodies, &mut self.candidates);
        } else {
            self.candidates
                .extend(lists.statics.iter().chain(&lists.triggers).filter(hit).copied());
        }
        self.candidates
            .extend(lists.rigids.iter().skip(rigid_start).filter(hit).copied());
    }
}

/// Owns every body and advances them in fixed steps.
#[derive(Debug)]
pub struct DynamicsWorld {
    bodies: BodySet,
    order: Vec<BodyHandle>,
    lists: KindLists,
    broad: BroadPhase,
    buffers: ConstraintBuffers,
    solver: ContactSolver,
    max_penetration_depth: Fix64,
    gravity: Fix64,
    ground_height: Fix64,
    events: Vec<TriggerEvent>,
    step_count: u64,
}

impl Default for DynamicsWorld {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DynamicsWorld {
    /// Empty world with default tuning; `partitioning` enables the spatial
    /// tree for static and trigger bodies.
    pub fn new(partitioning: bool) -> Self {
        Self {
            bodies: BodySet::new(),
            order: Vec::new(),
            lists: KindLists::default(),
            broad: BroadPhase {
                tree: partitioning.then(SpatialTree::new),
                candidates: Vec::new(),
            },
            buffers: ConstraintBuffers::default(),
            solver: ContactSolver::default(),
            max_penetration_depth: crate::DEFAULT_MAX_PENETRATION_DEPTH,
            gravity: Fix64::ZERO,
            ground_height: Fix64::ZERO,
            events: Vec::new(),
            step_count: 0,
        }
    }

    /// Empty world configured from `config`.
    pub fn with_config(config: &WorldConfig) -> Self {
        let mut world = Self::new(config.partitioning);
        world.apply_config(config);
        world
    }

    /// Applies every field of `config` through the clamping setters.
    pub fn apply_config(&mut self, config: &WorldConfig) {
        self.set_partitioning(config.partitioning);
        self.set_velocity_iterations(config.velocity_iterations);
        self.set_position_iterations(config.position_iterations);
        self.set_constraint_buffer_count(config.constraint_buffer_count);
        self.set_max_penetration_depth(config.max_penetration_depth);
        self.set_gravity(config.gravity);
        self.set_ground_height(config.ground_height);
        self.set_solver_tuning(config.solver);
    }

    /// Current settings as a [`WorldConfig`].
    pub fn config(&self) -> WorldConfig {
        WorldConfig {
            partitioning: self.is_partitioning(),
            velocity_iterations: self.solver.velocity_iterations,
            position_iterations: self.solver.position_iterations,
            constraint_buffer_count: self.buffers.slot_count(),
            max_penetration_depth: self.max_penetration_depth,
            gravity: self.gravity,
            ground_height: self.ground_height,
            solver: self.solver.tuning,
        }
    }

    /// Whether static and trigger bodies are indexed by the spatial tree.
    pub const fn is_partitioning(&self) -> bool {
        self.broad.tree.is_some()
    }

    /// Builds or drops the spatial tree.
    pub fn set_partitioning(&mut self, enabled: bool) {
        if enabled == self.is_partitioning() {
            return;
        }
        let indexed = self.lists.statics.iter().chain(&self.lists.triggers);
        if enabled {
            let mut tree = SpatialTree::new();
            for &handle in indexed {
                tree.insert(&mut self.bodies, handle);
            }
            self.broad.tree = Some(tree);
        } else {
            for &handle in indexed {
                if let Some(body) = self.bodies.get_mut(handle) {
                    body.set_tree_node(None);
                }
            }
            self.broad.tree = None;
        }
        debug!(enabled, "spatial partitioning toggled");
    }

    /// Spatial tree, when partitioning is enabled.
    pub const fn spatial_tree(&self) -> Option<&SpatialTree> {
        self.broad.tree.as_ref()
    }

    /// Velocity iterations per step.
    pub const fn velocity_iterations(&self) -> u32 {
        self.solver.velocity_iterations
    }

    /// Sets the velocity iterations per step.
    pub fn set_velocity_iterations(&mut self, count: u32) {
        self.solver.velocity_iterations = count;
    }

    /// Position iterations per ring slot.
    pub const fn position_iterations(&self) -> u32 {
        self.solver.position_iterations
    }

    /// Sets the position iterations per ring slot.
    pub fn set_position_iterations(&mut self, count: u32) {
        self.solver.position_iterations = count;
    }

    /// Steps of contacts kept for positional correction.
    pub fn constraint_buffer_count(&self) -> usize {
        self.buffers.slot_count()
    }

    /// Resizes the constraint ring (at least one slot) and re-derives the
    /// trap threshold as `count + 1`. Live constraints return to the pool.
    pub fn set_constraint_buffer_count(&mut self, count: usize) {
        let count = count.max(1);
        if count == self.buffers.slot_count() {
            return;
        }
        self.buffers.resize(count);
        self.solver.trap_threshold = trap_threshold_for(count);
    }

    /// Static contacts needed before the trap branch applies.
    pub const fn trap_threshold(&self) -> u32 {
        self.solver.trap_threshold
    }

    /// Resting tolerance.
    pub const fn max_penetration_depth(&self) -> Fix64 {
        self.max_penetration_depth
    }

    /// Sets the resting tolerance, clamped to at least `EPSILON`.
    pub fn set_max_penetration_depth(&mut self, depth: Fix64) {
        self.max_penetration_depth = depth.max(Fix64::EPSILON);
    }

    /// Vertical acceleration applied to airborne rigid bodies.
    pub const fn gravity(&self) -> Fix64 {
        self.gravity
    }

    /// Sets the vertical acceleration.
    pub fn set_gravity(&mut self, gravity: Fix64) {
        self.gravity = gravity;
    }

    /// Height of the ground plane.
    pub const fn ground_height(&self) -> Fix64 {
        self.ground_height
    }

    /// Moves the ground plane.
    pub fn set_ground_height(&mut self, height: Fix64) {
        self.ground_height = height;
    }

    /// Positional-correction constants.
    pub const fn solver_tuning(&self) -> SolverTuning {
        self.solver.tuning
    }

    /// Replaces the positional-correction constants.
    pub fn set_solver_tuning(&mut self, tuning: SolverTuning) {
        self.solver.tuning = tuning;
    }

    /// Constraint pool and ring.
    pub const fn constraint_buffers(&self) -> &ConstraintBuffers {
        &self.buffers
    }

    /// Number of bodies.
    pub const fn len(&self) -> usize {
        self.bodies.len()
    }

    /// `true` when the world holds no bodies.
    pub const fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Steps simulated so far.
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Every body handle in insertion order.
    pub fn handles(&self) -> &[BodyHandle] {
        &self.order
    }

    /// Static bodies in processing order.
    pub fn static_bodies(&self) -> &[BodyHandle] {
        &self.lists.statics
    }

    /// Rigid bodies in processing order.
    pub fn rigid_bodies(&self) -> &[BodyHandle] {
        &self.lists.rigids
    }

    /// Trigger bodies in processing order.
    pub fn trigger_bodies(&self) -> &[BodyHandle] {
        &self.lists.triggers
    }

    /// The body arena.
    pub const fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Body behind `handle`.
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Mutable body behind `handle`. Call [`DynamicsWorld::update_bounds`]
    /// after moving or reshaping it.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// Takes ownership of `body`, files it by kind and indexes static and
    /// trigger bodies.
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let kind = body.kind();
        let handle = self.bodies.insert(body);
        self.order.push(handle);
        self.lists.list_mut(kind).push(handle);
        if kind.is_indexed() {
            if let Some(tree) = &mut self.broad.tree {
                tree.insert(&mut self.bodies, handle);
            }
        }
        debug!(%handle, ?kind, "body added");
        handle
    }

    /// Removes a body and hands it back. Its slot in the kind list is filled
    /// by the last body of that kind.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let kind = self.bodies.get(handle)?.kind();
        if let Some(tree) = &mut self.broad.tree {
            tree.remove(&mut self.bodies, handle);
        }
        let list = self.lists.list_mut(kind);
        if let Some(at) = list.iter().position(|&h| h == handle) {
            list.swap_remove(at);
        }
        // Linear on purpose: `order` drives `handles()` and `state_digest`, so
        // it must keep insertion order. A swap removal here changes digests.
        self.order.retain(|&h| h != handle);
        let body = self.bodies.remove(handle);
        debug!(%handle, ?kind, "body removed");
        body
    }

    /// Moves a body and refreshes its bounds and index entry.
    pub fn set_transform(&mut self, handle: BodyHandle, position: Vec3, rotation: Rotation) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let transform = body.transform_mut();
        transform.set_position(position);
        transform.set_rotation(rotation);
        self.update_bounds(handle)
    }

    /// Recomputes a body's bounds and re-keys its spatial-tree leaf.
    pub fn update_bounds(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.update_bounds();
        let indexed = body.tree_node().is_some();
        if indexed {
            if let Some(tree) = &mut self.broad.tree {
                tree.insert(&mut self.bodies, handle);
            }
        }
        true
    }

    /// Registers a trigger callback. `None` unless `handle` is a live trigger.
    pub fn on_trigger<F>(&mut self, handle: BodyHandle, kind: TriggerEventKind, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&TriggerEvent) + 'static,
    {
        self.bodies
            .get_mut(handle)?
            .add_trigger_listener(kind, callback)
    }

    /// Unregisters a trigger callback.
    pub fn remove_trigger_listener(&mut self, handle: BodyHandle, id: ListenerId) -> bool {
        self.bodies
            .get_mut(handle)
            .is_some_and(|body| body.remove_trigger_listener(id))
    }

    /// Trigger transitions of the last step, in firing order.
    pub fn trigger_events(&self) -> &[TriggerEvent] {
        &self.events
    }

    /// Bodies overlapping a box placed at `position`. Clears `results` first.
    pub fn overlap_box(
        &mut self,
        position: Vec3,
        rotation: Rotation,
        half_extents: Vec3,
        results: &mut Vec<BodyHandle>,
    ) {
        let query = Collider::new_box(half_extents, position, rotation);
        self.overlap_collider(&query, None, results);
    }

    /// Bodies overlapping a sphere. Clears `results` first.
    pub fn overlap_sphere(&mut self, position: Vec3, radius: Fix64, results: &mut Vec<BodyHandle>) {
        let query = Collider::new_sphere(radius, position);
        self.overlap_collider(&query, None, results);
    }

    /// Bodies overlapping `collider`, skipping `exclude` and kinematic bodies.
    pub fn overlap_collider(
        &mut self,
        collider: &Collider,
        exclude: Option<BodyHandle>,
        results: &mut Vec<BodyHandle>,
    ) {
        let _span = trace_span!("overlap").entered();
        results.clear();
        let query = collider.bounds().xz();
        self.broad.collect(&query, &self.bodies, &self.lists, 0);
        for &handle in &self.broad.candidates {
            if Some(handle) == exclude {
                continue;
            }
            if let Some(body) = self.bodies.get(handle) {
                if intersect(collider, body.collider()) {
                    results.push(handle);
                }
            }
        }
    }

    /// Bodies overlapping the body behind `handle`, excluding itself.
    /// `false` if the handle is stale.
    pub fn overlap_body(&mut self, handle: BodyHandle, results: &mut Vec<BodyHandle>) -> bool {
        let Some(collider) = self.bodies.get(handle).map(|b| b.collider().clone()) else {
            results.clear();
            return false;
        };
        self.overlap_collider(&collider, Some(handle), results);
        true
    }

    /// Advances the world by `dt`.
    #[instrument(level = "trace", skip(self))]
    pub fn simulate(&mut self, dt: Fix64) {
        self.events.clear();
        self.solve_motion(dt);
        self.solve_collision(dt);
        self.solve_misc();
        self.step_count += 1;
    }

    /// Fingerprint of the simulation state, bodies in insertion order.
    pub fn state_digest(&self) -> StateDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&u64::try_from(self.order.len()).unwrap_or(u64::MAX).to_le_bytes());
        for &handle in &self.order {
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            let position = body.transform().position();
            let rotation = body.transform().rotation();
            let velocity = body.velocity();
            hasher.update(&[body.kind().tag()]);
            for value in [
                position.x,
                position.y,
                position.z,
                rotation.cos(),
                rotation.sin(),
                velocity.x,
                velocity.y,
                velocity.z,
            ] {
                hasher.update(&value.raw().to_le_bytes());
            }
        }
        *hasher.finalize().as_bytes()
    }

    fn solve_motion(&mut self, dt: Fix64) {
        let _span = trace_span!("solve_motion").entered();
        for &handle in &self.lists.rigids {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.is_kinematic() {
                continue;
            }
            body.reset_static_collisions();
            body.integrate_motion(dt, self.gravity, self.ground_height);
        }
    }

    fn solve_collision(&mut self, dt: Fix64) {
        let _span = trace_span!("solve_collision").entered();
        self.buffers.begin_step();

        // Each rigid pair is tested once: only later rigid bodies are candidates.
        let mut next = 0;
        while let Some(&handle) = self.lists.rigids.get(next) {
            next += 1;
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            if body.is_kinematic() {
                continue;
            }
            let query = body.bounds().xz();
            self.broad.collect(&query, &self.bodies, &self.lists, next);
            self.narrow_phase(handle);
        }

        let current = self.buffers.current();
        self.solver
            .solve_velocity(&mut self.buffers, current, &mut self.bodies);

        for &handle in &self.lists.rigids {
            if let Some(body) = self.bodies.get_mut(handle) {
                if !body.is_kinematic() {
                    body.integrate_position_2d(dt);
                }
            }
        }

        self.count_static_collisions();
        for slot in self.buffers.oldest_first() {
            self.solver
                .solve_position(&mut self.buffers, slot, &mut self.bodies);
        }
        self.buffers.advance();
    }

    fn narrow_phase(&mut self, handle: BodyHandle) {
        for &other in &self.broad.candidates {
            if other == handle {
                continue;
            }
            let (Some(body), Some(candidate)) = (self.bodies.get(handle), self.bodies.get(other))
            else {
                continue;
            };
            match candidate.kind() {
                BodyKind::Static | BodyKind::Rigid => {
                    let manifold = contact(body.collider(), candidate.collider());
                    if manifold.is_empty() {
                        continue;
                    }
                    let normal_mass = if candidate.kind() == BodyKind::Static {
                        body.mass()
                    } else {
                        (body.inverse_mass() + candidate.inverse_mass()).recip()
                    };
                    let bias = restitution_bias(
                        body.velocity().xz(),
                        candidate.velocity().xz(),
                        manifold.normal,
                        body.bounciness() * candidate.bounciness(),
                    );
                    self.buffers.push(ContactConstraint::new(
                        handle,
                        other,
                        normal_mass,
                        bias,
                        manifold,
                    ));
                }
                BodyKind::Trigger => {
                    if intersect(body.collider(), candidate.collider()) {
                        if let Some(state) = self
                            .bodies
                            .get_mut(other)
                            .and_then(Body::trigger_state_mut)
                        {
                            state.enter(handle);
                        }
                    }
                }
            }
        }
    }

    fn count_static_collisions(&mut self) {
        let Self {
            buffers, bodies, ..
        } = self;
        for slot in 0..buffers.slot_count() {
            buffers.for_each_in_slot(slot, |c| {
                let against_static = bodies
                    .get(c.body2)
                    .is_some_and(|b| b.kind() == BodyKind::Static);
                if against_static {
                    if let Some(body) = bodies.get_mut(c.body1) {
                        body.count_static_collision();
                    }
                }
            });
        }
    }

    fn solve_misc(&mut self) {
        let _span = trace_span!("solve_misc").entered();
        for &handle in &self.lists.rigids {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if !body.is_kinematic() {
                body.update_bounds();
            }
        }

        for &handle in &self.lists.triggers {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.is_kinematic() {
                continue;
            }
            let Some(state) = body.trigger_state_mut() else {
                continue;
            };
            let first = self.events.len();
            state.flush(handle, &mut self.events);
            for event in &self.events[first..] {
                if event.kind != TriggerEventKind::Stay {
                    debug!(trigger = %event.trigger, other = %event.other, kind = %event.kind, "trigger transition");
                }
            }
        }
    }
}
