// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Body records and the generation-checked arena that owns them.

use core::any::Any;
use core::fmt;

use ortho_geom::{Bounds, Collider, Transform};
use ortho_math::{Fix64, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::events::{TriggerEvent, TriggerEventKind};
use crate::partition::NodeId;

/// How a body participates in the simulation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Immovable geometry; indexed by the spatial tree.
    Static,
    /// Integrated and pushed around by contacts.
    Rigid,
    /// Reports enter/stay/exit of rigid bodies; indexed by the spatial tree.
    Trigger,
}

impl BodyKind {
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::Static => 0,
            Self::Rigid => 1,
            Self::Trigger => 2,
        }
    }

    /// Static and trigger bodies live in the spatial tree.
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Static | Self::Trigger)
    }
}

/// Stable reference to a body inside a [`BodySet`].
///
/// A handle outlives the body it names; once the body is removed the slot's
/// generation moves on and the handle resolves to `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Slot index inside the arena.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}v{}", self.index, self.generation)
    }
}

/// Identifies one registered trigger listener for removal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&TriggerEvent)>;

struct Listener {
    id: ListenerId,
    kind: TriggerEventKind,
    callback: Callback,
}

/// Double-buffered overlap sets and listeners of a trigger body.
#[derive(Default)]
pub struct TriggerState {
    entered: Vec<BodyHandle>,
    stayed: Vec<BodyHandle>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl TriggerState {
    /// Bodies reported as overlapping during the current step.
    pub fn entered(&self) -> &[BodyHandle] {
        &self.entered
    }

    /// Bodies that overlapped during the previous step.
    pub fn stayed(&self) -> &[BodyHandle] {
        &self.stayed
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn enter(&mut self, other: BodyHandle) {
        if !self.entered.contains(&other) {
            self.entered.push(other);
        }
    }

    fn add_listener(&mut self, kind: TriggerEventKind, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener { id, kind, callback });
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Diffs the two sets, appends the resulting events to `log`, invokes the
    /// listeners and swaps the buffers.
    pub(crate) fn flush(&mut self, trigger: BodyHandle, log: &mut Vec<TriggerEvent>) {
        if self.entered.is_empty() && self.stayed.is_empty() {
            return;
        }
        let first = log.len();
        for &other in &self.entered {
            if !self.stayed.contains(&other) {
                log.push(TriggerEvent::new(TriggerEventKind::Enter, trigger, other));
            }
        }
        for &other in &self.stayed {
            let kind = if self.entered.contains(&other) {
                TriggerEventKind::Stay
            } else {
                TriggerEventKind::Exit
            };
            log.push(TriggerEvent::new(kind, trigger, other));
        }
        for event in &log[first..] {
            for listener in self.listeners.iter_mut().filter(|l| l.kind == event.kind) {
                (listener.callback)(event);
            }
        }
        core::mem::swap(&mut self.entered, &mut self.stayed);
        self.entered.clear();
    }
}

impl fmt::Debug for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerState")
            .field("entered", &self.entered)
            .field("stayed", &self.stayed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A simulated body: one collider plus kind-specific dynamic state.
pub struct Body {
    kind: BodyKind,
    collider: Collider,
    mass: Fix64,
    inverse_mass: Fix64,
    drag: Fix64,
    air_drag: Fix64,
    bounciness: Fix64,
    velocity: Vec3,
    force: Vec3,
    collision_free_position: Vec2,
    static_collision_count: u32,
    kinematic: bool,
    node: Option<NodeId>,
    trigger: Option<TriggerState>,
    user_data: Option<Box<dyn Any>>,
}

impl Body {
    /// Creates a body of `kind` around `collider`.
    ///
    /// Rigid bodies start with unit mass; static and trigger bodies are
    /// massless.
    pub fn new(kind: BodyKind, collider: Collider) -> Self {
        let (mass, inverse_mass) = if kind == BodyKind::Rigid {
            (Fix64::ONE, Fix64::ONE)
        } else {
            (Fix64::ZERO, Fix64::ZERO)
        };
        let collision_free_position = collider.transform().position().xz();
        Self {
            kind,
            collider,
            mass,
            inverse_mass,
            drag: Fix64::ZERO,
            air_drag: Fix64::ZERO,
            bounciness: Fix64::ZERO,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            collision_free_position,
            static_collision_count: 0,
            kinematic: false,
            node: None,
            trigger: (kind == BodyKind::Trigger).then(TriggerState::default),
            user_data: None,
        }
    }

    /// Shorthand for [`BodyKind::Static`].
    pub fn fixed(collider: Collider) -> Self {
        Self::new(BodyKind::Static, collider)
    }

    /// Shorthand for [`BodyKind::Rigid`].
    pub fn rigid(collider: Collider) -> Self {
        Self::new(BodyKind::Rigid, collider)
    }

    /// Shorthand for [`BodyKind::Trigger`].
    pub fn trigger(collider: Collider) -> Self {
        Self::new(BodyKind::Trigger, collider)
    }

    /// Builder form of [`Body::set_mass`].
    pub fn with_mass(mut self, mass: Fix64) -> Self {
        self.set_mass(mass);
        self
    }

    /// Builder form of [`Body::set_velocity`].
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder form of [`Body::set_drag`].
    pub fn with_drag(mut self, drag: Fix64) -> Self {
        self.drag = drag;
        self
    }

    /// Builder form of [`Body::set_air_drag`].
    pub fn with_air_drag(mut self, air_drag: Fix64) -> Self {
        self.air_drag = air_drag;
        self
    }

    /// Builder form of [`Body::set_bounciness`].
    pub fn with_bounciness(mut self, bounciness: Fix64) -> Self {
        self.bounciness = bounciness;
        self
    }

    /// Builder form of [`Body::set_kinematic`].
    pub fn with_kinematic(mut self, kinematic: bool) -> Self {
        self.kinematic = kinematic;
        self
    }

    /// Simulation role of this body.
    pub const fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Collider owned by this body.
    pub const fn collider(&self) -> &Collider {
        &self.collider
    }

    /// Mutable collider access; call [`Body::update_bounds`] (or the world's
    /// `update_bounds`) after changing shape or transform.
    pub fn collider_mut(&mut self) -> &mut Collider {
        &mut self.collider
    }

    /// Placement of the collider.
    pub const fn transform(&self) -> &Transform {
        self.collider.transform()
    }

    /// Mutable placement; refresh bounds afterwards.
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.collider.transform_mut()
    }

    /// Cached world bounds of the collider.
    pub const fn bounds(&self) -> Bounds {
        self.collider.bounds()
    }

    /// Recomputes the collider's cached bounds. The spatial-tree leaf of an
    /// indexed body is left as is; use [`crate::DynamicsWorld::update_bounds`]
    /// for bodies owned by a world.
    pub fn update_bounds(&mut self) {
        self.collider.update_bounds();
    }

    /// Mass; zero for non-rigid bodies.
    pub const fn mass(&self) -> Fix64 {
        self.mass
    }

    /// `1 / mass`, or zero for non-rigid bodies.
    pub const fn inverse_mass(&self) -> Fix64 {
        self.inverse_mass
    }

    /// Sets the mass of a rigid body. Ignored for other kinds and for values
    /// not above [`Fix64::EPSILON`].
    pub fn set_mass(&mut self, mass: Fix64) {
        if self.kind != BodyKind::Rigid || mass <= Fix64::EPSILON {
            return;
        }
        self.mass = mass;
        self.inverse_mass = mass.recip();
    }

    /// Grounded drag factor.
    pub const fn drag(&self) -> Fix64 {
        self.drag
    }

    /// Per-step velocity decay while grounded.
    pub fn set_drag(&mut self, drag: Fix64) {
        self.drag = drag;
    }

    /// Airborne drag factor.
    pub const fn air_drag(&self) -> Fix64 {
        self.air_drag
    }

    /// Per-step velocity decay while airborne.
    pub fn set_air_drag(&mut self, air_drag: Fix64) {
        self.air_drag = air_drag;
    }

    /// Restitution factor.
    pub const fn bounciness(&self) -> Fix64 {
        self.bounciness
    }

    /// Restitution factor; a contact uses the product of both bodies' values.
    pub fn set_bounciness(&mut self, bounciness: Fix64) {
        self.bounciness = bounciness;
    }

    /// Linear velocity.
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Overwrites the linear velocity.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Force accumulated since the last step.
    pub const fn force(&self) -> Vec3 {
        self.force
    }

    /// Whether the body is excluded from simulation.
    pub const fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    /// Kinematic bodies are skipped by integration, contacts and queries.
    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    /// Ground-plane position before this step's contact corrections.
    pub const fn collision_free_position(&self) -> Vec2 {
        self.collision_free_position
    }

    /// Static contacts counted across the constraint ring in the last step.
    pub const fn static_collision_count(&self) -> u32 {
        self.static_collision_count
    }

    /// Spatial-tree leaf holding this body, if indexed.
    pub const fn tree_node(&self) -> Option<NodeId> {
        self.node
    }

    pub(crate) fn set_tree_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// Overlap bookkeeping; `None` unless this is a trigger.
    pub const fn trigger_state(&self) -> Option<&TriggerState> {
        self.trigger.as_ref()
    }

    pub(crate) fn trigger_state_mut(&mut self) -> Option<&mut TriggerState> {
        self.trigger.as_mut()
    }

    /// Registers `callback` for events of `kind`. Returns `None` when this is
    /// not a trigger body.
    pub fn add_trigger_listener<F>(&mut self, kind: TriggerEventKind, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&TriggerEvent) + 'static,
    {
        self.trigger
            .as_mut()
            .map(|state| state.add_listener(kind, Box::new(callback)))
    }

    /// Unregisters a listener; `false` if it was not registered here.
    pub fn remove_trigger_listener(&mut self, id: ListenerId) -> bool {
        self.trigger
            .as_mut()
            .is_some_and(|state| state.remove_listener(id))
    }

    /// Opaque host payload.
    pub fn user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    /// Mutable host payload.
    pub fn user_data_mut(&mut self) -> Option<&mut dyn Any> {
        self.user_data.as_deref_mut()
    }

    /// Replaces the host payload.
    pub fn set_user_data(&mut self, data: Option<Box<dyn Any>>) {
        self.user_data = data;
    }

    /// Accumulates a force applied on the next step. Rigid bodies only.
    pub fn add_force(&mut self, force: Vec3) {
        if self.kind == BodyKind::Rigid {
            self.force += force;
        }
    }

    /// Ground-plane form of [`Body::add_force`].
    pub fn add_force_2d(&mut self, force: Vec2) {
        self.add_force(force.to_xz(Fix64::ZERO));
    }

    /// Changes velocity immediately by `impulse / mass`. Rigid bodies only.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        if self.kind == BodyKind::Rigid {
            self.velocity += impulse * self.inverse_mass;
        }
    }

    /// Ground-plane form of [`Body::add_impulse`].
    pub fn add_impulse_2d(&mut self, impulse: Vec2) {
        self.add_impulse(impulse.to_xz(Fix64::ZERO));
    }

    /// Drops any accumulated force.
    pub fn clear_force(&mut self) {
        self.force = Vec3::ZERO;
    }

    pub(crate) fn reset_static_collisions(&mut self) {
        self.static_collision_count = 0;
    }

    pub(crate) fn count_static_collision(&mut self) {
        self.static_collision_count = self.static_collision_count.saturating_add(1);
    }

    pub(crate) fn translate_2d(&mut self, delta: Vec2) {
        if self.kind == BodyKind::Rigid {
            self.collider.transform_mut().translate_xz(delta);
        }
    }

    /// Drag, gravity and accumulated force, then position, clamped to the
    /// ground plane.
    pub(crate) fn integrate_motion(&mut self, dt: Fix64, gravity: Fix64, ground_height: Fix64) {
        let half_height = self.collider.half_height();
        let mut position = self.collider.transform().position();
        let mut velocity = self.velocity;
        self.collision_free_position = position.xz();

        if self.inverse_mass != Fix64::ZERO {
            let planar_speed = velocity.xz().sqr_magnitude();
            if position.y - half_height > ground_height {
                if planar_speed > Fix64::EPSILON {
                    velocity *= (Fix64::ONE - self.air_drag).clamp(Fix64::ZERO, Fix64::ONE);
                } else if velocity != Vec3::ZERO {
                    velocity.x = Fix64::ZERO;
                    velocity.z = Fix64::ZERO;
                }
                velocity.y += gravity * dt;
            } else if planar_speed > Fix64::EPSILON {
                velocity *= (Fix64::ONE - self.drag).clamp(Fix64::ZERO, Fix64::ONE);
            } else if velocity != Vec3::ZERO {
                velocity = Vec3::ZERO;
            }

            if self.force != Vec3::ZERO {
                velocity += self.force * self.inverse_mass * dt;
                self.force = Vec3::ZERO;
            }
            position += velocity * dt;
        }

        let min_height = ground_height + half_height;
        if position.y < min_height {
            velocity.y = Fix64::ZERO;
            position.y = min_height;
        }

        self.velocity = velocity;
        self.collider.transform_mut().set_position(position);
        self.collider.update_bounds();
    }

    /// Re-applies this step's planar velocity from the collision-free
    /// snapshot. Height was already integrated and clamped.
    pub(crate) fn integrate_position_2d(&mut self, dt: Fix64) {
        let height = self.collider.transform().position().y;
        let planar = self.collision_free_position + self.velocity.xz() * dt;
        self.collider.transform_mut().set_position(planar.to_xz(height));
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("kind", &self.kind)
            .field("collider", &self.collider)
            .field("mass", &self.mass)
            .field("velocity", &self.velocity)
            .field("kinematic", &self.kinematic)
            .field("node", &self.node)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Generation-checked arena of bodies.
#[derive(Debug, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodySet {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` when no body is stored.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `body`, reusing a vacated slot when one exists.
    pub fn insert(&mut self, body: Body) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.body = Some(body);
                return BodyHandle {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    /// Takes the body out; the handle (and any copy of it) goes stale.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(body)
    }

    /// `true` if `handle` still names a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Body behind `handle`, if still live.
    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    /// Mutable body behind `handle`, if still live.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    /// Two distinct bodies at once. `None` if either handle is stale or both
    /// name the same body.
    pub fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut Body, &mut Body)> {
        if a.index == b.index {
            return None;
        }
        let (ia, ib) = (a.index as usize, b.index as usize);
        let (first, second) = if ia < ib {
            let (head, tail) = self.slots.split_at_mut(ib);
            (head.get_mut(ia)?, tail.first_mut()?)
        } else {
            let (head, tail) = self.slots.split_at_mut(ia);
            (tail.first_mut()?, head.get_mut(ib)?)
        };
        if first.generation != a.generation || second.generation != b.generation {
            return None;
        }
        Some((first.body.as_mut()?, second.body.as_mut()?))
    }

    /// Live bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let body = slot.body.as_ref()?;
            let index = u32::try_from(i).ok()?;
            Some((
                BodyHandle {
                    index,
                    generation: slot.generation,
                },
                body,
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn ball() -> Body {
        Body::rigid(Collider::new_sphere(Fix64::ONE, Vec3::ZERO))
    }

    #[test]
    fn stale_handles_miss_after_reuse() {
        let mut set = BodySet::new();
        let a = set.insert(ball());
        assert!(set.remove(a).is_some());
        let b = set.insert(ball());
        assert_eq!(a.index(), b.index());
        assert!(set.get(a).is_none());
        assert!(set.get(b).is_some());
        assert!(set.remove(a).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn pair_mut_rejects_aliasing() {
        let mut set = BodySet::new();
        let a = set.insert(ball());
        let b = set.insert(ball());
        assert!(set.pair_mut(a, a).is_none());
        let (x, y) = set.pair_mut(b, a).expect("distinct live bodies");
        x.set_drag(Fix64::ONE);
        y.set_drag(Fix64::TWO);
        assert_eq!(set.get(b).map(Body::drag), Some(Fix64::ONE));
        assert_eq!(set.get(a).map(Body::drag), Some(Fix64::TWO));
    }

    #[test]
    fn mass_and_forces_only_touch_rigid_bodies() {
        let mut wall = Body::fixed(Collider::new_sphere(Fix64::ONE, Vec3::ZERO));
        wall.set_mass(Fix64::TWO);
        wall.add_impulse(Vec3::ONE);
        assert_eq!(wall.mass(), Fix64::ZERO);
        assert_eq!(wall.velocity(), Vec3::ZERO);

        let mut b = ball();
        b.set_mass(Fix64::ZERO);
        assert_eq!(b.mass(), Fix64::ONE);
        b.set_mass(Fix64::TWO);
        assert_eq!(b.inverse_mass(), Fix64::HALF);
        b.add_impulse_2d(Vec2::new(Fix64::TWO, Fix64::ZERO));
        assert_eq!(b.velocity(), Vec3::UNIT_X);
    }
}
