// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Pooled contact constraints kept across a ring of recent steps.

use ortho_geom::ContactManifold;
use ortho_math::Fix64;
use tracing::debug;

use crate::body::BodyHandle;

/// One touching pair produced by the narrow phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ContactConstraint {
    /// Rigid body whose contacts are being resolved.
    pub body1: BodyHandle,
    /// The other body; static or rigid.
    pub body2: BodyHandle,
    /// `mass1` against static geometry, else `1 / (inv_mass1 + inv_mass2)`.
    pub normal_mass: Fix64,
    /// Impulse accumulated over this step's velocity iterations.
    pub normal_impulse: Fix64,
    /// Separation speed the velocity pass aims for.
    pub restitution_bias: Fix64,
    /// Shallowest penetration seen by the trap branch; starts at `MAX`.
    pub trap_penetration_depth: Fix64,
    /// Normal and local contact points.
    pub manifold: ContactManifold,
}

impl ContactConstraint {
    /// Fresh constraint with no accumulated impulse.
    pub const fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        normal_mass: Fix64,
        restitution_bias: Fix64,
        manifold: ContactManifold,
    ) -> Self {
        Self {
            body1,
            body2,
            normal_mass,
            normal_impulse: Fix64::ZERO,
            restitution_bias,
            trap_penetration_depth: Fix64::MAX,
            manifold,
        }
    }
}

/// Index of a pooled constraint record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintId(u32);

/// Record pool plus `N` frame slots used as a ring.
///
/// Slot `current` receives this step's constraints; the other slots keep the
/// constraints of the previous `N - 1` steps for positional correction.
#[derive(Debug, Clone)]
pub struct ConstraintBuffers {
    records: Vec<ContactConstraint>,
    free: Vec<ConstraintId>,
    slots: Vec<Vec<ConstraintId>>,
    current: usize,
}

impl ConstraintBuffers {
    /// Ring with `count` slots (at least one).
    pub fn new(count: usize) -> Self {
        Self {
            records: Vec::new(),
            free: Vec::new(),
            slots: vec![Vec::new(); count.max(1)],
            current: 0,
        }
    }

    /// Number of slots in the ring.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot filled by the running step.
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Records ever allocated (the high-water mark).
    pub fn pool_size(&self) -> usize {
        self.records.len()
    }

    /// Records currently referenced by some slot.
    pub fn live_count(&self) -> usize {
        self.records.len() - self.free.len()
    }

    /// Returns every record to the pool and rebuilds the ring with `count`
    /// slots, keeping the current index modulo the new length.
    pub fn resize(&mut self, count: usize) {
        let count = count.max(1);
        for slot in &mut self.slots {
            self.free.append(slot);
        }
        self.slots = vec![Vec::new(); count];
        self.current %= count;
        debug!(slots = count, pooled = self.records.len(), "constraint ring resized");
    }

    /// Frees the current slot's records before it is refilled.
    pub fn begin_step(&mut self) {
        if let Some(slot) = self.slots.get_mut(self.current) {
            self.free.append(slot);
        }
    }

    /// Stores `constraint` in the current slot, reusing a pooled record.
    pub fn push(&mut self, constraint: ContactConstraint) -> ConstraintId {
        let id = if let Some(id) = self.free.pop() {
            self.records[id.0 as usize] = constraint;
            id
        } else {
            let id = ConstraintId(u32::try_from(self.records.len()).unwrap_or(u32::MAX));
            self.records.push(constraint);
            id
        };
        if let Some(slot) = self.slots.get_mut(self.current) {
            slot.push(id);
        }
        id
    }

    /// Record behind `id`.
    pub fn get(&self, id: ConstraintId) -> Option<&ContactConstraint> {
        self.records.get(id.0 as usize)
    }

    /// Constraint ids stored in `slot`.
    pub fn slot(&self, slot: usize) -> &[ConstraintId] {
        self.slots.get(slot).map_or(&[], Vec::as_slice)
    }

    /// Slot indices from the oldest step to the current one.
    pub fn oldest_first(&self) -> impl Iterator<Item = usize> {
        let n = self.slots.len();
        let current = self.current;
        (1..=n).map(move |i| (current + i) % n)
    }

    /// Visits the records of `slot` in insertion order.
    pub fn for_each_in_slot<F>(&mut self, slot: usize, mut f: F)
    where
        F: FnMut(&mut ContactConstraint),
    {
        let Self { records, slots, .. } = self;
        let Some(ids) = slots.get(slot) else {
            return;
        };
        for id in ids {
            if let Some(record) = records.get_mut(id.0 as usize) {
                f(record);
            }
        }
    }

    /// Moves the ring to the next slot.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }
}

impl Default for ConstraintBuffers {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CONSTRAINT_BUFFER_COUNT)
    }
}
