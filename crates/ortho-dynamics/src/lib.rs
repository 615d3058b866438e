// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ortho dynamics: deterministic planar rigid bodies.
//!
//! A [`DynamicsWorld`] owns static, rigid and trigger [`Body`] records and
//! advances them with [`DynamicsWorld::simulate`]. Each step:
//! 1. integrates drag, gravity and forces for rigid bodies;
//! 2. gathers candidates from the [`SpatialTree`] and the not-yet-processed
//!    rigid bodies, then builds [`ContactConstraint`]s;
//! 3. runs the velocity pass on this step's constraints;
//! 4. re-integrates planar positions;
//! 5. counts static contacts across the constraint ring;
//! 6. runs capped positional correction over every ring slot, oldest first;
//! 7. refreshes bounds and fires trigger enter/stay/exit transitions.
//!
//! All arithmetic is `ortho_math::Fix64`, so identical inputs give
//! bit-identical results; [`DynamicsWorld::state_digest`] fingerprints the
//! outcome.

pub mod partition;

mod body;
mod config;
mod constraint;
mod events;
mod solver;
mod world;

use ortho_math::Fix64;

pub use body::{Body, BodyHandle, BodyKind, BodySet, ListenerId, TriggerState};
pub use config::{ConfigError, WorldConfig};
pub use constraint::{ConstraintBuffers, ConstraintId, ContactConstraint};
pub use events::{TriggerEvent, TriggerEventKind};
pub use partition::{NodeId, PartitionError, SpatialTree};
pub use solver::{ContactSolver, SolverTuning};
pub use world::{DynamicsWorld, StateDigest};

/// Velocity iterations per step unless configured.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;
/// Position iterations per ring slot unless configured.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 4;
/// Steps of contacts kept for positional correction unless configured.
pub const DEFAULT_CONSTRAINT_BUFFER_COUNT: usize = 4;
/// Resting tolerance (`0.005`) unless configured.
pub const DEFAULT_MAX_PENETRATION_DEPTH: Fix64 = Fix64::from_ratio(1, 200);
