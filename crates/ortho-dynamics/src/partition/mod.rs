// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Broad-phase partitioning of static and trigger bodies.

mod tree;
pub mod zorder;

pub use tree::{NodeId, PartitionError, SpatialTree};
