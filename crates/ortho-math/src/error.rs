// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;

/// Errors surfaced by non-panicking math accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// A component index was outside `0..len`.
    #[error("component index {index} out of range for a {len}-component value")]
    ComponentIndex {
        /// Requested index.
        index: usize,
        /// Number of components the value has.
        len: usize,
    },
}
