// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Trigger transitions reported by the misc pass of each step.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::body::BodyHandle;

/// Edge of a trigger overlap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEventKind {
    /// First step the other body overlaps the trigger.
    Enter,
    /// The overlap continues from the previous step.
    Stay,
    /// The overlap ended.
    Exit,
}

impl fmt::Display for TriggerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enter => "enter",
            Self::Stay => "stay",
            Self::Exit => "exit",
        })
    }
}

/// One transition between a trigger and another body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TriggerEvent {
    /// Which edge fired.
    pub kind: TriggerEventKind,
    /// The trigger body.
    pub trigger: BodyHandle,
    /// The body entering, staying in or leaving the trigger. May be stale on
    /// `Exit` if it was removed from the world.
    pub other: BodyHandle,
}

impl TriggerEvent {
    pub(crate) const fn new(kind: TriggerEventKind, trigger: BodyHandle, other: BodyHandle) -> Self {
        Self {
            kind,
            trigger,
            other,
        }
    }
}
