// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World configuration and its JSON form.

use std::path::Path;

use ortho_math::Fix64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::solver::SolverTuning;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O error while reading a config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A value parsed but is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Tunables of a [`DynamicsWorld`](crate::DynamicsWorld). Missing JSON fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Index static and trigger bodies in the spatial tree.
    pub partitioning: bool,
    /// Velocity iterations per step.
    pub velocity_iterations: u32,
    /// Position iterations per ring slot.
    pub position_iterations: u32,
    /// Steps of contacts kept for positional correction.
    pub constraint_buffer_count: usize,
    /// Resting tolerance; clamped to at least `EPSILON`.
    pub max_penetration_depth: Fix64,
    /// Vertical acceleration (negative pulls down).
    pub gravity: Fix64,
    /// Height of the ground plane.
    pub ground_height: Fix64,
    /// Positional-correction constants.
    pub solver: SolverTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            partitioning: true,
            velocity_iterations: crate::DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: crate::DEFAULT_POSITION_ITERATIONS,
            constraint_buffer_count: crate::DEFAULT_CONSTRAINT_BUFFER_COUNT,
            max_penetration_depth: crate::DEFAULT_MAX_PENETRATION_DEPTH,
            gravity: Fix64::ZERO,
            ground_height: Fix64::ZERO,
            solver: SolverTuning::DEFAULT,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects tuning values the solver cannot use. Values the world clamps
    /// silently (buffer count, penetration depth) are accepted here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.solver;
        if t.correction_scale.is_negative() || t.correction_scale > Fix64::ONE {
            return Err(ConfigError::Invalid {
                field: "solver.correction_scale",
                reason: format!("{} is outside [0, 1]", t.correction_scale),
            });
        }
        if t.correction_slop.is_negative() {
            return Err(ConfigError::Invalid {
                field: "solver.correction_slop",
                reason: format!("{} is negative", t.correction_slop),
            });
        }
        if !t.max_correction.is_positive() {
            return Err(ConfigError::Invalid {
                field: "solver.max_correction",
                reason: format!("{} must be positive", t.max_correction),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = WorldConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.velocity_iterations, 8);
        assert_eq!(config.position_iterations, 4);
        assert_eq!(config.constraint_buffer_count, 4);
    }

    #[test]
    fn partial_documents_override_fields() {
        let config =
            WorldConfig::from_json_str(r#"{ "gravity": -10.0, "solver": { "max_correction": 0.5 } }"#)
                .expect("parse");
        assert_eq!(config.gravity, Fix64::from_int(-10));
        assert_eq!(config.solver.max_correction, Fix64::HALF);
        assert_eq!(config.solver.correction_scale, SolverTuning::DEFAULT.correction_scale);
    }

    #[test]
    fn out_of_range_tuning_is_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "solver": { "correction_scale": 2.0 } }"#)
            .expect_err("scale above one");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "solver.correction_scale",
                ..
            }
        ));
        assert!(matches!(
            WorldConfig::from_json_str("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = WorldConfig::from_path("/definitely/not/here.json").expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
