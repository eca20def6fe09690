//! Core configuration for lilt-animation-core.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

/// Manager-wide tuning knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fade weights at or below this are treated as zero.
    pub weight_epsilon: f32,

    /// When set, a property that fails to evaluate is logged and skipped so the
    /// rest of the `apply_animations` pass still runs.
    pub isolate_errors: bool,

    /// Drop roots whose state is `Stopped` after each `apply_animations`.
    /// When unset they stay listed but no longer drive their properties.
    pub prune_completed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weight_epsilon: 1e-4,
            isolate_errors: true,
            prune_completed: true,
        }
    }
}

impl Config {
    /// Parse a (possibly partial) JSON config; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AnimationError> {
        let cfg: Config = serde_json::from_str(json)?;
        if !cfg.weight_epsilon.is_finite() || cfg.weight_epsilon < 0.0 {
            return Err(AnimationError::InvalidConfig(format!(
                "weight_epsilon must be finite and non-negative, got {}",
                cfg.weight_epsilon
            )));
        }
        Ok(cfg)
    }
}
