use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::shake::SHAKE_DURATION_MS;

/// Fixed behavior constants, overridable from a JSON file. All fields
/// default independently so a partial file stays valid across versions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Feedback shake length. Fixed per configuration, never derived from
    /// input.
    pub shake_duration_ms: f32,
    /// Peak horizontal offset of the feedback shake.
    pub shake_magnitude: f32,
    /// How long a resolved object stays materialized past its judgment.
    pub retention_tail_ms: f32,
    /// How far ahead of `visible_from` the working set materializes objects.
    pub materialize_margin_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            shake_duration_ms: SHAKE_DURATION_MS,
            shake_magnitude: 8.0,
            retention_tail_ms: 800.0,
            materialize_margin_ms: 0.0,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file, falling back to defaults (with a
    /// warning) when the file is missing or malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Tuning {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read {}: {e}; using default tuning.", path.display());
                return Tuning::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to parse {}: {e}; using default tuning.", path.display());
                Tuning::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
