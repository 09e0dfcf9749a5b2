//! Mixer configuration.

use serde::{Deserialize, Serialize};

/// Naming conventions used by the blendshape mixer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixerConfig {
    /// Exact (case-sensitive) name that means "back to neutral".
    pub neutral_sentinel: String,
    /// Targets whose name contains this marker are tagged as blink shapes at load.
    /// `None` leaves every target untagged until `set_category` is called.
    pub blink_marker: Option<String>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            neutral_sentinel: "NEUTRAL".to_string(),
            blink_marker: Some("EyeBlink".to_string()),
        }
    }
}
