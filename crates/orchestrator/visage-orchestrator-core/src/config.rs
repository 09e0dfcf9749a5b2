//! Rig configuration: one section per component, every section optional in JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use visage_animation_core::{BlinkConfig, IdleConfig, MicroMotionConfig, SpeechConfig};
use visage_deform_core::MixerConfig;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RigConfig {
    /// Seed for idle pattern choice and micro-motion timing. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub mixer: MixerConfig,
    pub blink: BlinkConfig,
    pub idle: IdleConfig,
    pub speech: SpeechConfig,
    pub micro_motion: MicroMotionConfig,
}

impl RigConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("rig config parse error")
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
