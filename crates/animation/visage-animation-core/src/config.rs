//! Driver configuration. Defaults carry the tuned values of the head rig.

use serde::{Deserialize, Serialize};

/// Periodic eye blink.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlinkConfig {
    /// Seconds of open eyes between blinks.
    pub interval_s: f32,
    /// Length of one blink (close + open).
    pub duration_s: f32,
    /// Shapes driven with the blink envelope, usually left and right lids.
    pub shapes: Vec<String>,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            interval_s: 3.0,
            duration_s: 0.16,
            shapes: vec!["EyeBlink_L".to_string(), "EyeBlink_R".to_string()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdleConfig {
    /// Seconds between idle decisions; see [`IdleConfig::interval`].
    pub interval_s: f32,
}

impl IdleConfig {
    pub const MIN_INTERVAL_S: f32 = 2.0;
    pub const MAX_INTERVAL_S: f32 = 10.0;

    /// Decision interval clamped to the supported range.
    pub fn interval(&self) -> f32 {
        self.interval_s
            .clamp(Self::MIN_INTERVAL_S, Self::MAX_INTERVAL_S)
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { interval_s: 4.0 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Fraction of each segment spent fading in (and again fading out).
    pub ramp_fraction: f64,
    /// Segment shape that marks a pause. The empty name is always a pause too.
    pub pause_shape: String,
    pub pause_pitch_deg: f32,
    /// Side tilt on pause entry; the sign alternates between pauses.
    pub pause_roll_deg: f32,
    pub pause_tilt_s: f32,
    pub pause_return_s: f32,
    /// Return-to-base time when playback ends or is stopped.
    pub end_return_s: f32,
    /// Return-to-base time when playback starts.
    pub start_return_s: f32,
    /// Shapes idle patterns may have left behind; zeroed on start and stop.
    pub emotive_shapes: Vec<String>,
}

impl SpeechConfig {
    pub const MAX_RAMP_FRACTION: f64 = 0.5;

    pub fn ramp(&self) -> f64 {
        self.ramp_fraction.clamp(0.0, Self::MAX_RAMP_FRACTION)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            ramp_fraction: 0.3,
            pause_shape: "NEUTRAL".to_string(),
            pause_pitch_deg: 6.0,
            pause_roll_deg: 3.5,
            pause_tilt_s: 0.25,
            pause_return_s: 0.35,
            end_return_s: 0.35,
            start_return_s: 0.25,
            emotive_shapes: ["Smile", "MouthDimple_L", "Frown", "EyesRight", "EyesLeft", "AA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Small head motions played while speaking.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MicroMotionConfig {
    pub interval_min_s: f32,
    pub interval_max_s: f32,
    /// Gap used before the first randomized interval is drawn.
    pub initial_interval_s: f32,
    pub duration_min_s: f32,
    pub duration_max_s: f32,
    /// Floor for the closing neutral hold, as a fraction of the motion's duration.
    pub min_hold_fraction: f32,
}

impl Default for MicroMotionConfig {
    fn default() -> Self {
        Self {
            interval_min_s: 1.0,
            interval_max_s: 2.5,
            initial_interval_s: 1.5,
            duration_min_s: 0.6,
            duration_max_s: 1.2,
            min_hold_fraction: 0.05,
        }
    }
}
