//! Small head motions while speaking.
//!
//! A motion fires only while a settled, non-pause segment is being spoken and no
//! other head sequence is playing. Every motion drifts to base, turns out,
//! holds, turns back and holds neutral, so motions never stack or compound.

use nalgebra::UnitQuaternion;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MicroMotionConfig;
use crate::events::{AnimationEvent, DriverOutput};
use crate::interp::{pitch_deg, roll_deg, yaw_deg};
use crate::orientation::{OrientationSequencer, RelativeMove};

/// Drift-to-base, turn out, hold and turn back, as multiples of the drawn duration.
const SPLIT: [f32; 4] = [1.0, 1.0, 1.5, 1.0];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicroMotionKind {
    /// Side tilt with a slight upward nod.
    SideTilt { left: bool },
    GlanceDownLeft,
    GlanceDownRight,
}

impl MicroMotionKind {
    /// Rotation relative to base.
    pub fn rotation(self) -> UnitQuaternion<f32> {
        match self {
            MicroMotionKind::SideTilt { left } => {
                let side = if left { 1.0 } else { -1.0 };
                roll_deg(4.0 * side) * pitch_deg(-2.0)
            }
            MicroMotionKind::GlanceDownLeft => yaw_deg(-10.0) * pitch_deg(-6.0),
            MicroMotionKind::GlanceDownRight => yaw_deg(10.0) * pitch_deg(-6.0),
        }
    }

    fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..3u32) {
            0 => MicroMotionKind::SideTilt {
                left: rng.random_bool(0.5),
            },
            1 => MicroMotionKind::GlanceDownLeft,
            _ => MicroMotionKind::GlanceDownRight,
        }
    }
}

/// Uniform draw in `[lo, hi]`; a collapsed or inverted range yields `lo`.
fn draw<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

#[derive(Clone, Debug)]
pub struct SpeakingMotionScheduler {
    cfg: MicroMotionConfig,
    armed: bool,
    since_last: f32,
    next_interval: f32,
}

impl SpeakingMotionScheduler {
    pub fn new(cfg: MicroMotionConfig) -> Self {
        let next_interval = cfg.initial_interval_s;
        Self {
            cfg,
            armed: false,
            since_last: 0.0,
            next_interval,
        }
    }

    #[inline]
    pub fn config(&self) -> &MicroMotionConfig {
        &self.cfg
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[inline]
    pub fn next_interval(&self) -> f32 {
        self.next_interval
    }

    /// Start the clock with a fresh random gap; called when speech starts.
    pub fn arm<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.armed = true;
        self.since_last = 0.0;
        self.next_interval = draw(rng, self.cfg.interval_min_s, self.cfg.interval_max_s);
    }

    /// Stop the clock; called when speech ends.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.since_last = 0.0;
        self.next_interval = self.cfg.initial_interval_s;
    }

    /// Returns true when a motion was started this tick.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        eligible: bool,
        seq: &mut OrientationSequencer,
        rng: &mut R,
        out: &mut DriverOutput,
    ) -> bool {
        if self.armed {
            self.since_last += dt.max(0.0);
        }
        if !eligible || seq.is_playing() {
            return false;
        }
        if !self.armed {
            self.armed = true;
            self.since_last = 0.0;
            return false;
        }
        if self.since_last < self.next_interval {
            return false;
        }

        self.since_last = 0.0;
        let total = draw(rng, self.cfg.duration_min_s, self.cfg.duration_max_s);
        let kind = MicroMotionKind::pick(rng);
        let rel = kind.rotation();

        let [to_base, out_s, hold_s, back_s] = SPLIT.map(|w| w * total);
        let hold_neutral =
            (total - (to_base + out_s + hold_s + back_s)).max(self.cfg.min_hold_fraction * total);

        seq.start_via_base(
            to_base,
            &[
                RelativeMove::new(rel, out_s),
                RelativeMove::hold(hold_s),
                RelativeMove::new(rel.inverse(), back_s),
                RelativeMove::hold(hold_neutral),
            ],
        );
        self.next_interval = draw(rng, self.cfg.interval_min_s, self.cfg.interval_max_s);
        out.emit(AnimationEvent::MicroMotionFired {
            kind,
            duration: total,
        });
        true
    }
}
