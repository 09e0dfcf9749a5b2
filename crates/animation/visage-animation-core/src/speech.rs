//! Drives mouth shapes from an alignment and the audio playback clock.
//!
//! Each tick looks up the segment under the clock and writes its shape with a
//! trapezoidal envelope. Pause segments and gaps write neutral instead. Pause
//! entry nods the head slightly, alternating sides; pause exit returns to base.

use crate::alignment::Alignment;
use crate::config::SpeechConfig;
use crate::events::{AnimationEvent, DriverOutput};
use crate::interp::{pitch_deg, roll_deg};
use crate::orientation::OrientationSequencer;

/// Shortest window used when computing progress inside a segment.
const MIN_SEGMENT_INTERVAL: f64 = 1e-4;

/// Fade in over the first `ramp` of the segment, hold, fade out over the last `ramp`.
pub fn segment_envelope(u: f64, ramp: f64) -> f64 {
    let alpha = if u < ramp {
        u / ramp
    } else if u > 1.0 - ramp {
        (1.0 - u) / ramp
    } else {
        1.0
    };
    alpha.clamp(0.0, 1.0)
}

/// What the driver did this tick; read by the rig to gate micro-motions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpeechStatus {
    pub speaking: bool,
    pub in_pause: bool,
    /// Speaking a settled (not just resumed) non-pause segment.
    pub micro_motion_eligible: bool,
    pub segment: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct SpeechAlignmentDriver {
    cfg: SpeechConfig,
    alignment: Option<Alignment>,
    playing: bool,
    clock: f64,
    last_index: Option<usize>,
    /// Non-pause shape written by the previous segment.
    last_shape: Option<String>,
    in_pause: bool,
    tilt_toggle: bool,
}

impl SpeechAlignmentDriver {
    pub fn new(cfg: SpeechConfig) -> Self {
        Self {
            cfg,
            alignment: None,
            playing: false,
            clock: 0.0,
            last_index: None,
            last_shape: None,
            in_pause: false,
            tilt_toggle: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &SpeechConfig {
        &self.cfg
    }

    pub fn set_ramp_fraction(&mut self, ramp: f64) {
        self.cfg.ramp_fraction = ramp;
    }

    #[inline]
    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Audio time of the last tick.
    #[inline]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Load `alignment` and begin playback at t = 0.
    ///
    /// Emotive shapes are zeroed, the face goes neutral and the head eases back
    /// to base.
    pub fn start(
        &mut self,
        alignment: Alignment,
        seq: &mut OrientationSequencer,
        out: &mut DriverOutput,
    ) {
        self.alignment = Some(alignment);
        self.restart(seq, out);
    }

    /// Replay the loaded alignment from t = 0. Returns false if none is loaded.
    pub fn restart(&mut self, seq: &mut OrientationSequencer, out: &mut DriverOutput) -> bool {
        let Some(alignment) = self.alignment.as_ref() else {
            log::warn!("speech start ignored: no alignment loaded");
            return false;
        };
        let started = AnimationEvent::SpeechStarted {
            segments: alignment.len(),
            duration: alignment.duration(),
            emotion: alignment.emotion,
        };

        self.zero_emotive(out);
        out.weights.neutral();
        seq.return_to_base(self.cfg.start_return_s);

        self.reset_bookkeeping();
        self.playing = true;
        self.clock = 0.0;
        out.emit(started);
        true
    }

    /// Cut playback short. Returns false if nothing was playing.
    pub fn stop(&mut self, seq: &mut OrientationSequencer, out: &mut DriverOutput) -> bool {
        if !self.playing {
            return false;
        }
        self.finish(true, seq, out);
        true
    }

    /// Advance the internal clock by `dt` and drive the shapes.
    pub fn tick(
        &mut self,
        dt: f32,
        seq: &mut OrientationSequencer,
        out: &mut DriverOutput,
    ) -> SpeechStatus {
        if !self.playing {
            return SpeechStatus::default();
        }
        let t = self.clock + f64::from(dt.max(0.0));
        self.tick_at(t, seq, out)
    }

    /// Drive the shapes for audio time `t`, as reported by the audio device.
    pub fn tick_at(
        &mut self,
        t: f64,
        seq: &mut OrientationSequencer,
        out: &mut DriverOutput,
    ) -> SpeechStatus {
        if !self.playing {
            return SpeechStatus::default();
        }
        let Some(alignment) = self.alignment.as_ref() else {
            self.playing = false;
            return SpeechStatus::default();
        };
        self.clock = t;

        if t >= alignment.duration() {
            self.finish(false, seq, out);
            return SpeechStatus::default();
        }

        let Some((index, seg)) = alignment.segment_at(t).map(|(i, s)| (i, s.clone())) else {
            // gap between segments
            out.weights.neutral();
            self.last_shape = None;
            return SpeechStatus {
                speaking: true,
                in_pause: self.in_pause,
                micro_motion_eligible: false,
                segment: None,
            };
        };

        let pause = seg.is_pause(&self.cfg.pause_shape);
        if self.last_index != Some(index) {
            if let Some(prev) = self.last_shape.take() {
                if prev != seg.shape {
                    out.weights.set(prev, 0.0);
                }
            }
            self.last_index = Some(index);
        }

        let mut eligible = false;
        if pause {
            out.weights.neutral();
            self.last_shape = None;
            if !self.in_pause {
                self.in_pause = true;
                self.tilt_toggle = !self.tilt_toggle;
                let side = if self.tilt_toggle { 1.0 } else { -1.0 };
                let rel = roll_deg(self.cfg.pause_roll_deg * side) * pitch_deg(self.cfg.pause_pitch_deg);
                seq.start_single(rel, self.cfg.pause_tilt_s);
                out.emit(AnimationEvent::PauseEntered { segment: index });
            }
        } else {
            let interval = (seg.end - seg.start).max(MIN_SEGMENT_INTERVAL);
            let u = (t - seg.start) / interval;
            let alpha = segment_envelope(u, self.cfg.ramp()) as f32;
            out.weights.set(seg.shape.as_str(), alpha);
            self.last_shape = Some(seg.shape);

            if self.in_pause {
                self.in_pause = false;
                seq.return_to_base(self.cfg.pause_return_s);
                out.emit(AnimationEvent::PauseExited { segment: index });
            } else {
                eligible = true;
            }
        }

        SpeechStatus {
            speaking: true,
            in_pause: self.in_pause,
            micro_motion_eligible: eligible,
            segment: Some(index),
        }
    }

    fn finish(&mut self, stopped: bool, seq: &mut OrientationSequencer, out: &mut DriverOutput) {
        out.weights.neutral();
        if stopped {
            self.zero_emotive(out);
        }
        self.playing = false;
        self.reset_bookkeeping();
        seq.return_to_base(self.cfg.end_return_s);
        out.emit(AnimationEvent::SpeechEnded { stopped });
    }

    fn zero_emotive(&self, out: &mut DriverOutput) {
        for name in &self.cfg.emotive_shapes {
            out.weights.set(name.as_str(), 0.0);
        }
    }

    fn reset_bookkeeping(&mut self) {
        self.last_index = None;
        self.last_shape = None;
        self.in_pause = false;
        self.tilt_toggle = false;
    }
}
