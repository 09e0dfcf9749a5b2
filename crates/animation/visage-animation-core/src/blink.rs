//! Periodic blink with a triangular envelope.
//!
//! The cycle writes its shapes every tick, at 0 between blinks, and never looks
//! at what speech or idle behavior is doing.

use crate::config::BlinkConfig;
use crate::events::{AnimationEvent, DriverOutput};

const MIN_BLINK_S: f32 = 1e-3;

#[derive(Clone, Debug)]
pub struct BlinkCycle {
    cfg: BlinkConfig,
    /// Open-eye time since the last blink finished.
    since_last: f32,
    /// Seconds into the running blink, if any.
    blink_elapsed: Option<f32>,
    weight: f32,
}

impl BlinkCycle {
    pub fn new(cfg: BlinkConfig) -> Self {
        Self {
            cfg,
            since_last: 0.0,
            blink_elapsed: None,
            weight: 0.0,
        }
    }

    #[inline]
    pub fn config(&self) -> &BlinkConfig {
        &self.cfg
    }

    #[inline]
    pub fn is_blinking(&self) -> bool {
        self.blink_elapsed.is_some()
    }

    /// Envelope value written on the last tick.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    pub fn since_last(&self) -> f32 {
        self.since_last
    }

    /// Start a blink now, regardless of the interval.
    pub fn trigger(&mut self) {
        if self.blink_elapsed.is_none() {
            self.blink_elapsed = Some(0.0);
        }
    }

    pub fn tick(&mut self, dt: f32, out: &mut DriverOutput) {
        let dt = dt.max(0.0);
        let duration = self.cfg.duration_s.max(MIN_BLINK_S);

        self.weight = match self.blink_elapsed {
            Some(elapsed) => {
                let elapsed = elapsed + dt;
                if elapsed >= duration {
                    self.blink_elapsed = None;
                    self.since_last = 0.0;
                    out.emit(AnimationEvent::BlinkEnded);
                    0.0
                } else {
                    self.blink_elapsed = Some(elapsed);
                    triangle(elapsed / duration)
                }
            }
            None => {
                self.since_last += dt;
                if self.since_last >= self.cfg.interval_s {
                    self.blink_elapsed = Some(0.0);
                    out.emit(AnimationEvent::BlinkStarted);
                }
                0.0
            }
        };

        for shape in &self.cfg.shapes {
            out.weights.set(shape.as_str(), self.weight);
        }
    }
}

/// 0 → 1 over the first half, 1 → 0 over the second.
#[inline]
fn triangle(u: f32) -> f32 {
    let w = if u <= 0.5 { u / 0.5 } else { (1.0 - u) / 0.5 };
    w.clamp(0.0, 1.0)
}
