//! Semantic signals emitted by the drivers during a tick.

use serde::{Deserialize, Serialize};

use crate::alignment::Emotion;
use crate::idle::IdlePattern;
use crate::micro_motion::MicroMotionKind;
use crate::weights::WeightBatch;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationEvent {
    BlinkStarted,
    BlinkEnded,
    IdleStarted {
        pattern: IdlePattern,
    },
    IdleFinished {
        pattern: IdlePattern,
    },
    /// Speech took over mid-pattern; shapes and head were left as they were.
    IdlePreempted {
        pattern: IdlePattern,
        phase: usize,
    },
    SpeechStarted {
        segments: usize,
        duration: f64,
        emotion: Emotion,
    },
    SpeechEnded {
        /// True when cut short by an explicit stop.
        stopped: bool,
    },
    PauseEntered {
        segment: usize,
    },
    PauseExited {
        segment: usize,
    },
    MicroMotionFired {
        kind: MicroMotionKind,
        duration: f32,
    },
    SequenceFinished,
}

/// What one driver produced this tick.
#[derive(Clone, Debug, Default)]
pub struct DriverOutput {
    pub weights: WeightBatch,
    pub events: Vec<AnimationEvent>,
}

impl DriverOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: AnimationEvent) {
        log::debug!("{event:?}");
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.weights.clear_ops();
        self.events.clear();
    }
}
