//! Idle behavior: short randomized head-and-face patterns between speech.
//!
//! Each pattern is a fixed table of phases. A phase may start a head motion when
//! it is entered, zero some shapes, and ramp shapes linearly over its duration.
//! Every pattern's last phase ramps its shapes to 0 and returns the head to
//! base, so a completed pattern leaves no trace.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::IdleConfig;
use crate::events::{AnimationEvent, DriverOutput};
use crate::interp::{lerp_f32, pitch_deg, roll_deg, yaw_deg};
use crate::orientation::OrientationSequencer;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlePattern {
    /// Gentle tilt with a smile.
    SmileTilt,
    /// Dimple, glance left then right, small frown.
    DimpleGlance,
    /// Eyes sweep right to left, then a small downward sigh.
    EyeSweep,
}

impl IdlePattern {
    pub const ALL: [IdlePattern; 3] = [
        IdlePattern::SmileTilt,
        IdlePattern::DimpleGlance,
        IdlePattern::EyeSweep,
    ];

    fn phases(self) -> &'static [Phase] {
        match self {
            IdlePattern::SmileTilt => SMILE_TILT,
            IdlePattern::DimpleGlance => DIMPLE_GLANCE,
            IdlePattern::EyeSweep => EYE_SWEEP,
        }
    }

    pub fn phase_count(self) -> usize {
        self.phases().len()
    }

    /// Nominal length of the whole pattern in seconds.
    pub fn duration(self) -> f32 {
        self.phases().iter().map(|p| p.duration).sum()
    }

    /// Every shape the pattern writes.
    pub fn shapes(self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .phases()
            .iter()
            .flat_map(|p| p.ramps.iter().map(|r| r.name).chain(p.zero_on_enter.iter().copied()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum HeadCue {
    Still,
    /// Relative turn `yaw * roll * pitch` in degrees. With `random_side` the roll
    /// sign is drawn on entry.
    Turn {
        pitch: f32,
        yaw: f32,
        roll: f32,
        random_side: bool,
        duration: f32,
    },
    ReturnToBase {
        duration: f32,
    },
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct ShapeRamp {
    name: &'static str,
    from: f32,
    to: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Phase {
    duration: f32,
    head: HeadCue,
    zero_on_enter: &'static [&'static str],
    ramps: &'static [ShapeRamp],
}

const fn ramp(name: &'static str, from: f32, to: f32) -> ShapeRamp {
    ShapeRamp { name, from, to }
}

const fn hold(duration: f32) -> Phase {
    Phase {
        duration,
        head: HeadCue::Still,
        zero_on_enter: &[],
        ramps: &[],
    }
}

const fn turn(pitch: f32, yaw: f32, roll: f32, random_side: bool, duration: f32) -> HeadCue {
    HeadCue::Turn {
        pitch,
        yaw,
        roll,
        random_side,
        duration,
    }
}

const SMILE_TILT: &[Phase] = &[
    Phase {
        duration: 0.4,
        head: turn(4.0, 0.0, 3.0, true, 0.4),
        zero_on_enter: &[],
        ramps: &[ramp("Smile", 0.0, 0.6)],
    },
    hold(0.6),
    Phase {
        duration: 0.4,
        head: HeadCue::ReturnToBase { duration: 0.4 },
        zero_on_enter: &[],
        ramps: &[ramp("Smile", 0.6, 0.0)],
    },
];

const DIMPLE_GLANCE: &[Phase] = &[
    Phase {
        duration: 0.35,
        head: turn(0.0, 10.0, 0.0, false, 0.35),
        zero_on_enter: &[],
        ramps: &[ramp("MouthDimple_L", 0.0, 0.6)],
    },
    hold(0.45),
    Phase {
        duration: 0.45,
        head: turn(0.0, -20.0, 0.0, false, 0.45),
        zero_on_enter: &[],
        ramps: &[],
    },
    Phase {
        duration: 0.4,
        head: HeadCue::ReturnToBase { duration: 0.4 },
        zero_on_enter: &[],
        ramps: &[ramp("MouthDimple_L", 0.6, 0.0), ramp("Frown", 0.0, 0.25)],
    },
    hold(0.8),
    Phase {
        duration: 0.3,
        head: HeadCue::Still,
        zero_on_enter: &[],
        ramps: &[ramp("Frown", 0.25, 0.0)],
    },
];

const EYE_SWEEP: &[Phase] = &[
    Phase {
        duration: 0.3,
        head: HeadCue::Still,
        zero_on_enter: &[],
        ramps: &[ramp("EyesRight", 0.0, 0.6)],
    },
    hold(0.4),
    Phase {
        duration: 0.35,
        head: HeadCue::Still,
        zero_on_enter: &[],
        ramps: &[ramp("EyesRight", 0.6, 0.0), ramp("EyesLeft", 0.0, 0.6)],
    },
    hold(0.4),
    Phase {
        duration: 0.8,
        head: turn(6.0, 0.0, 0.0, false, 0.35),
        zero_on_enter: &["EyesRight", "EyesLeft"],
        ramps: &[ramp("AA", 0.0, 0.35)],
    },
    Phase {
        duration: 0.45,
        head: HeadCue::ReturnToBase { duration: 0.45 },
        zero_on_enter: &[],
        ramps: &[ramp("AA", 0.35, 0.0)],
    },
];

/// Progress through one pattern.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActivePattern {
    pub pattern: IdlePattern,
    pub phase: usize,
    /// Seconds since the phase began.
    pub phase_elapsed: f32,
    /// Whether the phase's entry actions (head cue, zeroing) have run.
    pub phase_started: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum IdleState {
    #[default]
    Inactive,
    Active(ActivePattern),
}

#[derive(Clone, Debug)]
pub struct IdleBehavior {
    cfg: IdleConfig,
    state: IdleState,
    /// Time since a pattern was last chosen or finished.
    since_decision: f32,
}

impl IdleBehavior {
    pub fn new(cfg: IdleConfig) -> Self {
        Self {
            cfg,
            state: IdleState::Inactive,
            since_decision: 0.0,
        }
    }

    #[inline]
    pub fn config(&self) -> &IdleConfig {
        &self.cfg
    }

    pub fn set_interval(&mut self, interval_s: f32) {
        self.cfg.interval_s = interval_s;
    }

    #[inline]
    pub fn state(&self) -> IdleState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, IdleState::Active(_))
    }

    pub fn pattern(&self) -> Option<IdlePattern> {
        match self.state {
            IdleState::Active(a) => Some(a.pattern),
            IdleState::Inactive => None,
        }
    }

    #[inline]
    pub fn since_decision(&self) -> f32 {
        self.since_decision
    }

    /// Advance one tick.
    ///
    /// While `speaking`, any running pattern is dropped on the spot without
    /// restoring its shapes or the head. The decision timer keeps running.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        speaking: bool,
        seq: &mut OrientationSequencer,
        rng: &mut R,
        out: &mut DriverOutput,
    ) {
        let dt = dt.max(0.0);
        self.since_decision += dt;

        if speaking {
            self.preempt(out);
            return;
        }

        match self.state {
            IdleState::Inactive => {
                if self.since_decision < self.cfg.interval() {
                    return;
                }
                let pattern = IdlePattern::ALL[rng.random_range(0..IdlePattern::ALL.len())];
                self.start_pattern(pattern, seq, rng, out);
            }
            IdleState::Active(_) => self.advance(dt, seq, rng, out),
        }
    }

    /// Enter `pattern` at phase 0 now, replacing any running pattern.
    pub fn start_pattern<R: Rng + ?Sized>(
        &mut self,
        pattern: IdlePattern,
        seq: &mut OrientationSequencer,
        rng: &mut R,
        out: &mut DriverOutput,
    ) {
        self.since_decision = 0.0;
        self.state = IdleState::Active(ActivePattern {
            pattern,
            phase: 0,
            phase_elapsed: 0.0,
            phase_started: false,
        });
        out.emit(AnimationEvent::IdleStarted { pattern });
        self.advance(0.0, seq, rng, out);
    }

    /// Force Inactive, discarding any in-progress pattern.
    pub fn preempt(&mut self, out: &mut DriverOutput) {
        if let IdleState::Active(a) = self.state {
            self.state = IdleState::Inactive;
            out.emit(AnimationEvent::IdlePreempted {
                pattern: a.pattern,
                phase: a.phase,
            });
        }
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        seq: &mut OrientationSequencer,
        rng: &mut R,
        out: &mut DriverOutput,
    ) {
        let IdleState::Active(mut a) = self.state else {
            return;
        };
        let phases = a.pattern.phases();

        if a.phase_started {
            a.phase_elapsed += dt;
        }
        let Some(phase) = phases.get(a.phase) else {
            self.finish(a.pattern, out);
            return;
        };
        if !a.phase_started {
            enter(phase, seq, rng, out);
            a.phase_started = true;
        }

        let u = (a.phase_elapsed / phase.duration).min(1.0);
        write_ramps(phase, u, out);

        if a.phase_elapsed >= phase.duration {
            a.phase += 1;
            a.phase_elapsed = 0.0;
            a.phase_started = false;
            match phases.get(a.phase) {
                Some(next) => {
                    enter(next, seq, rng, out);
                    a.phase_started = true;
                    write_ramps(next, 0.0, out);
                }
                None => {
                    self.finish(a.pattern, out);
                    return;
                }
            }
        }
        self.state = IdleState::Active(a);
    }

    fn finish(&mut self, pattern: IdlePattern, out: &mut DriverOutput) {
        self.state = IdleState::Inactive;
        self.since_decision = 0.0;
        out.emit(AnimationEvent::IdleFinished { pattern });
    }
}

fn enter<R: Rng + ?Sized>(
    phase: &Phase,
    seq: &mut OrientationSequencer,
    rng: &mut R,
    out: &mut DriverOutput,
) {
    for name in phase.zero_on_enter {
        out.weights.set(*name, 0.0);
    }
    match phase.head {
        HeadCue::Still => {}
        HeadCue::Turn {
            pitch,
            yaw,
            roll,
            random_side,
            duration,
        } => {
            let side = if random_side && rng.random_bool(0.5) {
                -1.0
            } else {
                1.0
            };
            let rel = yaw_deg(yaw) * roll_deg(roll * side) * pitch_deg(pitch);
            seq.start_single(rel, duration);
        }
        HeadCue::ReturnToBase { duration } => seq.return_to_base(duration),
    }
}

fn write_ramps(phase: &Phase, u: f32, out: &mut DriverOutput) {
    for r in phase.ramps {
        out.weights.set(r.name, lerp_f32(r.from, r.to, u));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn waits_for_interval() {
        let mut idle = IdleBehavior::new(IdleConfig { interval_s: 2.0 });
        let mut seq = OrientationSequencer::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = DriverOutput::new();
        idle.tick(1.5, false, &mut seq, &mut rng, &mut out);
        assert!(!idle.is_active());
        idle.tick(0.5, false, &mut seq, &mut rng, &mut out);
        assert!(idle.is_active());
        assert_eq!(idle.since_decision(), 0.0);
        assert!(matches!(out.events[0], AnimationEvent::IdleStarted { .. }));
    }

    #[test]
    fn entry_starts_head_motion_and_first_ramp() {
        let mut idle = IdleBehavior::new(IdleConfig::default());
        let mut seq = OrientationSequencer::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut out = DriverOutput::new();
        idle.start_pattern(IdlePattern::SmileTilt, &mut seq, &mut rng, &mut out);
        assert!(seq.is_playing());
        assert_eq!(out.weights.last_set("Smile"), Some(0.0));

        out.clear();
        idle.tick(0.2, false, &mut seq, &mut rng, &mut out);
        let w = out.weights.last_set("Smile").unwrap();
        assert!((w - 0.3).abs() < 1e-6);
    }

    #[test]
    fn shapes_listed_per_pattern() {
        assert_eq!(IdlePattern::SmileTilt.shapes(), vec!["Smile"]);
        assert_eq!(
            IdlePattern::EyeSweep.shapes(),
            vec!["AA", "EyesLeft", "EyesRight"]
        );
        assert!((IdlePattern::DimpleGlance.duration() - 2.75).abs() < 1e-5);
    }

    #[test]
    fn speaking_preempts_without_cleanup() {
        let mut idle = IdleBehavior::new(IdleConfig::default());
        let mut seq = OrientationSequencer::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut out = DriverOutput::new();
        idle.start_pattern(IdlePattern::DimpleGlance, &mut seq, &mut rng, &mut out);
        idle.tick(0.1, false, &mut seq, &mut rng, &mut out);

        out.clear();
        idle.tick(0.016, true, &mut seq, &mut rng, &mut out);
        assert_eq!(idle.state(), IdleState::Inactive);
        assert!(out.weights.is_empty());
        assert_eq!(
            out.events,
            vec![AnimationEvent::IdlePreempted {
                pattern: IdlePattern::DimpleGlance,
                phase: 0
            }]
        );
    }
}
