//! Visage Animation Core (engine-agnostic)
//!
//! Tick-driven timing for the talking head: an eased orientation sequencer and
//! the drivers that feed it and the face (blink, idle patterns, speech
//! alignment, speaking micro-motions). Drivers emit weight intents and events
//! into a [`DriverOutput`]; applying them to a mesh is the caller's job.
//! Randomness is always injected, so a seeded RNG gives reproducible runs.

pub mod alignment;
pub mod blink;
pub mod config;
pub mod events;
pub mod idle;
pub mod interp;
pub mod micro_motion;
pub mod orientation;
pub mod presets;
pub mod speech;
pub mod weights;

// Re-exports for consumers (rig, hosts)
pub use alignment::{Alignment, AlignmentError, AlignmentSegment, Emotion};
pub use blink::BlinkCycle;
pub use config::{BlinkConfig, IdleConfig, MicroMotionConfig, SpeechConfig};
pub use events::{AnimationEvent, DriverOutput};
pub use idle::{ActivePattern, IdleBehavior, IdlePattern, IdleState};
pub use micro_motion::{MicroMotionKind, SpeakingMotionScheduler};
pub use orientation::{OrientationSegment, OrientationSequencer, RelativeMove, MIN_SEGMENT_S};
pub use presets::HeadPreset;
pub use speech::{segment_envelope, SpeechAlignmentDriver, SpeechStatus};
pub use weights::{WeightBatch, WeightOp};
