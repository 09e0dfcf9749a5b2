//! visage-orchestrator
//!
//! The rig owns the face mixer, the head sequencer, every driver and an
//! optional skinned body. [`Rig::step`] runs one tick in a fixed order (see
//! [`scheduler::run_tick`]) and reports the result as a [`RigFrame`]. Host
//! commands (manual weights, presets, speech start/stop) are queued and take
//! effect on the next tick.

pub mod board;
pub mod config;
pub mod scheduler;

use anyhow::{anyhow, Context, Result};
use nalgebra::UnitQuaternion;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use visage_animation_core::{
    Alignment, AnimationEvent, BlinkCycle, HeadPreset, IdleBehavior, OrientationSequencer,
    SpeakingMotionScheduler, SpeechAlignmentDriver, WeightBatch,
};
use visage_deform_core::{BlendShapeMixer, Position, SkeletalSkinner};

pub use crate::board::{DriverId, WeightBoard, WeightConflict, WeightEntry};
pub use crate::config::RigConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RigEvent {
    /// Something a driver reported during the tick.
    Driver {
        source: DriverId,
        event: AnimationEvent,
    },
    PresetApplied {
        preset: HeadPreset,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFrame {
    pub epoch: u64,
    pub dt: f32,
    /// Head orientation after this tick.
    pub orientation: UnitQuaternion<f32>,
    pub speaking: bool,
    /// Every weight op applied this tick, in tick order.
    pub merged_writes: WeightBatch,
    pub conflicts: Vec<WeightConflict>,
    pub events: Vec<RigEvent>,
    /// Face positions and normals were rebuilt.
    pub face_updated: bool,
    /// The skinned body was re-posed.
    pub body_updated: bool,
}

impl RigFrame {
    fn empty(epoch: u64, dt: f32) -> Self {
        Self {
            epoch,
            dt,
            orientation: UnitQuaternion::identity(),
            speaking: false,
            merged_writes: WeightBatch::new(),
            conflicts: Vec::new(),
            events: Vec::new(),
            face_updated: false,
            body_updated: false,
        }
    }
}

#[derive(Debug)]
pub(crate) enum SpeechCommand {
    Start(Alignment),
    Stop,
}

#[derive(Debug)]
pub struct Rig {
    pub mixer: BlendShapeMixer,
    pub sequencer: OrientationSequencer,
    pub blink: BlinkCycle,
    pub idle: IdleBehavior,
    pub speech: SpeechAlignmentDriver,
    pub micro_motion: SpeakingMotionScheduler,
    pub skinner: Option<SkeletalSkinner>,
    pub board: WeightBoard,
    pub epoch: u64,

    pub(crate) rng: StdRng,
    pub(crate) manual: WeightBatch,
    pub(crate) presets: Vec<HeadPreset>,
    pub(crate) speech_command: Option<SpeechCommand>,
    skeleton_dirty: bool,
}

impl Rig {
    /// Rig over an existing mixer; `config.mixer` is ignored.
    pub fn with_mixer(config: RigConfig, mixer: BlendShapeMixer) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        log::info!(
            "rig ready (#vertices = {}, #shapes = {}, seeded = {})",
            mixer.vertex_count(),
            mixer.available_names().len(),
            config.seed.is_some()
        );
        Self {
            mixer,
            sequencer: OrientationSequencer::default(),
            blink: BlinkCycle::new(config.blink),
            idle: IdleBehavior::new(config.idle),
            speech: SpeechAlignmentDriver::new(config.speech),
            micro_motion: SpeakingMotionScheduler::new(config.micro_motion),
            skinner: None,
            board: WeightBoard::new(),
            epoch: 0,
            rng,
            manual: WeightBatch::new(),
            presets: Vec::new(),
            speech_command: None,
            skeleton_dirty: false,
        }
    }

    /// Rig over a bare mesh: no blendshape targets, the mesh is the basis.
    pub fn from_mesh(config: RigConfig, positions: Vec<Position>, indices: Vec<u32>) -> Self {
        let mixer = BlendShapeMixer::new(config.mixer.clone(), positions, indices, None);
        Self::with_mixer(config, mixer)
    }

    /// Load a blendshape document; any load error is returned.
    pub fn load(
        config: RigConfig,
        positions: Vec<Position>,
        indices: Vec<u32>,
        blendshape_json: &str,
    ) -> Result<Self> {
        let mixer =
            BlendShapeMixer::from_json(config.mixer.clone(), positions, indices, blendshape_json)
                .context("blendshape document")?;
        Ok(Self::with_mixer(config, mixer))
    }

    /// Load a blendshape document, falling back to the bare mesh on error.
    pub fn load_or_fallback(
        config: RigConfig,
        positions: Vec<Position>,
        indices: Vec<u32>,
        blendshape_json: &str,
    ) -> Self {
        let mixer = BlendShapeMixer::load_or_fallback(
            config.mixer.clone(),
            positions,
            indices,
            blendshape_json,
        );
        Self::with_mixer(config, mixer)
    }

    pub fn attach_skinner(&mut self, skinner: SkeletalSkinner) {
        self.skinner = Some(skinner);
        self.skeleton_dirty = false;
    }

    /// Build a skinner from skeleton and attachment text. On error the rig
    /// keeps its current skinner (or none).
    pub fn load_skeleton(
        &mut self,
        skeleton_text: &str,
        attachment_text: &str,
        bind_positions: Vec<Position>,
        indices: Vec<u32>,
    ) -> Result<()> {
        match SkeletalSkinner::from_text(skeleton_text, attachment_text, bind_positions, indices) {
            Ok(skinner) => {
                self.attach_skinner(skinner);
                Ok(())
            }
            Err(e) => {
                log::warn!("skinning disabled: {e}");
                Err(anyhow::Error::new(e).context("skeleton load"))
            }
        }
    }

    /// Advance one tick on the internal speech clock.
    pub fn step(&mut self, dt: f32) -> RigFrame {
        self.epoch = self.epoch.wrapping_add(1);
        scheduler::run_tick(self, dt, None)
    }

    /// Advance one tick with speech following the audio device's clock `t`.
    pub fn step_with_audio_clock(&mut self, dt: f32, t: f64) -> RigFrame {
        self.epoch = self.epoch.wrapping_add(1);
        scheduler::run_tick(self, dt, Some(t))
    }

    /// True while speech plays or is about to start.
    pub fn is_speaking(&self) -> bool {
        match self.speech_command {
            Some(SpeechCommand::Start(_)) => true,
            Some(SpeechCommand::Stop) => false,
            None => self.speech.is_playing(),
        }
    }

    /// Start speaking `alignment` on the next tick, replacing any line in progress.
    pub fn start_speech(&mut self, alignment: Alignment) {
        self.speech_command = Some(SpeechCommand::Start(alignment));
    }

    pub fn start_speech_json(&mut self, json: &str) -> Result<()> {
        let alignment = Alignment::from_json(json).context("alignment document")?;
        self.start_speech(alignment);
        Ok(())
    }

    pub fn stop_speech(&mut self) {
        self.speech_command = Some(SpeechCommand::Stop);
    }

    /// Additive manual weight, applied after every driver.
    pub fn set_weight(&mut self, name: &str, weight: f32) {
        self.manual.set(name, weight);
    }

    /// Exclusive manual weight: clears everything else first.
    pub fn set_blend(&mut self, name: &str, weight: f32) {
        self.manual.blend(name, weight);
    }

    pub fn clear_weights(&mut self, keep_tagged: bool) {
        self.manual.clear(keep_tagged);
    }

    pub fn apply_preset(&mut self, preset: HeadPreset) {
        self.presets.push(preset);
    }

    pub fn apply_preset_named(&mut self, name: &str) -> Result<()> {
        let preset =
            HeadPreset::from_name(name).ok_or_else(|| anyhow!("unknown head preset '{name}'"))?;
        self.apply_preset(preset);
        Ok(())
    }

    pub fn trigger_blink(&mut self) {
        self.blink.trigger();
    }

    pub fn set_base_orientation(&mut self, base: UnitQuaternion<f32>) {
        self.sequencer.set_base(base);
    }

    /// Euler angles in radians. Returns false without a skinner or for an
    /// out-of-range joint.
    pub fn set_joint_euler(&mut self, joint: usize, rx: f32, ry: f32, rz: f32) -> bool {
        let changed = self
            .skinner
            .as_mut()
            .is_some_and(|s| s.set_joint_euler(joint, rx, ry, rz));
        self.skeleton_dirty |= changed;
        changed
    }

    pub fn set_joint_rotation(&mut self, joint: usize, rotation: UnitQuaternion<f32>) -> bool {
        let changed = self
            .skinner
            .as_mut()
            .is_some_and(|s| s.set_joint_rotation(joint, rotation));
        self.skeleton_dirty |= changed;
        changed
    }

    /// Re-skin the body if any joint changed. Returns whether it did.
    pub fn pose_skeleton(&mut self) -> bool {
        if !self.skeleton_dirty {
            return false;
        }
        self.skeleton_dirty = false;
        match self.skinner.as_mut() {
            Some(skinner) => {
                skinner.on_joints_changed();
                true
            }
            None => false,
        }
    }
}
