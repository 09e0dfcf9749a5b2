use visage_animation_core::{AnimationEvent, DriverOutput, SpeechStatus, WeightOp};
use visage_deform_core::BlendShapeMixer;

use crate::board::DriverId;
use crate::{Rig, RigEvent, RigFrame, SpeechCommand};

/// Run one tick:
///   Sequencer -> Blink -> Idle -> Speech -> MicroMotion -> Manual -> refresh -> frame
///
/// Each driver's writes reach the mixer before the next driver runs, so for a
/// given shape name the last writer in this order wins.
pub fn run_tick(rig: &mut Rig, dt: f32, audio_clock: Option<f64>) -> RigFrame {
    let dt = dt.max(0.0);
    let mut frame = RigFrame::empty(rig.epoch, dt);
    let mut out = DriverOutput::new();

    // Sequencer
    if rig.sequencer.tick(dt) {
        out.emit(AnimationEvent::SequenceFinished);
    }
    merge(rig, DriverId::Sequencer, &mut out, &mut frame);

    // Blink never looks at the other drivers
    rig.blink.tick(dt, &mut out);
    merge(rig, DriverId::Blink, &mut out, &mut frame);

    // Idle, preempted by playing or pending speech
    let speaking =
        rig.speech.is_playing() || matches!(rig.speech_command, Some(SpeechCommand::Start(_)));
    rig.idle
        .tick(dt, speaking, &mut rig.sequencer, &mut rig.rng, &mut out);
    merge(rig, DriverId::Idle, &mut out, &mut frame);

    // Speech
    let status = run_speech(rig, dt, audio_clock, &mut out);
    merge(rig, DriverId::Speech, &mut out, &mut frame);

    // Micro-motion, gated by the speech status of this tick
    rig.micro_motion.tick(
        dt,
        status.micro_motion_eligible,
        &mut rig.sequencer,
        &mut rig.rng,
        &mut out,
    );
    merge(rig, DriverId::MicroMotion, &mut out, &mut frame);

    // Manual overrides go last
    out.weights.extend(rig.manual.take());
    merge(rig, DriverId::Manual, &mut out, &mut frame);
    for preset in rig.presets.drain(..) {
        preset.apply(&mut rig.sequencer);
        frame.events.push(RigEvent::PresetApplied { preset });
    }

    frame.face_updated = rig.mixer.refresh();
    frame.body_updated = rig.pose_skeleton();
    frame.orientation = rig.sequencer.current();
    frame.speaking = rig.speech.is_playing();
    frame
}

fn run_speech(
    rig: &mut Rig,
    dt: f32,
    audio_clock: Option<f64>,
    out: &mut DriverOutput,
) -> SpeechStatus {
    let was_playing = rig.speech.is_playing();
    let mut just_started = false;

    match rig.speech_command.take() {
        Some(SpeechCommand::Start(alignment)) => {
            rig.speech.start(alignment, &mut rig.sequencer, out);
            rig.micro_motion.arm(&mut rig.rng);
            just_started = true;
        }
        Some(SpeechCommand::Stop) => {
            rig.speech.stop(&mut rig.sequencer, out);
        }
        None => {}
    }

    let status = match audio_clock {
        Some(t) => rig.speech.tick_at(t, &mut rig.sequencer, out),
        None if just_started => rig.speech.tick_at(0.0, &mut rig.sequencer, out),
        None => rig.speech.tick(dt, &mut rig.sequencer, out),
    };

    if (was_playing || just_started) && !rig.speech.is_playing() {
        rig.micro_motion.disarm();
    }
    status
}

/// Apply one driver's output to the mixer and fold it into the frame.
fn merge(rig: &mut Rig, source: DriverId, out: &mut DriverOutput, frame: &mut RigFrame) {
    for op in out.weights.take() {
        apply_op(&mut rig.mixer, &op);
        if let Some(conflict) = rig.board.record(&op, rig.epoch, source) {
            log::debug!(
                "'{}' overwritten by {} (was {} from {})",
                conflict.name,
                source.as_str(),
                conflict.previous_weight,
                conflict.previous_writer.as_str()
            );
            frame.conflicts.push(conflict);
        }
        frame.merged_writes.push(op);
    }
    frame.events.extend(
        out.events
            .drain(..)
            .map(|event| RigEvent::Driver { source, event }),
    );
}

/// Map a weight intent onto the mixer's API.
pub fn apply_op(mixer: &mut BlendShapeMixer, op: &WeightOp) {
    match op {
        WeightOp::Set { name, weight } => mixer.set_weight(name, *weight),
        WeightOp::Blend { name, weight } => mixer.set_blend(name, *weight),
        WeightOp::Neutral => mixer.clear_weights(true),
        WeightOp::Clear { keep_tagged } => mixer.clear_weights(*keep_tagged),
    }
}
