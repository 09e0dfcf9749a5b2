//! Eased playback of queued head rotations.
//!
//! A sequence is a list of relative moves. `start` resolves them against the
//! orientation current at that moment into absolute (start, end) pairs, so
//! playback never re-derives targets from a moving head and timing drift cannot
//! accumulate across segments.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::interp::{ease_out_cubic, slerp};

/// Shortest segment duration; keeps the progress division finite.
pub const MIN_SEGMENT_S: f32 = 0.001;

/// Rotation applied on top of the previous segment's end.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeMove {
    pub rotation: UnitQuaternion<f32>,
    pub duration: f32,
}

impl RelativeMove {
    pub fn new(rotation: UnitQuaternion<f32>, duration: f32) -> Self {
        Self { rotation, duration }
    }

    /// Keep the current orientation for `duration`.
    pub fn hold(duration: f32) -> Self {
        Self::new(UnitQuaternion::identity(), duration)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationSegment {
    pub start: UnitQuaternion<f32>,
    pub end: UnitQuaternion<f32>,
    pub duration: f32,
}

/// Which side relative moves are composed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Frame {
    /// `end = start * rel`: the move is expressed in the head's own frame.
    Local,
    /// `end = rel * start`: the move is expressed in the parent frame.
    Parent,
}

#[derive(Clone, Debug)]
pub struct OrientationSequencer {
    base: UnitQuaternion<f32>,
    current: UnitQuaternion<f32>,
    segments: Vec<OrientationSegment>,
    index: usize,
    elapsed: f32,
    playing: bool,
}

impl Default for OrientationSequencer {
    fn default() -> Self {
        Self::new(UnitQuaternion::identity())
    }
}

impl OrientationSequencer {
    /// Start idle at `base`, the rest orientation every return targets.
    pub fn new(base: UnitQuaternion<f32>) -> Self {
        Self {
            base,
            current: base,
            segments: Vec::new(),
            index: 0,
            elapsed: 0.0,
            playing: false,
        }
    }

    #[inline]
    pub fn base(&self) -> UnitQuaternion<f32> {
        self.base
    }

    /// Change the rest orientation. The current orientation is left alone.
    pub fn set_base(&mut self, base: UnitQuaternion<f32>) {
        self.base = base;
    }

    #[inline]
    pub fn current(&self) -> UnitQuaternion<f32> {
        self.current
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Index of the segment being played (0 when idle).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Seconds into the current segment.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Resolved segments of the active sequence; empty when idle.
    pub fn segments(&self) -> &[OrientationSegment] {
        &self.segments
    }

    /// Replace any running sequence with `moves`, composed in the head frame.
    /// An empty list leaves the sequencer untouched.
    pub fn start(&mut self, moves: &[RelativeMove]) {
        self.start_in(moves, Frame::Local);
    }

    pub fn start_single(&mut self, rotation: UnitQuaternion<f32>, duration: f32) {
        self.start(&[RelativeMove::new(rotation, duration)]);
    }

    /// Like [`start`](Self::start) but each move is applied in the parent frame.
    pub fn start_in_parent_frame(&mut self, moves: &[RelativeMove]) {
        self.start_in(moves, Frame::Parent);
    }

    /// Drift from the current orientation to base, then play `moves` from base.
    pub fn start_via_base(&mut self, to_base_duration: f32, moves: &[RelativeMove]) {
        let mut segments = Vec::with_capacity(moves.len() + 1);
        segments.push(OrientationSegment {
            start: self.current,
            end: self.base,
            duration: to_base_duration.max(MIN_SEGMENT_S),
        });
        resolve_into(&mut segments, self.base, moves, Frame::Local);
        self.begin(segments);
    }

    /// Ease back to the base orientation. The final segment ends exactly on base.
    pub fn return_to_base(&mut self, duration: f32) {
        self.begin(vec![OrientationSegment {
            start: self.current,
            end: self.base,
            duration: duration.max(MIN_SEGMENT_S),
        }]);
    }

    /// Stop where the head is now.
    pub fn cancel(&mut self) {
        self.segments.clear();
        self.index = 0;
        self.elapsed = 0.0;
        self.playing = false;
    }

    /// Stop and jump straight to base.
    pub fn snap_to_base(&mut self) {
        self.cancel();
        self.current = self.base;
    }

    /// Advance by `dt` seconds. Returns true on the tick the sequence completes.
    ///
    /// A tick that reaches the end of a segment snaps to its end rotation and
    /// starts the next segment at elapsed 0; the overshoot is dropped.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.playing {
            return false;
        }
        let Some(seg) = self.segments.get(self.index).copied() else {
            self.cancel();
            return true;
        };

        self.elapsed += dt.max(0.0);
        let t = self.elapsed / seg.duration;
        if t >= 1.0 {
            self.current = seg.end;
            self.elapsed = 0.0;
            if self.index + 1 < self.segments.len() {
                self.index += 1;
                false
            } else {
                self.cancel();
                true
            }
        } else {
            self.current = slerp(&seg.start, &seg.end, ease_out_cubic(t));
            false
        }
    }

    fn start_in(&mut self, moves: &[RelativeMove], frame: Frame) {
        if moves.is_empty() {
            return;
        }
        let mut segments = Vec::with_capacity(moves.len());
        resolve_into(&mut segments, self.current, moves, frame);
        self.begin(segments);
    }

    fn begin(&mut self, segments: Vec<OrientationSegment>) {
        self.segments = segments;
        self.index = 0;
        self.elapsed = 0.0;
        self.playing = !self.segments.is_empty();
    }
}

fn resolve_into(
    out: &mut Vec<OrientationSegment>,
    mut from: UnitQuaternion<f32>,
    moves: &[RelativeMove],
    frame: Frame,
) {
    for m in moves {
        let end = match frame {
            Frame::Local => from * m.rotation,
            Frame::Parent => m.rotation * from,
        };
        out.push(OrientationSegment {
            start: from,
            end,
            duration: m.duration.max(MIN_SEGMENT_S),
        });
        from = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{pitch_deg, yaw_deg};

    #[test]
    fn idle_tick_is_noop() {
        let mut seq = OrientationSequencer::default();
        assert!(!seq.tick(1.0));
        assert_eq!(seq.current(), UnitQuaternion::identity());
    }

    #[test]
    fn targets_are_resolved_at_start() {
        let mut seq = OrientationSequencer::default();
        seq.start(&[
            RelativeMove::new(yaw_deg(10.0), 0.5),
            RelativeMove::new(yaw_deg(10.0), 0.5),
        ]);
        let segs = seq.segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].start, segs[0].end);
        assert!(segs[1].end.angle_to(&yaw_deg(20.0)) < 1e-5);
    }

    #[test]
    fn eased_midpoint_is_past_linear_midpoint() {
        let mut seq = OrientationSequencer::default();
        seq.start_single(pitch_deg(-20.0), 1.0);
        seq.tick(0.5);
        // ease-out cubic at 0.5 is 0.875
        let expected = pitch_deg(-17.5);
        assert!(seq.current().angle_to(&expected) < 1e-4);
    }

    #[test]
    fn zero_duration_is_clamped() {
        let mut seq = OrientationSequencer::default();
        seq.start_single(yaw_deg(5.0), 0.0);
        assert_eq!(seq.segments()[0].duration, MIN_SEGMENT_S);
        assert!(seq.tick(0.001));
        assert!(!seq.is_playing());
    }

    #[test]
    fn parent_frame_composes_on_the_left() {
        let mut seq = OrientationSequencer::new(pitch_deg(30.0));
        seq.start_in_parent_frame(&[RelativeMove::new(yaw_deg(20.0), 0.1)]);
        let end = seq.segments()[0].end;
        assert!(end.angle_to(&(yaw_deg(20.0) * pitch_deg(30.0))) < 1e-6);
    }

    #[test]
    fn return_to_base_lands_exactly() {
        let mut seq = OrientationSequencer::default();
        seq.start_single(yaw_deg(33.0), 0.2);
        seq.tick(0.1);
        seq.return_to_base(0.3);
        while seq.is_playing() {
            seq.tick(0.05);
        }
        assert_eq!(seq.current(), seq.base());
    }

    #[test]
    fn snap_and_cancel() {
        let mut seq = OrientationSequencer::default();
        seq.start_single(yaw_deg(30.0), 1.0);
        seq.tick(0.5);
        let mid = seq.current();
        seq.cancel();
        assert!(!seq.is_playing());
        assert_eq!(seq.current(), mid);
        seq.snap_to_base();
        assert_eq!(seq.current(), UnitQuaternion::identity());
    }
}
