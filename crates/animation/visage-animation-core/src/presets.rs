//! Canned head motions for the manual controls.

use serde::{Deserialize, Serialize};

use crate::interp::{pitch_deg, yaw_deg};
use crate::orientation::{OrientationSequencer, RelativeMove};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadPreset {
    NodDown,
    LookLeft,
    LookRight,
    /// Down then back up.
    NodYes,
    /// Yaw out, across and back, composed in the parent frame.
    ShakeNo,
    /// Cancel any motion and snap to base.
    Reset,
}

impl HeadPreset {
    pub const ALL: [HeadPreset; 6] = [
        HeadPreset::NodDown,
        HeadPreset::LookLeft,
        HeadPreset::LookRight,
        HeadPreset::NodYes,
        HeadPreset::ShakeNo,
        HeadPreset::Reset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeadPreset::NodDown => "nod_down",
            HeadPreset::LookLeft => "look_left",
            HeadPreset::LookRight => "look_right",
            HeadPreset::NodYes => "nod_yes",
            HeadPreset::ShakeNo => "shake_no",
            HeadPreset::Reset => "reset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn apply(self, seq: &mut OrientationSequencer) {
        match self {
            HeadPreset::NodDown => seq.start_single(pitch_deg(-20.0), 0.6),
            HeadPreset::LookLeft => seq.start_single(yaw_deg(20.0), 0.7),
            HeadPreset::LookRight => seq.start_single(yaw_deg(-20.0), 0.7),
            HeadPreset::NodYes => seq.start(&[
                RelativeMove::new(pitch_deg(-20.0), 0.35),
                RelativeMove::new(pitch_deg(20.0), 0.35),
            ]),
            HeadPreset::ShakeNo => seq.start_in_parent_frame(&[
                RelativeMove::new(yaw_deg(20.0), 0.25),
                RelativeMove::new(yaw_deg(-40.0), 0.25),
                RelativeMove::new(yaw_deg(20.0), 0.25),
            ]),
            HeadPreset::Reset => seq.snap_to_base(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;

    #[test]
    fn names_round_trip() {
        for p in HeadPreset::ALL {
            assert_eq!(HeadPreset::from_name(p.name()), Some(p));
        }
        assert_eq!(HeadPreset::from_name("wave"), None);
    }

    #[test]
    fn nod_yes_returns_to_start() {
        let mut seq = OrientationSequencer::default();
        HeadPreset::NodYes.apply(&mut seq);
        assert_eq!(seq.segments().len(), 2);
        let end = seq.segments()[1].end;
        assert!(end.angle_to(&UnitQuaternion::identity()) < 1e-5);
    }

    #[test]
    fn shake_no_sweeps_both_sides() {
        let mut seq = OrientationSequencer::default();
        HeadPreset::ShakeNo.apply(&mut seq);
        let segs = seq.segments();
        assert_eq!(segs.len(), 3);
        assert!(segs[0].end.angle_to(&yaw_deg(20.0)) < 1e-5);
        assert!(segs[1].end.angle_to(&yaw_deg(-20.0)) < 1e-5);
        assert!(segs[2].end.angle_to(&UnitQuaternion::identity()) < 1e-5);
    }

    #[test]
    fn reset_snaps() {
        let mut seq = OrientationSequencer::default();
        HeadPreset::LookLeft.apply(&mut seq);
        seq.tick(0.3);
        HeadPreset::Reset.apply(&mut seq);
        assert!(!seq.is_playing());
        assert_eq!(seq.current(), seq.base());
    }
}
