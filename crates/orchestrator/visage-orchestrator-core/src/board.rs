use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use visage_animation_core::WeightOp;

/// Who produced a write or event during a tick. Declared in tick order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverId {
    Sequencer,
    Blink,
    Idle,
    Speech,
    MicroMotion,
    Manual,
}

impl DriverId {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverId::Sequencer => "sequencer",
            DriverId::Blink => "blink",
            DriverId::Idle => "idle",
            DriverId::Speech => "speech",
            DriverId::MicroMotion => "micro_motion",
            DriverId::Manual => "manual",
        }
    }
}

/// Latest named write with provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub weight: f32,
    pub epoch: u64,
    pub writer: DriverId,
}

/// A named weight written by two different drivers in the same tick.
/// The later writer won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConflict {
    pub name: String,
    pub previous_weight: f32,
    pub previous_writer: DriverId,

    pub new_weight: f32,
    pub new_writer: DriverId,
    pub epoch: u64,
}

/// Provenance of every named weight write, last writer wins.
///
/// Only `Set` and `Blend` name a shape; `Neutral` and `Clear` pass through to
/// the mixer without touching the board.
#[derive(Debug, Default)]
pub struct WeightBoard {
    inner: HashMap<String, WeightEntry>,
}

impl WeightBoard {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&WeightEntry> {
        self.inner.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WeightEntry)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Record one op. Returns a conflict when a different driver already wrote
    /// the same name during `epoch`.
    pub fn record(&mut self, op: &WeightOp, epoch: u64, writer: DriverId) -> Option<WeightConflict> {
        let (name, weight) = match op {
            WeightOp::Set { name, weight } | WeightOp::Blend { name, weight } => (name, *weight),
            WeightOp::Neutral | WeightOp::Clear { .. } => return None,
        };

        let conflict = match self.inner.get(name.as_str()) {
            Some(prev) if prev.epoch == epoch && prev.writer != writer => Some(WeightConflict {
                name: name.clone(),
                previous_weight: prev.weight,
                previous_writer: prev.writer,
                new_weight: weight,
                new_writer: writer,
                epoch,
            }),
            _ => None,
        };

        self.inner.insert(
            name.clone(),
            WeightEntry {
                weight,
                epoch,
                writer,
            },
        );
        conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_animation_core::WeightBatch;

    fn record_all(
        board: &mut WeightBoard,
        batch: &WeightBatch,
        epoch: u64,
        writer: DriverId,
    ) -> Vec<WeightConflict> {
        batch
            .iter()
            .filter_map(|op| board.record(op, epoch, writer))
            .collect()
    }

    #[test]
    fn record_and_get_entry() {
        let mut board = WeightBoard::new();
        let op = WeightOp::Set {
            name: "AA".into(),
            weight: 0.5,
        };
        assert!(board.record(&op, 1, DriverId::Speech).is_none());

        let got = board.get("AA").expect("entry missing");
        assert_eq!(got.weight, 0.5);
        assert_eq!(got.epoch, 1);
        assert_eq!(got.writer, DriverId::Speech);
    }

    #[test]
    fn same_tick_overwrite_by_other_driver_conflicts() {
        let mut board = WeightBoard::new();
        let mut blink = WeightBatch::new();
        blink.set("EyeBlink_L", 0.4);
        assert!(record_all(&mut board, &blink, 2, DriverId::Blink).is_empty());

        let mut manual = WeightBatch::new();
        manual.set("EyeBlink_L", 1.0);
        let conflicts = record_all(&mut board, &manual, 2, DriverId::Manual);
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.previous_writer, DriverId::Blink);
        assert_eq!(c.previous_weight, 0.4);
        assert_eq!(c.new_writer, DriverId::Manual);
        assert_eq!(board.get("EyeBlink_L").map(|e| e.writer), Some(DriverId::Manual));
    }

    #[test]
    fn later_tick_or_same_driver_is_not_a_conflict() {
        let mut board = WeightBoard::new();
        let mut batch = WeightBatch::new();
        batch.set("Smile", 0.2);
        batch.set("Smile", 0.3);
        assert!(record_all(&mut board, &batch, 1, DriverId::Idle).is_empty());
        assert!(record_all(&mut board, &batch, 2, DriverId::Speech).is_empty());
    }

    #[test]
    fn unnamed_ops_are_not_tracked() {
        let mut board = WeightBoard::new();
        let mut batch = WeightBatch::new();
        batch.neutral();
        batch.clear(true);
        assert!(record_all(&mut board, &batch, 1, DriverId::Speech).is_empty());
        assert!(board.is_empty());
    }
}
