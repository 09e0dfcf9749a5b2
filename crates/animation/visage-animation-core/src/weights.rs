//! Weight intents produced by drivers.
//!
//! Drivers never touch the mixer directly. Each tick they append intents to a
//! [`WeightBatch`]; the rig merges the batches in its fixed order and applies them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WeightOp {
    /// Replace one shape's weight (additive API; 0 removes the entry).
    Set { name: String, weight: f32 },
    /// Exclusive single-pose blend: everything else is cleared first.
    Blend { name: String, weight: f32 },
    /// Back to neutral, keeping blink-category shapes.
    Neutral,
    /// Drop all weights, or only the non-blink ones with `keep_tagged`.
    Clear { keep_tagged: bool },
}

impl WeightOp {
    /// Shape name written by this op, if it targets exactly one.
    pub fn name(&self) -> Option<&str> {
        match self {
            WeightOp::Set { name, .. } | WeightOp::Blend { name, .. } => Some(name.as_str()),
            WeightOp::Neutral | WeightOp::Clear { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightBatch {
    ops: Vec<WeightOp>,
}

impl WeightBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, weight: f32) {
        self.ops.push(WeightOp::Set {
            name: name.into(),
            weight,
        });
    }

    pub fn blend(&mut self, name: impl Into<String>, weight: f32) {
        self.ops.push(WeightOp::Blend {
            name: name.into(),
            weight,
        });
    }

    pub fn neutral(&mut self) {
        self.ops.push(WeightOp::Neutral);
    }

    pub fn clear(&mut self, keep_tagged: bool) {
        self.ops.push(WeightOp::Clear { keep_tagged });
    }

    pub fn push(&mut self, op: WeightOp) {
        self.ops.push(op);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeightOp> {
        self.ops.iter()
    }

    pub fn ops(&self) -> &[WeightOp] {
        &self.ops
    }

    /// Last `Set` weight for `name` in this batch.
    pub fn last_set(&self, name: &str) -> Option<f32> {
        self.ops.iter().rev().find_map(|op| match op {
            WeightOp::Set { name: n, weight } if n == name => Some(*weight),
            _ => None,
        })
    }

    pub fn take(&mut self) -> Vec<WeightOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl Extend<WeightOp> for WeightBatch {
    fn extend<T: IntoIterator<Item = WeightOp>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}

impl IntoIterator for WeightBatch {
    type Item = WeightOp;
    type IntoIter = std::vec::IntoIter<WeightOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a WeightBatch {
    type Item = &'a WeightOp;
    type IntoIter = std::slice::Iter<'a, WeightOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_set_wins_within_batch() {
        let mut b = WeightBatch::new();
        b.set("AA", 0.2);
        b.neutral();
        b.set("AA", 0.7);
        assert_eq!(b.last_set("AA"), Some(0.7));
        assert_eq!(b.last_set("EE"), None);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn ops_serialize_tagged() {
        let op = WeightOp::Set {
            name: "AA".into(),
            weight: 0.5,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "set");
        let back: WeightOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
        let clear: WeightOp = serde_json::from_str(r#"{"op":"clear","keep_tagged":true}"#).unwrap();
        assert_eq!(clear, WeightOp::Clear { keep_tagged: true });
    }
}
