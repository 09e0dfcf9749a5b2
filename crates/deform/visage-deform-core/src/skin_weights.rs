//! Sparse per-vertex joint weights.
//!
//! The attachment format lists, per vertex, whitespace-separated weights for
//! joints `1..M-1`. Joint 0 is implied as `1 - sum(others)` and dropped when that
//! value is exactly zero. Rows whose explicit weights exceed 1 give joint 0 a
//! negative weight; that is kept as-is (extrapolation) and only reported.

use serde::{Deserialize, Serialize};

use crate::error::DeformError;

/// One (joint, weight) pair.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointWeight {
    pub joint: usize,
    pub weight: f32,
}

pub type WeightRow = Vec<JointWeight>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinWeights {
    pub rows: Vec<WeightRow>,
    /// Rows (0-based) whose implied joint-0 weight came out negative.
    pub overweight_rows: Vec<usize>,
}

impl SkinWeights {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build one row from explicit weights for joints `1..=explicit.len()`.
    pub fn row_from_explicit(explicit: &[f32]) -> WeightRow {
        let mut row = Vec::with_capacity(explicit.len() + 1);
        let mut sum = 0.0f32;
        for (k, &w) in explicit.iter().enumerate() {
            sum += w;
            if w != 0.0 {
                row.push(JointWeight {
                    joint: k + 1,
                    weight: w,
                });
            }
        }
        let w0 = 1.0 - sum;
        if w0 != 0.0 {
            row.push(JointWeight {
                joint: 0,
                weight: w0,
            });
        }
        row
    }

    /// Every vertex fully bound to a single joint.
    pub fn rigid(vertex_count: usize, joint: usize) -> Self {
        Self {
            rows: vec![
                vec![JointWeight {
                    joint,
                    weight: 1.0
                }];
                vertex_count
            ],
            overweight_rows: Vec::new(),
        }
    }
}

/// Parse attachment weights for a skeleton of `joint_count` joints.
///
/// Extra trailing values on a line are ignored; missing ones are an error.
pub fn parse_skin_weights(text: &str, joint_count: usize) -> Result<SkinWeights, DeformError> {
    let expected = joint_count.saturating_sub(1);
    let mut out = SkinWeights::default();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut values = Vec::with_capacity(expected);
        for raw in line.split_whitespace() {
            let v: f32 = raw.parse().map_err(|e| DeformError::WeightLine {
                line: line_no,
                reason: format!("bad weight '{raw}': {e}"),
            })?;
            values.push(v);
        }
        if values.len() < expected {
            return Err(DeformError::ShortWeightRow {
                line: line_no,
                expected,
                found: values.len(),
            });
        }
        let row = SkinWeights::row_from_explicit(&values[..expected]);
        if row.iter().any(|jw| jw.joint == 0 && jw.weight < 0.0) {
            out.overweight_rows.push(out.rows.len());
        }
        out.rows.push(row);
    }

    if !out.overweight_rows.is_empty() {
        log::warn!(
            "{} attachment rows sum above 1; joint 0 gets a negative weight",
            out.overweight_rows.len()
        );
    }
    Ok(out)
}
