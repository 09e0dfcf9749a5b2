//! Load-time errors for deformation data.
//!
//! None of these cross the per-frame boundary: callers turn them into a
//! disabled feature plus a warning.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeformError {
    #[error("blendshape json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blendshape vertex_count invalid: {0}")]
    InvalidVertexCount(i64),

    #[error("pose '{name}' has {found} points, expected at least {expected}")]
    ShortPose {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("mesh has no vertices")]
    EmptyMesh,

    #[error("skeleton line {line}: {reason}")]
    SkeletonLine { line: usize, reason: String },

    #[error("skeleton line {line}: parent {parent} is not an earlier joint")]
    ForwardParent { line: usize, parent: i64 },

    #[error("skeleton has no joints")]
    EmptySkeleton,

    #[error("attachment line {line}: {reason}")]
    WeightLine { line: usize, reason: String },

    #[error("attachment line {line}: expected {expected} weights, found {found}")]
    ShortWeightRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}
