//! Blendshape document model and conversion into mixer-ready poses.
//!
//! JSON layout:
//! `{ "vertex_count": N, "basis": [[x,y,z]; N], "phonemes": { "<name>": [[x,y,z]; N] } }`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DeformError;
use crate::geometry::Position;

/// Raw blendshape document as produced by the asset exporter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendShapeDocument {
    pub vertex_count: i64,
    pub basis: Vec<[f32; 3]>,
    pub phonemes: BTreeMap<String, Vec<[f32; 3]>>,
}

/// Validated poses, all truncated to the same vertex count.
#[derive(Clone, Debug, Default)]
pub struct BlendShapeData {
    pub basis: Vec<Position>,
    pub targets: BTreeMap<String, Vec<Position>>,
}

impl BlendShapeData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.basis.len()
    }
}

/// Parse a blendshape document from JSON text.
pub fn parse_blendshape_json(s: &str) -> Result<BlendShapeDocument, DeformError> {
    Ok(serde_json::from_str(s)?)
}

fn to_positions(name: &str, raw: &[[f32; 3]], n: usize) -> Result<Vec<Position>, DeformError> {
    if raw.len() < n {
        return Err(DeformError::ShortPose {
            name: name.to_string(),
            expected: n,
            found: raw.len(),
        });
    }
    Ok(raw[..n]
        .iter()
        .map(|p| Position::new(p[0], p[1], p[2]))
        .collect())
}

impl BlendShapeDocument {
    /// Convert into mixer poses for a mesh with `mesh_vertex_count` vertices.
    ///
    /// A count mismatch is tolerated: both sides are truncated to the smaller count
    /// and a warning is logged. A non-positive `vertex_count` or a pose with fewer
    /// points than the working count is an error.
    pub fn into_data(self, mesh_vertex_count: usize) -> Result<BlendShapeData, DeformError> {
        if self.vertex_count <= 0 {
            return Err(DeformError::InvalidVertexCount(self.vertex_count));
        }
        if mesh_vertex_count == 0 {
            return Err(DeformError::EmptyMesh);
        }
        let doc_count = self.vertex_count as usize;
        if doc_count != mesh_vertex_count {
            log::warn!(
                "mesh verts ({mesh_vertex_count}) != blendshape vertex_count ({doc_count}); using min"
            );
        }
        let n = doc_count.min(mesh_vertex_count);

        let basis = to_positions("basis", &self.basis, n)?;
        let mut targets = BTreeMap::new();
        for (name, raw) in self.phonemes {
            let pose = to_positions(&name, &raw, n)?;
            targets.insert(name, pose);
        }
        Ok(BlendShapeData { basis, targets })
    }
}
