//! Shared mesh helpers used by both deformers.
//!
//! Normals are area-weighted: every triangle adds its unnormalized face normal
//! `(p1 - p0) x (p2 - p0)` to each of its three corners, then every accumulator
//! is normalized.

use nalgebra::{Point3, Vector3};

/// Vertex position in model space.
pub type Position = Point3<f32>;
/// Per-vertex normal. The zero vector marks a degenerate normal.
pub type Normal = Vector3<f32>;

/// Accumulators shorter than this are treated as degenerate.
const DEGENERATE_LEN: f32 = 1e-12;

/// Recompute per-vertex normals from `positions` and a triangle index buffer.
///
/// Vertices touched by no triangle, or whose accumulated face normals cancel out,
/// get the zero vector instead of a NaN. Triangles referencing an index outside
/// `positions` are skipped; a trailing partial triangle is ignored.
pub fn compute_vertex_normals(positions: &[Position], indices: &[u32]) -> Vec<Normal> {
    let mut normals = vec![Normal::zeros(); positions.len()];
    accumulate_face_normals(positions, indices, &mut normals);
    for n in normals.iter_mut() {
        *n = n.try_normalize(DEGENERATE_LEN).unwrap_or_else(Normal::zeros);
    }
    normals
}

/// Add each triangle's unnormalized face normal into its corners' accumulators.
pub fn accumulate_face_normals(positions: &[Position], indices: &[u32], out: &mut [Normal]) {
    let n = positions.len().min(out.len());
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= n || i1 >= n || i2 >= n {
            continue;
        }
        let p0 = positions[i0];
        let fn_ = (positions[i1] - p0).cross(&(positions[i2] - p0));
        out[i0] += fn_;
        out[i1] += fn_;
        out[i2] += fn_;
    }
}

/// True when the normal is the degenerate zero-vector fallback.
#[inline]
pub fn is_degenerate(n: &Normal) -> bool {
    n.norm_squared() == 0.0
}
