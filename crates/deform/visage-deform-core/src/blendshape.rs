//! Blendshape mixer: basis + Σ wᵢ·(poseᵢ − basis) over the active weight set.
//!
//! The active weight set is the only mutable input. Absent names weigh 0, so a
//! weight set to 0 is removed rather than stored. Recomputation is lazy: every
//! mutation marks the mixer dirty and [`BlendShapeMixer::refresh`] rebuilds the
//! deformed positions and normals once.

use hashbrown::HashMap;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::MixerConfig;
use crate::data::{parse_blendshape_json, BlendShapeData};
use crate::error::DeformError;
use crate::geometry::{compute_vertex_normals, Normal, Position};

/// Explicit tag per target, replacing name-substring checks at clear time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ShapeCategory {
    #[default]
    Expression,
    /// Survives `clear_weights(true)` and the neutral sentinel.
    Blink,
}

#[derive(Clone, Debug)]
struct TargetPose {
    /// pose − basis, per vertex.
    deltas: Vec<Vector3<f32>>,
    category: ShapeCategory,
}

#[derive(Debug)]
pub struct BlendShapeMixer {
    cfg: MixerConfig,
    basis: Vec<Position>,
    targets: HashMap<String, TargetPose>,
    indices: Vec<u32>,
    loaded: bool,

    weights: HashMap<String, f32>,

    positions: Vec<Position>,
    normals: Vec<Normal>,
    dirty: bool,
}

impl BlendShapeMixer {
    /// Build a mixer over a mesh. Without blendshape data the mesh's own positions
    /// become the basis and there are no targets.
    pub fn new(
        cfg: MixerConfig,
        mesh_positions: Vec<Position>,
        indices: Vec<u32>,
        data: Option<BlendShapeData>,
    ) -> Self {
        let (basis, raw_targets, loaded) = match data {
            Some(d) => (d.basis, d.targets, true),
            None => (mesh_positions, Default::default(), false),
        };

        let mut targets = HashMap::with_capacity(raw_targets.len());
        for (name, pose) in raw_targets {
            let deltas = pose
                .iter()
                .zip(basis.iter())
                .map(|(p, b)| p - b)
                .collect();
            let category = match &cfg.blink_marker {
                Some(marker) if !marker.is_empty() && name.contains(marker.as_str()) => {
                    ShapeCategory::Blink
                }
                _ => ShapeCategory::Expression,
            };
            targets.insert(name, TargetPose { deltas, category });
        }

        let mut mixer = Self {
            cfg,
            positions: basis.clone(),
            normals: Vec::new(),
            basis,
            targets,
            indices,
            loaded,
            weights: HashMap::new(),
            dirty: true,
        };
        mixer.refresh();
        mixer
    }

    /// Parse a blendshape document and build a mixer. Fails on any load-time error.
    pub fn from_json(
        cfg: MixerConfig,
        mesh_positions: Vec<Position>,
        indices: Vec<u32>,
        json: &str,
    ) -> Result<Self, DeformError> {
        let data = parse_blendshape_json(json)?.into_data(mesh_positions.len())?;
        log::info!("loaded blendshapes (#phonemes = {})", data.targets.len());
        Ok(Self::new(cfg, mesh_positions, indices, Some(data)))
    }

    /// Like [`from_json`](Self::from_json) but degrades to the raw mesh on error.
    pub fn load_or_fallback(
        cfg: MixerConfig,
        mesh_positions: Vec<Position>,
        indices: Vec<u32>,
        json: &str,
    ) -> Self {
        let data = parse_blendshape_json(json).and_then(|doc| doc.into_data(mesh_positions.len()));
        match data {
            Ok(data) => {
                log::info!("loaded blendshapes (#phonemes = {})", data.targets.len());
                Self::new(cfg, mesh_positions, indices, Some(data))
            }
            Err(e) => {
                log::warn!("blendshapes disabled, using raw mesh: {e}");
                Self::new(cfg, mesh_positions, indices, None)
            }
        }
    }

    #[inline]
    pub fn config(&self) -> &MixerConfig {
        &self.cfg
    }

    /// Whether a blendshape document was loaded (false means raw-mesh fallback).
    #[inline]
    pub fn phonemes_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.basis.len()
    }

    #[inline]
    pub fn basis(&self) -> &[Position] {
        &self.basis
    }

    /// True for the neutral sentinel or the empty name.
    #[inline]
    pub fn is_neutral(&self, name: &str) -> bool {
        name.is_empty() || name == self.cfg.neutral_sentinel
    }

    #[inline]
    pub fn has_target(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Target names sorted ascending.
    pub fn available_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.targets.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn category(&self, name: &str) -> Option<ShapeCategory> {
        self.targets.get(name).map(|t| t.category)
    }

    /// Retag a target. Returns false for unknown names.
    pub fn set_category(&mut self, name: &str, category: ShapeCategory) -> bool {
        match self.targets.get_mut(name) {
            Some(t) => {
                t.category = category;
                true
            }
            None => false,
        }
    }

    /// Current weight; absent names weigh 0.
    pub fn weight(&self, name: &str) -> f32 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }

    /// Active (nonzero) weights, unordered.
    pub fn active_weights(&self) -> impl Iterator<Item = (&str, f32)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.weights.len()
    }

    /// Additive weight update. The neutral sentinel clears every non-blink weight;
    /// unknown names are ignored; a weight ≤ 0 removes the entry.
    pub fn set_weight(&mut self, name: &str, weight: f32) {
        let w = clamp_weight(weight);
        if self.is_neutral(name) {
            self.clear_weights(true);
            return;
        }
        if !self.targets.contains_key(name) {
            return;
        }
        if w <= 0.0 {
            if self.weights.remove(name).is_some() {
                self.dirty = true;
            }
        } else if self.weights.insert(name.to_string(), w) != Some(w) {
            self.dirty = true;
        }
    }

    /// Exclusive single-pose blend: clears every weight (blink included), then sets
    /// exactly one. The neutral sentinel returns to the basis.
    pub fn set_blend(&mut self, name: &str, weight: f32) {
        let w = clamp_weight(weight);
        if self.is_neutral(name) {
            self.clear_weights(false);
            return;
        }
        if !self.targets.contains_key(name) {
            return;
        }
        self.clear_weights(false);
        if w > 0.0 {
            self.weights.insert(name.to_string(), w);
            self.dirty = true;
        }
    }

    /// Remove all weights, or only the non-blink ones when `keep_tagged` is set.
    pub fn clear_weights(&mut self, keep_tagged: bool) {
        let before = self.weights.len();
        if keep_tagged {
            let targets = &self.targets;
            self.weights.retain(|name, _| {
                targets
                    .get(name)
                    .map(|t| t.category == ShapeCategory::Blink)
                    .unwrap_or(false)
            });
        } else {
            self.weights.clear();
        }
        if self.weights.len() != before {
            self.dirty = true;
        }
    }

    /// Rebuild positions and normals if any weight changed since the last call.
    /// Returns whether a recomputation happened.
    pub fn refresh(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.recompute();
        true
    }

    /// Unconditionally rebuild positions and normals. O(N·|active|).
    pub fn recompute(&mut self) {
        self.positions.clear();
        self.positions.extend_from_slice(&self.basis);

        for (name, &w) in self.weights.iter() {
            if w == 0.0 {
                continue;
            }
            let Some(target) = self.targets.get(name) else {
                continue;
            };
            for (p, d) in self.positions.iter_mut().zip(target.deltas.iter()) {
                *p += d * w;
            }
        }

        self.normals = compute_vertex_normals(&self.positions, &self.indices);
        self.dirty = false;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Deformed positions as of the last refresh.
    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Normals as of the last refresh; degenerate vertices hold the zero vector.
    #[inline]
    pub fn normals(&self) -> &[Normal] {
        &self.normals
    }
}

/// Weights live in [0, 1]; NaN counts as zero.
fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn tri_mixer() -> BlendShapeMixer {
        let basis = vec![
            Position::new(0.0, 0.0, 0.0),
            Position::new(1.0, 0.0, 0.0),
            Position::new(0.0, 1.0, 0.0),
        ];
        let mut targets = BTreeMap::new();
        targets.insert(
            "AA".to_string(),
            basis.iter().map(|p| p + Vector3::new(0.0, 0.0, 1.0)).collect(),
        );
        targets.insert(
            "EyeBlink_L".to_string(),
            basis.iter().map(|p| p + Vector3::new(1.0, 0.0, 0.0)).collect(),
        );
        let data = BlendShapeData {
            basis: basis.clone(),
            targets,
        };
        BlendShapeMixer::new(MixerConfig::default(), basis, vec![0, 1, 2], Some(data))
    }

    #[test]
    fn blink_marker_tags_targets() {
        let m = tri_mixer();
        assert_eq!(m.category("EyeBlink_L"), Some(ShapeCategory::Blink));
        assert_eq!(m.category("AA"), Some(ShapeCategory::Expression));
        assert_eq!(m.category("missing"), None);
    }

    #[test]
    fn weight_is_clamped() {
        let mut m = tri_mixer();
        m.set_weight("AA", 3.0);
        assert_eq!(m.weight("AA"), 1.0);
        m.set_weight("AA", -1.0);
        assert_eq!(m.weight("AA"), 0.0);
        assert_eq!(m.active_count(), 0);
    }

    #[test]
    fn nan_weight_is_treated_as_zero() {
        let mut m = tri_mixer();
        m.set_weight("AA", 0.5);
        m.set_weight("AA", f32::NAN);
        assert_eq!(m.active_count(), 0);
        m.set_blend("EyeBlink_L", f32::NAN);
        assert_eq!(m.active_count(), 0);
        m.refresh();
        assert!(m.positions().iter().all(|p| p.iter().all(|c| c.is_finite())));
        assert_eq!(m.positions()[0], Position::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn unknown_name_is_noop() {
        let mut m = tri_mixer();
        m.set_weight("AA", 0.5);
        m.refresh();
        m.set_weight("ZZ", 0.7);
        assert!(!m.is_dirty());
        assert_eq!(m.active_count(), 1);
    }

    #[test]
    fn neutral_keeps_blink_but_blend_neutral_clears_all() {
        let mut m = tri_mixer();
        m.set_weight("AA", 0.5);
        m.set_weight("EyeBlink_L", 0.4);
        m.set_weight("NEUTRAL", 0.0);
        assert_eq!(m.weight("AA"), 0.0);
        assert_eq!(m.weight("EyeBlink_L"), 0.4);
        m.set_blend("NEUTRAL", 0.0);
        assert_eq!(m.active_count(), 0);
    }

    #[test]
    fn neutral_sentinel_is_case_sensitive() {
        let mut m = tri_mixer();
        m.set_weight("AA", 0.5);
        m.set_weight("neutral", 0.0);
        assert_eq!(m.weight("AA"), 0.5);
    }

    #[test]
    fn set_blend_is_exclusive() {
        let mut m = tri_mixer();
        m.set_weight("EyeBlink_L", 0.4);
        m.set_blend("AA", 0.25);
        assert_eq!(m.active_count(), 1);
        assert_eq!(m.weight("AA"), 0.25);
    }

    #[test]
    fn set_blend_unknown_name_leaves_weights() {
        let mut m = tri_mixer();
        m.set_weight("AA", 0.3);
        m.set_blend("nope", 1.0);
        assert_eq!(m.weight("AA"), 0.3);
    }

    #[test]
    fn retagging_changes_clear_behavior() {
        let mut m = tri_mixer();
        assert!(m.set_category("AA", ShapeCategory::Blink));
        m.set_weight("AA", 0.5);
        m.clear_weights(true);
        assert_eq!(m.weight("AA"), 0.5);
        assert!(!m.set_category("nope", ShapeCategory::Blink));
    }

    #[test]
    fn refresh_only_when_dirty() {
        let mut m = tri_mixer();
        assert!(!m.refresh());
        m.set_weight("AA", 1.0);
        assert!(m.refresh());
        assert!(!m.refresh());
        assert_eq!(m.positions()[0], Position::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn fallback_uses_mesh_positions() {
        let mesh = vec![Position::new(2.0, 0.0, 0.0), Position::new(0.0, 2.0, 0.0)];
        let m = BlendShapeMixer::load_or_fallback(
            MixerConfig::default(),
            mesh.clone(),
            vec![],
            "{ not json",
        );
        assert!(!m.phonemes_loaded());
        assert_eq!(m.positions(), mesh.as_slice());
        assert!(m.available_names().is_empty());
    }
}
