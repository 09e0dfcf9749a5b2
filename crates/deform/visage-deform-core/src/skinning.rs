//! Linear blend skinning.
//!
//! p' = Σⱼ wⱼ · Tⱼ · Bⱼ⁻¹ · p, where Tⱼ is the current world transform of joint j,
//! Bⱼ its bind-pose world transform and p the bind-pose vertex.
//!
//! Joint transforms are rigid, so Bⱼ⁻¹ is the exact isometry inverse and an
//! unmoved joint maps its vertices back onto their bind positions bit for bit.

use nalgebra::{Isometry3, Matrix4, UnitQuaternion, Vector4};

use crate::error::DeformError;
use crate::geometry::{compute_vertex_normals, Normal, Position};
use crate::skeleton::{bone_visuals, parse_skeleton, BoneVisual, Skeleton};
use crate::skin_weights::{parse_skin_weights, SkinWeights};

#[derive(Debug)]
pub struct SkeletalSkinner {
    skeleton: Skeleton,
    owner: Isometry3<f32>,

    bind_world: Vec<Isometry3<f32>>,
    bind_world_inv: Vec<Isometry3<f32>>,
    bind_positions: Vec<Position>,
    indices: Vec<u32>,
    weights: SkinWeights,

    world: Vec<Isometry3<f32>>,
    positions: Vec<Position>,
    normals: Vec<Normal>,
}

impl SkeletalSkinner {
    /// Capture bind transforms from the skeleton's current (rest) pose and skin once.
    ///
    /// A weight/vertex count mismatch is clamped to the smaller count. Rows that
    /// reference joints outside the skeleton contribute nothing for that entry.
    pub fn new(
        skeleton: Skeleton,
        bind_positions: Vec<Position>,
        indices: Vec<u32>,
        weights: SkinWeights,
    ) -> Result<Self, DeformError> {
        Self::with_owner(skeleton, Isometry3::identity(), bind_positions, indices, weights)
    }

    /// Same as [`new`](Self::new) with a transform applied to every root joint.
    pub fn with_owner(
        skeleton: Skeleton,
        owner: Isometry3<f32>,
        mut bind_positions: Vec<Position>,
        indices: Vec<u32>,
        mut weights: SkinWeights,
    ) -> Result<Self, DeformError> {
        if skeleton.is_empty() {
            return Err(DeformError::EmptySkeleton);
        }
        if weights.len() != bind_positions.len() {
            log::warn!(
                "mesh verts ({}) != attachment rows ({}); using min",
                bind_positions.len(),
                weights.len()
            );
            let n = weights.len().min(bind_positions.len());
            bind_positions.truncate(n);
            weights.rows.truncate(n);
            weights.overweight_rows.retain(|&r| r < n);
        }

        let bind_world = skeleton.world_transforms(&owner);
        let bind_world_inv = bind_world.iter().map(|b| b.inverse()).collect();

        let mut skinner = Self {
            world: bind_world.clone(),
            skeleton,
            owner,
            bind_world,
            bind_world_inv,
            positions: bind_positions.clone(),
            bind_positions,
            indices,
            weights,
            normals: Vec::new(),
        };
        skinner.on_joints_changed();
        Ok(skinner)
    }

    /// Build from the text formats: skeleton lines and attachment lines.
    pub fn from_text(
        skeleton_text: &str,
        weights_text: &str,
        bind_positions: Vec<Position>,
        indices: Vec<u32>,
    ) -> Result<Self, DeformError> {
        let skeleton = parse_skeleton(skeleton_text)?;
        let weights = parse_skin_weights(weights_text, skeleton.len())?;
        log::info!(
            "loaded skeleton (#joints = {}, #weight rows = {})",
            skeleton.len(),
            weights.len()
        );
        Self::new(skeleton, bind_positions, indices, weights)
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.skeleton.len()
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn weights(&self) -> &SkinWeights {
        &self.weights
    }

    /// Set a joint's local rotation. Call [`on_joints_changed`](Self::on_joints_changed)
    /// afterwards. Returns false for an out-of-range joint.
    pub fn set_joint_rotation(&mut self, joint: usize, rotation: UnitQuaternion<f32>) -> bool {
        match self.skeleton.joints.get_mut(joint) {
            Some(j) => {
                j.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Euler angles in radians, about X, Y then Z.
    pub fn set_joint_euler(&mut self, joint: usize, rx: f32, ry: f32, rz: f32) -> bool {
        self.set_joint_rotation(joint, UnitQuaternion::from_euler_angles(rx, ry, rz))
    }

    /// Recompute joint world transforms, skinned positions and normals.
    ///
    /// Each vertex accumulates `w·Tⱼ·Bⱼ⁻¹·p` in homogeneous form and is divided by
    /// the summed `w`. A row summing to 1 (overweight rows with a negative joint-0
    /// weight included) gives the plain weighted sum. A row whose entries point past
    /// the skeleton is renormalized over the joints that exist.
    pub fn on_joints_changed(&mut self) {
        self.world = self.skeleton.world_transforms(&self.owner);

        // Tⱼ·Bⱼ⁻¹ once per joint, not per vertex.
        let skin: Vec<Isometry3<f32>> = self
            .world
            .iter()
            .zip(self.bind_world_inv.iter())
            .map(|(t, b_inv)| t * b_inv)
            .collect();

        self.positions.clear();
        for (p, row) in self.bind_positions.iter().zip(self.weights.rows.iter()) {
            let mut acc = Vector4::<f32>::zeros();
            for jw in row {
                if let Some(m) = skin.get(jw.joint) {
                    acc += (m * p).to_homogeneous() * jw.weight;
                }
            }
            let out = if acc.w != 0.0 {
                Position::new(acc.x / acc.w, acc.y / acc.w, acc.z / acc.w)
            } else {
                Position::new(acc.x, acc.y, acc.z)
            };
            self.positions.push(out);
        }

        self.normals = compute_vertex_normals(&self.positions, &self.indices);
    }

    #[inline]
    pub fn bind_positions(&self) -> &[Position] {
        &self.bind_positions
    }

    #[inline]
    pub fn bind_world(&self) -> &[Isometry3<f32>] {
        &self.bind_world
    }

    #[inline]
    pub fn joint_world(&self) -> &[Isometry3<f32>] {
        &self.world
    }

    /// Current joint transforms as column-major 4x4 matrices.
    pub fn joint_world_matrices(&self) -> Vec<Matrix4<f32>> {
        self.world.iter().map(|w| w.to_homogeneous()).collect()
    }

    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[Normal] {
        &self.normals
    }

    /// Bone cylinders for skeleton view; independent of the skinning math.
    pub fn bone_visuals(&self) -> Vec<BoneVisual> {
        bone_visuals(&self.skeleton)
    }
}
