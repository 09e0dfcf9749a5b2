//! Visage Deform Core (engine-agnostic)
//!
//! Mesh deformation for the talking-head rig: a blendshape mixer that morphs a
//! face mesh toward weighted target poses, and a linear-blend skinner that poses
//! a mesh from a joint hierarchy. Both share one normal-recompute routine and
//! neither knows about rendering; callers upload `positions()`/`normals()`.

pub mod blendshape;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod skeleton;
pub mod skin_weights;
pub mod skinning;

// Re-exports for consumers (rig, hosts)
pub use blendshape::{BlendShapeMixer, ShapeCategory};
pub use config::MixerConfig;
pub use data::{parse_blendshape_json, BlendShapeData, BlendShapeDocument};
pub use error::DeformError;
pub use geometry::{compute_vertex_normals, Normal, Position};
pub use skeleton::{align_y_to, bone_visuals, parse_skeleton, BoneVisual, Joint, Skeleton};
pub use skin_weights::{parse_skin_weights, JointWeight, SkinWeights, WeightRow};
pub use skinning::SkeletalSkinner;
