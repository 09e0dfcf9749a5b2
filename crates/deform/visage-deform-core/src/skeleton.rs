//! Joint hierarchy and its text format.
//!
//! One joint per line: `tx ty tz parentIndex`, parent `-1` for a root. Parents
//! must appear on an earlier line, so world transforms resolve in one forward
//! pass over the joint list.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::DeformError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// `None` attaches the joint to the skeleton's owner.
    pub parent: Option<usize>,
    /// Offset from the parent joint, fixed at load.
    pub translation: Vector3<f32>,
    /// Local rotation; identity in the rest pose.
    pub rotation: UnitQuaternion<f32>,
}

impl Joint {
    pub fn local_transform(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
}

impl Skeleton {
    #[inline]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// World transform of every joint, with `owner` applied to the roots.
    pub fn world_transforms(&self, owner: &Isometry3<f32>) -> Vec<Isometry3<f32>> {
        let mut world: Vec<Isometry3<f32>> = Vec::with_capacity(self.joints.len());
        for joint in &self.joints {
            let parent = match joint.parent {
                Some(p) if p < world.len() => world[p],
                _ => *owner,
            };
            world.push(parent * joint.local_transform());
        }
        world
    }
}

/// Parse the skeleton text format. Blank lines are skipped.
pub fn parse_skeleton(text: &str) -> Result<Skeleton, DeformError> {
    let mut joints = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 4 {
            return Err(DeformError::SkeletonLine {
                line: line_no,
                reason: format!("expected 4 fields, found {}", fields.len()),
            });
        }
        let mut t = [0.0f32; 3];
        for (slot, raw) in t.iter_mut().zip(&fields[..3]) {
            *slot = raw.parse().map_err(|e| DeformError::SkeletonLine {
                line: line_no,
                reason: format!("bad coordinate '{raw}': {e}"),
            })?;
        }
        let parent: i64 = fields[3].parse().map_err(|e| DeformError::SkeletonLine {
            line: line_no,
            reason: format!("bad parent '{}': {e}", fields[3]),
        })?;
        let parent = match parent {
            -1 => None,
            p if p >= 0 && (p as usize) < joints.len() => Some(p as usize),
            p => {
                return Err(DeformError::ForwardParent {
                    line: line_no,
                    parent: p,
                })
            }
        };
        joints.push(Joint {
            parent,
            translation: Vector3::new(t[0], t[1], t[2]),
            rotation: UnitQuaternion::identity(),
        });
    }
    if joints.is_empty() {
        return Err(DeformError::EmptySkeleton);
    }
    Ok(Skeleton { joints })
}

/// Unit-cylinder placement for drawing one bone in skeleton view.
///
/// The cylinder lives in the parent joint's frame, starts at the parent origin,
/// and its +Y axis is rotated onto the child offset and stretched to its length.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneVisual {
    pub parent: usize,
    pub child: usize,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

const MIN_BONE_LEN: f32 = 1e-6;
const ALIGN_COS: f32 = 0.9999;

/// Rotation taking +Y onto the unit vector `dir`.
///
/// Exact or near antiparallel input uses a fixed 180° turn about +X.
pub fn align_y_to(dir: &Vector3<f32>) -> UnitQuaternion<f32> {
    let up = Vector3::y();
    let cos_theta = up.dot(dir).clamp(-1.0, 1.0);
    if cos_theta > ALIGN_COS {
        UnitQuaternion::identity()
    } else if cos_theta < -ALIGN_COS {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
    } else {
        let axis = nalgebra::Unit::new_normalize(up.cross(dir));
        UnitQuaternion::from_axis_angle(&axis, cos_theta.acos())
    }
}

/// One visual per non-root joint with a nonzero parent offset.
pub fn bone_visuals(skeleton: &Skeleton) -> Vec<BoneVisual> {
    skeleton
        .joints
        .iter()
        .enumerate()
        .filter_map(|(child, joint)| {
            let parent = joint.parent?;
            let len = joint.translation.norm();
            if len < MIN_BONE_LEN {
                return None;
            }
            Some(BoneVisual {
                parent,
                child,
                rotation: align_y_to(&(joint.translation / len)),
                scale: Vector3::new(1.0, len, 1.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain() {
        let sk = parse_skeleton("0 0 0 -1\n0 1 0 0\n\n0 1 0 1\n").expect("parse");
        assert_eq!(sk.len(), 3);
        assert_eq!(sk.joints[0].parent, None);
        assert_eq!(sk.joints[2].parent, Some(1));
        let world = sk.world_transforms(&Isometry3::identity());
        assert!((world[2].translation.vector.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn forward_parent_rejected() {
        let err = parse_skeleton("0 0 0 -1\n0 1 0 3\n").unwrap_err();
        assert!(matches!(err, DeformError::ForwardParent { line: 2, parent: 3 }));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_skeleton("0 0 0 -1\n0 x 0 0\n").unwrap_err();
        assert!(matches!(err, DeformError::SkeletonLine { line: 2, .. }));
    }

    #[test]
    fn empty_skeleton_rejected() {
        assert!(matches!(parse_skeleton("\n\n"), Err(DeformError::EmptySkeleton)));
    }

    #[test]
    fn bone_aligns_and_stretches() {
        let sk = parse_skeleton("0 0 0 -1\n2 0 0 0\n0 0 0 1\n").expect("parse");
        let bones = bone_visuals(&sk);
        // root and the zero-offset joint are skipped
        assert_eq!(bones.len(), 1);
        let b = &bones[0];
        assert_eq!((b.parent, b.child), (0, 1));
        assert!((b.scale.y - 2.0).abs() < 1e-6);
        let mapped = b.rotation * Vector3::y();
        assert!((mapped - Vector3::x()).norm() < 1e-5);
    }

    #[test]
    fn antiparallel_bone_uses_fixed_axis() {
        let q = align_y_to(&Vector3::new(0.0, -1.0, 0.0));
        let expected = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI);
        assert!(q.angle_to(&expected) < 1e-5);
        assert!(((q * Vector3::y()) - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-5);
    }
}
