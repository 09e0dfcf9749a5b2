//! Interpolation helpers:
//! - lerp_f32 (scalar blend)
//! - ease_out_cubic (fast start, slow finish)
//! - slerp with an NLERP fallback for nearly identical rotations
//! - axis-angle constructors in degrees

use nalgebra::{UnitQuaternion, Vector3};

/// Below this sine of the half-angle slerp is numerically unstable.
const SLERP_EPSILON: f32 = 1e-6;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// `1 - (1 - t)^3`, with `t` clamped to [0, 1].
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Shortest-arc spherical interpolation.
#[inline]
pub fn slerp(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    a.try_slerp(b, t, SLERP_EPSILON)
        .unwrap_or_else(|| a.nlerp(b, t))
}

#[inline]
pub fn pitch_deg(deg: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), deg.to_radians())
}

#[inline]
pub fn yaw_deg(deg: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), deg.to_radians())
}

#[inline]
pub fn roll_deg(deg: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), deg.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn slerp_hits_endpoints_and_midpoint() {
        let a = UnitQuaternion::identity();
        let b = yaw_deg(40.0);
        assert!(slerp(&a, &b, 0.0).angle_to(&a) < 1e-5);
        assert!(slerp(&a, &b, 1.0).angle_to(&b) < 1e-5);
        let mid = slerp(&a, &b, 0.5);
        assert!(mid.angle_to(&yaw_deg(20.0)) < 1e-5);
    }

    #[test]
    fn slerp_of_equal_rotations_is_stable() {
        let q = pitch_deg(10.0);
        let out = slerp(&q, &q, 0.3);
        assert!(out.angle_to(&q) < 1e-6);
    }
}
