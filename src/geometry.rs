//! Small 2D vector helpers shared by the orbit engine and the flight core.

use bevy::math::Vec2;
use std::f32::consts::TAU;

/// Z component of the 3D cross product of two planar vectors.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Orbit direction implied by moving along `velocity_dir` at `radial_dir`.
///
/// `+1` is counter-clockwise, `-1` clockwise.  A zero cross product (radial
/// entry) resolves to counter-clockwise.
#[inline]
pub fn direction_sign(radial_dir: Vec2, velocity_dir: Vec2) -> i8 {
    if cross(radial_dir, velocity_dir) >= 0.0 {
        1
    } else {
        -1
    }
}

/// Unit vector along `v`, or `fallback` when `v` is shorter than `sqrt(min_len_sq)`.
#[inline]
pub fn normalize_or(v: Vec2, min_len_sq: f32, fallback: Vec2) -> Vec2 {
    if v.length_squared() < min_len_sq {
        fallback
    } else {
        v.normalize()
    }
}

/// Polar angle of `v` in radians, in `(-π, π]`.
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Point on the unit circle at `angle`.
#[inline]
pub fn unit_at(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Counter-clockwise unit tangent of the unit circle at `angle`.
#[inline]
pub fn tangent_at(angle: f32) -> Vec2 {
    Vec2::new(-angle.sin(), angle.cos())
}

/// Larger absolute axis of a 2D scale, so a non-uniformly scaled shape is
/// never treated as smaller than it is drawn.
#[inline]
pub fn max_axis_scale(scale: Vec2) -> f32 {
    scale.x.abs().max(scale.y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cross_sign_picks_rotation_sense() {
        assert_eq!(direction_sign(Vec2::X, Vec2::Y), 1);
        assert_eq!(direction_sign(Vec2::X, -Vec2::Y), -1);
        // Purely radial entry counts as CCW.
        assert_eq!(direction_sign(Vec2::X, Vec2::X), 1);
    }

    #[test]
    fn normalize_or_uses_fallback_for_tiny_vectors() {
        assert_eq!(normalize_or(Vec2::ZERO, 1e-6, Vec2::Y), Vec2::Y);
        assert_eq!(normalize_or(Vec2::new(3.0, 0.0), 1e-6, Vec2::Y), Vec2::X);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        assert_relative_eq!(wrap_angle(-0.5), TAU - 0.5, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(TAU + 0.25), 0.25, epsilon = 1e-5);
        for raw in [-100.0_f32, -TAU, 0.0, 3.0, TAU, 57.0] {
            let w = wrap_angle(raw);
            assert!((0.0..TAU).contains(&w), "{raw} wrapped to {w}");
        }
    }

    #[test]
    fn tangent_is_perpendicular_to_radius() {
        for i in 0..16 {
            let a = i as f32 * 0.4;
            assert_relative_eq!(unit_at(a).dot(tangent_at(a)), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn max_axis_scale_ignores_mirroring() {
        assert_eq!(max_axis_scale(Vec2::new(-3.0, 2.0)), 3.0);
    }
}
