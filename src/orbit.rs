//! Orbit engine: capture geometry and exact circular orbit stepping.
//!
//! ## Capture (`enter_orbit`)
//!
//! Given the body's position and velocity at the instant it overlaps a gravity
//! field, the engine computes:
//!
//! 1. The radial unit vector from planet center to body (degenerate → velocity
//!    direction → `+X`).
//! 2. The orbit direction from the sign of `radial × velocity_dir`.
//! 3. The orbit radius from the field geometry, falling back to the current
//!    body–center distance and floored at [`ORBIT_RADIUS_EPSILON`].
//! 4. The snapped position on the orbit circle.
//! 5. The boosted speed `max(|v| · multiplier, min_orbit_speed, prior_peak)`.
//! 6. The angular speed `speed / radius`, capped at one revolution per
//!    [`MIN_REVOLUTION_SECS`]; when capped, speed is recomputed from it.
//!
//! The engine is pure: it returns [`OrbitParams`] and the caller applies them.
//!
//! ## Stepping (`advance_orbit`)
//!
//! The orbit is parametrised exactly (`center + r·(cos θ, sin θ)`), so the body
//! never drifts off the circle regardless of step size.

use crate::constants::{
    DEGENERATE_RADIAL_SQ, DEGENERATE_VELOCITY_SQ, MIN_REVOLUTION_SECS, ORBIT_RADIUS_EPSILON,
};
use crate::geometry::{angle_of, direction_sign, normalize_or, tangent_at, unit_at, wrap_angle};
use crate::gravity_field::{FieldGeometry, GravityFieldConfig};
use bevy::math::Vec2;
use std::f32::consts::TAU;

/// Highest angular speed (rad/s) an orbit may reach.
pub const MAX_ANGULAR_SPEED: f32 = TAU / MIN_REVOLUTION_SECS;

/// Result of a capture, plus the running angle while orbiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    /// Planet center at capture time; refreshed by [`advance_orbit`].
    pub center: Vec2,
    pub radius: f32,
    /// Current angle of the body around the center, in `[0, 2π)` after the first step.
    pub angle: f32,
    /// Angular speed magnitude (rad/s), never above [`MAX_ANGULAR_SPEED`].
    pub angular_speed: f32,
    /// `+1` counter-clockwise, `-1` clockwise.
    pub direction: i8,
    /// Tangential speed; always `angular_speed * radius`.
    pub speed: f32,
    /// Speed magnitude the body had when it entered the field.
    pub entry_speed: f32,
    /// Where the body sits on the orbit circle right after capture.
    pub snapped_position: Vec2,
}

impl OrbitParams {
    /// Instantaneous tangential velocity at the current angle.
    pub fn tangential_velocity(&self) -> Vec2 {
        tangent_at(self.angle) * self.speed * f32::from(self.direction)
    }
}

/// Orbit radius measured from the planet center to the field's capture boundary.
///
/// Returns `None` when the field's effective radius is not positive; callers
/// fall back to the body–planet distance in that case.
pub fn compute_orbit_radius(geometry: &FieldGeometry, planet_center: Vec2) -> Option<f32> {
    let radius = geometry.shape.bounding_radius(geometry.scale);
    if radius <= 0.0 || !radius.is_finite() {
        return None;
    }
    Some(radius + geometry.origin.distance(planet_center))
}

/// Compute the orbit a body settles into when captured by a field.
pub fn enter_orbit(
    body_position: Vec2,
    body_velocity: Vec2,
    planet_center: Vec2,
    geometry: &FieldGeometry,
    config: &GravityFieldConfig,
    prior_peak_speed: f32,
) -> OrbitParams {
    let entry_speed = body_velocity.length();
    let velocity_dir = normalize_or(body_velocity, DEGENERATE_VELOCITY_SQ, Vec2::ZERO);

    let from_center = body_position - planet_center;
    let radial_fallback = if velocity_dir == Vec2::ZERO {
        Vec2::X
    } else {
        velocity_dir
    };
    let radial_dir = normalize_or(from_center, DEGENERATE_RADIAL_SQ, radial_fallback);

    // Without a usable velocity, enter counter-clockwise.
    let heading = if velocity_dir == Vec2::ZERO {
        radial_dir.perp()
    } else {
        velocity_dir
    };
    let direction = direction_sign(radial_dir, heading);

    let radius = compute_orbit_radius(geometry, planet_center)
        .unwrap_or_else(|| from_center.length())
        .max(ORBIT_RADIUS_EPSILON);

    let boosted = entry_speed * config.speed_multiplier;
    let mut speed = boosted.max(config.min_orbit_speed).max(prior_peak_speed);

    let mut angular_speed = speed / radius;
    if angular_speed > MAX_ANGULAR_SPEED {
        angular_speed = MAX_ANGULAR_SPEED;
        speed = angular_speed * radius;
    }

    OrbitParams {
        center: planet_center,
        radius,
        angle: angle_of(radial_dir),
        angular_speed,
        direction,
        speed,
        entry_speed,
        snapped_position: planet_center + radial_dir * radius,
    }
}

/// Advance an orbit by `dt` around the planet's current `center`.
///
/// Returns the new `(position, velocity)`.
pub fn advance_orbit(params: &mut OrbitParams, center: Vec2, dt: f32) -> (Vec2, Vec2) {
    params.center = center;
    params.angle = wrap_angle(
        params.angle + params.angular_speed * f32::from(params.direction) * dt,
    );
    let position = center + unit_at(params.angle) * params.radius;
    (position, params.tangential_velocity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity_field::FieldShape;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn circle_field(origin: Vec2, radius: f32) -> FieldGeometry {
        FieldGeometry::centered(FieldShape::Circle { radius }, origin)
    }

    fn config(multiplier: f32, floor: f32) -> GravityFieldConfig {
        GravityFieldConfig {
            speed_multiplier: multiplier,
            min_orbit_speed: floor,
        }
    }

    #[test]
    fn radius_adds_field_offset_from_planet() {
        let geometry = FieldGeometry {
            shape: FieldShape::Circle { radius: 2.0 },
            scale: Vec2::new(1.0, 1.5),
            origin: Vec2::new(3.0, 4.0),
        };
        let r = compute_orbit_radius(&geometry, Vec2::ZERO).unwrap();
        assert_relative_eq!(r, 3.0 + 5.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_shape_is_invalid() {
        let geometry = circle_field(Vec2::ZERO, 0.0);
        assert_eq!(compute_orbit_radius(&geometry, Vec2::ZERO), None);
    }

    #[test]
    fn invalid_shape_falls_back_to_body_distance() {
        let planet = Vec2::new(5.0, 0.0);
        let params = enter_orbit(
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 4.0),
            planet,
            &circle_field(planet, -1.0),
            &config(1.0, 0.0),
            0.0,
        );
        assert_relative_eq!(params.radius, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn body_at_center_uses_velocity_direction() {
        let planet = Vec2::new(1.0, 1.0);
        let params = enter_orbit(
            planet,
            Vec2::new(0.0, 2.0),
            planet,
            &circle_field(planet, 2.0),
            &config(1.0, 0.0),
            0.0,
        );
        assert_relative_eq!(params.snapped_position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(params.snapped_position.y, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn body_at_center_without_velocity_uses_x_axis() {
        let planet = Vec2::ZERO;
        let params = enter_orbit(
            planet,
            Vec2::ZERO,
            planet,
            &circle_field(planet, 2.0),
            &config(1.5, 1.0),
            0.0,
        );
        assert_relative_eq!(params.angle, 0.0, epsilon = 1e-6);
        assert_eq!(params.direction, 1);
        assert_relative_eq!(params.speed, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn entry_cross_product_sets_direction() {
        let planet = Vec2::ZERO;
        let field = circle_field(planet, 2.0);
        let ccw = enter_orbit(
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 1.0),
            planet,
            &field,
            &config(1.0, 0.0),
            0.0,
        );
        let cw = enter_orbit(
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, -1.0),
            planet,
            &field,
            &config(1.0, 0.0),
            0.0,
        );
        assert_eq!(ccw.direction, 1);
        assert_eq!(cw.direction, -1);
    }

    #[test]
    fn tiny_radius_caps_angular_speed_and_rescales_speed() {
        let planet = Vec2::ZERO;
        let params = enter_orbit(
            Vec2::new(0.1, 0.0),
            Vec2::new(0.0, 50.0),
            planet,
            &circle_field(planet, 0.1),
            &config(2.0, 0.0),
            0.0,
        );
        assert_relative_eq!(params.angular_speed, MAX_ANGULAR_SPEED, epsilon = 1e-4);
        assert_relative_eq!(params.speed, MAX_ANGULAR_SPEED * 0.1, epsilon = 1e-4);
    }

    #[test]
    fn orbit_velocity_is_tangent_with_direction() {
        let planet = Vec2::ZERO;
        let mut params = enter_orbit(
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, -3.0),
            planet,
            &circle_field(planet, 2.0),
            &config(1.0, 0.0),
            0.0,
        );
        let (pos, vel) = advance_orbit(&mut params, planet, 0.0);
        assert_relative_eq!(pos.dot(vel), 0.0, epsilon = 1e-4);
        assert!(vel.y < 0.0, "clockwise orbit at +X must move toward -Y");
        assert_relative_eq!(vel.length(), 3.0, epsilon = 1e-4);
    }

    proptest! {
        #[test]
        fn capture_speed_respects_every_floor(
            speed in 0.0f32..200.0,
            multiplier in 0.0f32..4.0,
            floor in 0.0f32..30.0,
            peak in 0.0f32..60.0,
            field_radius in 0.5f32..6.0,
        ) {
            let planet = Vec2::new(5.0, 0.0);
            let params = enter_orbit(
                Vec2::new(5.0 - field_radius, 0.3),
                Vec2::new(speed, 0.0),
                planet,
                &circle_field(planet, field_radius),
                &config(multiplier, floor),
                peak,
            );
            let floor_speed = peak.max(floor);
            let uncapped = (speed * multiplier).max(floor_speed);
            if uncapped / params.radius <= MAX_ANGULAR_SPEED {
                prop_assert!(params.speed >= floor_speed - 1e-3);
                prop_assert!((params.speed - uncapped).abs() <= 1e-3 * uncapped.max(1.0));
            } else {
                prop_assert!((params.speed - MAX_ANGULAR_SPEED * params.radius).abs() < 1e-2);
            }
            prop_assert!(params.angular_speed <= MAX_ANGULAR_SPEED + 1e-4);
        }

        #[test]
        fn stepping_never_leaves_the_circle(
            angle in 0.0f32..TAU,
            radius in 0.1f32..50.0,
            speed in 0.1f32..100.0,
            dt in 0.001f32..0.2,
            steps in 1usize..400,
        ) {
            let center = Vec2::new(-3.0, 7.0);
            let mut params = enter_orbit(
                center + unit_at(angle) * radius,
                tangent_at(angle) * speed,
                center,
                &circle_field(center, radius),
                &config(1.0, 0.0),
                0.0,
            );
            for _ in 0..steps {
                let (pos, _) = advance_orbit(&mut params, center, dt);
                let drift = (pos.distance(center) - params.radius).abs();
                prop_assert!(drift <= 1e-4 * radius.max(1.0));
                prop_assert!((0.0..TAU).contains(&params.angle));
            }
        }
    }
}
