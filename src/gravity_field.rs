//! Gravity-field descriptors attached to planets.
//!
//! A gravity field is a Rapier **sensor** parented to a planet.  The field
//! carries a [`GravityFieldConfig`] (how much it boosts a captured body) and a
//! [`FieldShape`] (what its capture boundary looks like).  Both are read-only to
//! the flight core for the whole run.

use crate::constants::{DEFAULT_MIN_ORBIT_SPEED, DEFAULT_SPEED_MULTIPLIER};
use crate::geometry::max_axis_scale;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Collider;
use serde::Deserialize;

/// Marker component for gravity-field sensor entities.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GravityField;

/// Per-planet capture tuning.
///
/// - `speed_multiplier` (≥ 0, usually > 1) amplifies the speed the body enters with.
/// - `min_orbit_speed` is the floor applied after multiplication.
#[derive(Component, Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GravityFieldConfig {
    pub speed_multiplier: f32,
    pub min_orbit_speed: f32,
}

impl Default for GravityFieldConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            min_orbit_speed: DEFAULT_MIN_ORBIT_SPEED,
        }
    }
}

impl GravityFieldConfig {
    /// Clamp negative multipliers to zero; a field can stall a body but never
    /// reverse it.
    pub fn sanitized(self) -> Self {
        Self {
            speed_multiplier: self.speed_multiplier.max(0.0),
            min_orbit_speed: self.min_orbit_speed.max(0.0),
        }
    }
}

/// Capture-boundary shape of a gravity field, in the field's local space.
///
/// Every variant is reduced to a bounding circle by [`FieldShape::bounding_radius`].
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum FieldShape {
    /// Circle of the given local radius.
    Circle { radius: f32 },
    /// Capsule with full width/height `size`; bounded by half its longer side.
    Capsule { size: Vec2 },
    /// Box with full width/height `size`; bounded by half its longer side.
    Box { size: Vec2 },
    /// Arbitrary shape known only by its world-space half extents.
    BoundsFallback { extents: Vec2 },
}

impl FieldShape {
    /// Bounding radius of the shape after applying `scale`.
    ///
    /// Non-uniform scale uses the larger axis.  `BoundsFallback` extents are
    /// already world-space and ignore `scale`.
    pub fn bounding_radius(&self, scale: Vec2) -> f32 {
        match *self {
            FieldShape::Circle { radius } => radius * max_axis_scale(scale),
            FieldShape::Capsule { size } | FieldShape::Box { size } => {
                size.x.max(size.y) * 0.5 * max_axis_scale(scale)
            }
            FieldShape::BoundsFallback { extents } => extents.x.max(extents.y),
        }
    }

    /// Rapier sensor collider matching this shape in local space.
    pub fn collider(&self) -> Collider {
        match *self {
            FieldShape::Circle { radius } => Collider::ball(radius.max(0.0)),
            FieldShape::Capsule { size } => {
                let radius = (size.x.min(size.y) * 0.5).max(0.0);
                let half_segment = (size.x.max(size.y) * 0.5 - radius).max(0.0);
                if size.y >= size.x {
                    Collider::capsule_y(half_segment, radius)
                } else {
                    Collider::capsule_x(half_segment, radius)
                }
            }
            FieldShape::Box { size } => {
                Collider::cuboid((size.x * 0.5).max(0.0), (size.y * 0.5).max(0.0))
            }
            FieldShape::BoundsFallback { extents } => {
                Collider::cuboid(extents.x.max(0.0), extents.y.max(0.0))
            }
        }
    }
}

/// World pose of a gravity field at the instant of capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometry {
    pub shape: FieldShape,
    /// Accumulated (lossy) world scale of the field.
    pub scale: Vec2,
    /// World position of the field's own origin; may be offset from the planet.
    pub origin: Vec2,
}

impl FieldGeometry {
    /// Unscaled field centred on `origin`.
    pub fn centered(shape: FieldShape, origin: Vec2) -> Self {
        Self {
            shape,
            scale: Vec2::ONE,
            origin,
        }
    }

    /// Build from a field entity's global transform.
    pub fn from_global(shape: FieldShape, transform: &GlobalTransform) -> Self {
        let (scale, _rotation, translation) = transform.to_scale_rotation_translation();
        Self {
            shape,
            scale: scale.truncate(),
            origin: translation.truncate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_uses_larger_scale_axis() {
        let shape = FieldShape::Circle { radius: 2.0 };
        assert_eq!(shape.bounding_radius(Vec2::new(1.0, 3.0)), 6.0);
        assert_eq!(shape.bounding_radius(Vec2::new(0.5, 0.25)), 1.0);
    }

    #[test]
    fn capsule_and_box_use_half_longest_side() {
        let size = Vec2::new(2.0, 5.0);
        assert_eq!(FieldShape::Capsule { size }.bounding_radius(Vec2::ONE), 2.5);
        assert_eq!(FieldShape::Box { size }.bounding_radius(Vec2::splat(2.0)), 5.0);
    }

    #[test]
    fn bounds_fallback_ignores_scale() {
        let shape = FieldShape::BoundsFallback {
            extents: Vec2::new(1.5, 4.0),
        };
        assert_eq!(shape.bounding_radius(Vec2::splat(10.0)), 4.0);
    }

    #[test]
    fn negative_multiplier_is_clamped() {
        let cfg = GravityFieldConfig {
            speed_multiplier: -2.0,
            min_orbit_speed: 1.0,
        }
        .sanitized();
        assert_eq!(cfg.speed_multiplier, 0.0);
        assert_eq!(cfg.min_orbit_speed, 1.0);
    }
}
