//! Moon and planets: components, spawning, and their own motion.
//!
//! | Entity          | Rapier body               | Collider                     |
//! |-----------------|---------------------------|------------------------------|
//! | moon            | `Fixed`                   | ball, reports collisions     |
//! | planet          | `KinematicPositionBased`  | none (visual body only)      |
//! | gravity field   | child of its planet       | sensor matching `FieldShape` |
//!
//! Planets travel on ellipses driven by [`PlanetOrbit`]; their field children
//! follow through the transform hierarchy.

use crate::config::{GameConfig, PlanetDef};
use crate::gravity_field::{FieldShape, GravityField};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::f32::consts::TAU;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker for entities that belong to the current run and are despawned on retry.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RunEntity;

/// A planet with a gravity field.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Planet {
    pub name: String,
    /// Visual radius of the planet body.
    pub body_radius: f32,
}

/// The moon the body launches from and must strike to win.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Moon {
    pub radius: f32,
}

/// Constant spin of the moon sprite.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MoonSpin {
    pub degrees_per_sec: f32,
}

/// Elliptical path of a planet around a fixed center.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlanetOrbit {
    pub center: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    pub angular_speed_deg: f32,
    /// Current angle in radians, kept in `[0, 2π)`.
    pub angle: f32,
    pub clockwise: bool,
}

impl PlanetOrbit {
    pub fn from_def(def: &PlanetDef) -> Self {
        Self {
            center: Vec2::from(def.orbit_center),
            radius_x: def.radius_x,
            radius_y: def.radius_y,
            angular_speed_deg: def.angular_speed_deg,
            angle: def.start_angle_deg.to_radians().rem_euclid(TAU),
            clockwise: def.clockwise,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.center
            + Vec2::new(
                self.radius_x * self.angle.cos(),
                self.radius_y * self.angle.sin(),
            )
    }

    /// Step the angle by `dt` seconds and return the new position.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        let sign = if self.clockwise { -1.0 } else { 1.0 };
        let next = self.angle + sign * self.angular_speed_deg.to_radians() * dt;
        self.angle = next.rem_euclid(TAU);
        if self.angle >= TAU {
            self.angle = 0.0;
        }
        self.position()
    }
}

// ── Spawning ───────────────────────────────────────────────────────────────────

/// Spawn the moon at the origin.
pub fn spawn_moon(commands: &mut Commands, config: &GameConfig) -> Entity {
    commands
        .spawn((
            Moon {
                radius: config.moon_radius,
            },
            MoonSpin {
                degrees_per_sec: config.moon_spin_deg_per_sec,
            },
            RunEntity,
            Transform::from_translation(Vec3::ZERO),
            Visibility::default(),
            RigidBody::Fixed,
            Collider::ball(config.moon_radius),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Spawn every planet in `config.planets`, each with its gravity-field child.
pub fn spawn_planets(commands: &mut Commands, config: &GameConfig) -> Vec<Entity> {
    config
        .planets
        .iter()
        .map(|def| spawn_planet(commands, def))
        .collect()
}

fn spawn_planet(commands: &mut Commands, def: &PlanetDef) -> Entity {
    let orbit = PlanetOrbit::from_def(def);
    let shape = FieldShape::from(def.field.shape);
    let field_transform = Transform::from_translation(Vec2::from(def.field.offset).extend(0.0))
        .with_scale(Vec2::from(def.field.scale).extend(1.0));

    let planet = commands
        .spawn((
            Planet {
                name: def.name.clone(),
                body_radius: def.body_radius,
            },
            orbit,
            RunEntity,
            Transform::from_translation(orbit.position().extend(0.0)),
            Visibility::default(),
            RigidBody::KinematicPositionBased,
        ))
        .id();

    let mut field = commands.spawn((
        GravityField,
        shape,
        shape.collider(),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        field_transform,
        Visibility::default(),
        ChildOf(planet),
    ));
    if let Some(field_config) = def.field.config {
        field.insert(field_config);
    }
    planet
}

// ── Systems ────────────────────────────────────────────────────────────────────

/// Move planets along their ellipses.
pub fn planet_orbit_system(
    time: Res<Time>,
    mut q: Query<(&mut PlanetOrbit, &mut Transform), With<Planet>>,
) {
    let dt = time.delta_secs();
    for (mut orbit, mut transform) in q.iter_mut() {
        let pos = orbit.advance(dt);
        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}

/// Rotate the moon sprite.
pub fn moon_spin_system(time: Res<Time>, mut q: Query<(&MoonSpin, &mut Transform), With<Moon>>) {
    let dt = time.delta_secs();
    for (spin, mut transform) in q.iter_mut() {
        transform.rotate_z(spin.degrees_per_sec.to_radians() * dt);
    }
}
