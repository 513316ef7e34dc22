//! Runtime game configuration loaded from `assets/game.toml`.
//!
//! [`GameConfig`] is a Bevy [`Resource`] that mirrors the tuneable values in
//! [`crate::constants`] and describes the planet layout.  When the app is
//! built, [`load_game_config`] reads `assets/game.toml` and replaces the
//! defaults with the file's contents.  Missing keys fall back to the compile-time defaults, so
//! a minimal TOML can override just the values you care about.
//!
//! ## Planet layout
//!
//! ```toml
//! [[planets]]
//! name = "Terra"
//! orbit_center = [0.0, 0.0]
//! radius_x = 6.0
//! radius_y = 6.0
//! angular_speed_deg = 12.0
//!
//! [planets.field]
//! shape = { kind = "circle", radius = 1.8 }
//! config = { speed_multiplier = 1.5, min_orbit_speed = 4.0 }
//! ```
//!
//! Omitting `planets.field.config` spawns a field that never captures.

use crate::constants::*;
use crate::error::{validate_extent_factor, validate_launch_speed, GameResult};
use crate::gravity_field::{FieldShape, GravityFieldConfig};
use crate::player::flight::FlightTuning;
use crate::player::state::MoonAnchor;
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

/// Path of the optional configuration file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/game.toml";

/// Runtime-tunable gameplay configuration.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // ── Moon ─────────────────────────────────────────────────────────────────
    pub launch_speed: f32,
    pub moon_radius: f32,
    pub moon_spin_deg_per_sec: f32,

    // ── Capture ──────────────────────────────────────────────────────────────
    pub reenter_delay: f32,

    // ── Termination ──────────────────────────────────────────────────────────
    pub out_of_screen_enabled: bool,
    pub screen_extent_factor: f32,
    pub out_margin: f32,
    pub success_scene_delay: f32,
    pub clear_scene: String,
    pub over_scene: String,

    // ── Leaderboard ──────────────────────────────────────────────────────────
    /// Name submitted when the name prompt is left empty.
    pub player_name: String,
    pub leaderboard_path: String,
    pub statistics_path: String,

    // ── Rendering ────────────────────────────────────────────────────────────
    pub camera_scale: f32,
    pub hud_font_size: f32,

    // ── Layout ───────────────────────────────────────────────────────────────
    pub planets: Vec<PlanetDef>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            launch_speed: LAUNCH_SPEED,
            moon_radius: MOON_RADIUS,
            moon_spin_deg_per_sec: MOON_SPIN_DEG_PER_SEC,
            reenter_delay: REENTER_DELAY_SECS,
            out_of_screen_enabled: true,
            screen_extent_factor: SCREEN_EXTENT_FACTOR,
            out_margin: OUT_MARGIN,
            success_scene_delay: SUCCESS_SCENE_DELAY_SECS,
            clear_scene: CLEAR_SCENE_NAME.to_string(),
            over_scene: OVER_SCENE_NAME.to_string(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            leaderboard_path: LEADERBOARD_PATH.to_string(),
            statistics_path: STATISTICS_PATH.to_string(),
            camera_scale: CAMERA_SCALE,
            hud_font_size: HUD_FONT_SIZE,
            planets: default_planets(),
        }
    }
}

impl GameConfig {
    /// Reject values that would make the game unplayable.
    pub fn validate(&self) -> GameResult<()> {
        validate_launch_speed(self.launch_speed)?;
        validate_extent_factor(self.screen_extent_factor)?;
        Ok(())
    }

    pub fn flight_tuning(&self) -> FlightTuning {
        FlightTuning {
            launch_speed: self.launch_speed,
            reenter_delay: self.reenter_delay.max(0.0),
            out_of_screen_enabled: self.out_of_screen_enabled,
            screen_extent_factor: self.screen_extent_factor,
            out_margin: self.out_margin,
            success_scene_delay: self.success_scene_delay.max(0.0),
        }
    }

    /// Resting spot on top of the moon at the origin.
    pub fn moon_anchor(&self) -> MoonAnchor {
        MoonAnchor::on_top(
            Vec2::ZERO,
            self.moon_radius,
            PLAYER_RADIUS + MOON_REST_GAP,
            self.moon_spin_deg_per_sec,
        )
    }
}

// ── Planet layout ─────────────────────────────────────────────────────────────

/// One planet, its elliptical path and its gravity field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanetDef {
    pub name: String,
    pub orbit_center: [f32; 2],
    pub radius_x: f32,
    pub radius_y: f32,
    pub angular_speed_deg: f32,
    pub start_angle_deg: f32,
    pub clockwise: bool,
    /// Visual radius of the planet body.
    pub body_radius: f32,
    pub field: FieldDef,
}

impl Default for PlanetDef {
    fn default() -> Self {
        Self {
            name: "Planet".to_string(),
            orbit_center: [0.0, 0.0],
            radius_x: 6.0,
            radius_y: 6.0,
            angular_speed_deg: 10.0,
            start_angle_deg: 0.0,
            clockwise: false,
            body_radius: 0.5,
            field: FieldDef::default(),
        }
    }
}

/// A gravity field relative to its planet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    pub shape: ShapeDef,
    /// Local offset of the field origin from the planet center.
    pub offset: [f32; 2],
    pub scale: [f32; 2],
    /// Absent in TOML means the field carries no config.
    #[serde(default)]
    pub config: Option<GravityFieldConfig>,
}

impl Default for FieldDef {
    fn default() -> Self {
        Self {
            shape: ShapeDef::Circle { radius: 1.5 },
            offset: [0.0, 0.0],
            scale: [1.0, 1.0],
            config: Some(GravityFieldConfig::default()),
        }
    }
}

/// TOML spelling of a [`FieldShape`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDef {
    Circle { radius: f32 },
    Capsule { size: [f32; 2] },
    Box { size: [f32; 2] },
    Bounds { extents: [f32; 2] },
}

impl From<ShapeDef> for FieldShape {
    fn from(def: ShapeDef) -> Self {
        match def {
            ShapeDef::Circle { radius } => FieldShape::Circle { radius },
            ShapeDef::Capsule { size } => FieldShape::Capsule { size: size.into() },
            ShapeDef::Box { size } => FieldShape::Box { size: size.into() },
            ShapeDef::Bounds { extents } => FieldShape::BoundsFallback {
                extents: extents.into(),
            },
        }
    }
}

fn default_planets() -> Vec<PlanetDef> {
    vec![
        PlanetDef {
            name: "Terra".to_string(),
            radius_x: 6.0,
            radius_y: 6.0,
            angular_speed_deg: 12.0,
            start_angle_deg: 0.0,
            body_radius: 0.6,
            field: FieldDef {
                shape: ShapeDef::Circle { radius: 1.8 },
                config: Some(GravityFieldConfig {
                    speed_multiplier: 1.5,
                    min_orbit_speed: 4.0,
                }),
                ..default()
            },
            ..default()
        },
        PlanetDef {
            name: "Ember".to_string(),
            radius_x: 9.0,
            radius_y: 5.5,
            angular_speed_deg: 8.0,
            start_angle_deg: 140.0,
            clockwise: true,
            body_radius: 0.5,
            field: FieldDef {
                shape: ShapeDef::Capsule { size: [3.0, 3.6] },
                config: Some(GravityFieldConfig {
                    speed_multiplier: 1.3,
                    min_orbit_speed: 6.0,
                }),
                ..default()
            },
            ..default()
        },
        PlanetDef {
            name: "Frost".to_string(),
            radius_x: 4.0,
            radius_y: 4.0,
            angular_speed_deg: 18.0,
            start_angle_deg: 250.0,
            body_radius: 0.4,
            field: FieldDef {
                shape: ShapeDef::Box { size: [2.6, 2.6] },
                config: Some(GravityFieldConfig {
                    speed_multiplier: 1.8,
                    min_orbit_speed: 3.0,
                }),
                ..default()
            },
            ..default()
        },
    ]
}

/// Read `assets/game.toml` into a [`GameConfig`].
///
/// Called while the app is built, before the first run spawns on the initial
/// `OnEnter(Playing)`.  A missing file keeps the defaults.  A file that fails to
/// parse or validate is reported and ignored.
pub fn load_game_config() -> GameConfig {
    load_game_config_from(Path::new(CONFIG_PATH))
}

pub fn load_game_config_from(path: &Path) -> GameConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => {
            info!("No {} found; using compiled defaults", path.display());
            return GameConfig::default();
        }
    };
    match toml::from_str::<GameConfig>(&contents) {
        Ok(loaded) => match loaded.validate() {
            Ok(()) => {
                info!(
                    "Loaded game config from {} ({} planets)",
                    path.display(),
                    loaded.planets.len()
                );
                loaded
            }
            Err(e) => {
                warn!("Rejected {}: {e}; using defaults", path.display());
                GameConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to parse {}: {e}; using defaults", path.display());
            GameConfig::default()
        }
    }
}
