//! Rendering systems: the flight HUD and gizmo drawing of the play field.
//!
//! ## Layer Model
//!
//! | Layer           | Technology | Source                                  |
//! |-----------------|------------|-----------------------------------------|
//! | Moon            | Gizmos     | `Moon` + `Transform` (spoke shows spin) |
//! | Planets         | Gizmos     | `Planet::body_radius`                   |
//! | Gravity fields  | Gizmos     | `FieldShape` + `GlobalTransform`        |
//! | Capture orbit   | Gizmos     | `FlightStateMachine` orbit params       |
//! | Player body     | Gizmos     | `FlightStateMachine` position/velocity  |
//! | Flight HUD      | Bevy UI    | speed + phase text                      |
//! | Shatter burst   | `Mesh2d`   | [`crate::particles`]                    |
//!
//! ## System Responsibilities
//!
//! | System                  | Schedule | Purpose                         |
//! |-------------------------|----------|---------------------------------|
//! | `setup_hud`             | Startup  | Spawn the permanent HUD node    |
//! | `hud_display_system`    | Update   | Refresh speed and phase text    |
//! | `gizmo_rendering_system`| Update   | Draw moon, planets, fields, body|

use crate::config::GameConfig;
use crate::constants::PLAYER_RADIUS;
use crate::gravity_field::{FieldShape, GravityField, GravityFieldConfig};
use crate::planet::{Moon, Planet};
use crate::player::{FlightPhase, FlightStateMachine};
use bevy::prelude::*;

// ── Component markers ─────────────────────────────────────────────────────────

/// Marker for the permanent flight HUD node.
#[derive(Component)]
pub struct HudFlightDisplay;

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, (hud_display_system, gizmo_rendering_system));
    }
}

// ── HUD ───────────────────────────────────────────────────────────────────────

/// Spawn the permanent flight HUD in the top-left corner.
pub fn setup_hud(mut commands: Commands, config: Res<GameConfig>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudFlightDisplay,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(hud_text(FlightPhase::OnMoon, 0.0)),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
            ));
        });
}

/// HUD line for the given phase and orbit speed.
pub fn hud_text(phase: FlightPhase, speed: f32) -> String {
    match phase {
        FlightPhase::OnMoon => "ON MOON  |  SPACE to launch".to_string(),
        _ => format!("{}  |  Speed: {:.2}", phase.label(), speed),
    }
}

/// Refresh the HUD text from the flight machine.
pub fn hud_display_system(
    machine: Option<Res<FlightStateMachine>>,
    parent_query: Query<&Children, With<HudFlightDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    let Some(machine) = machine else {
        return;
    };
    if !machine.is_changed() {
        return;
    }
    let line = hud_text(machine.phase(), machine.state().current_orbit_speed);
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(line.clone());
            }
        }
    }
}

// ── Gizmos ────────────────────────────────────────────────────────────────────

fn moon_color() -> Color {
    Color::srgb(0.85, 0.85, 0.92)
}
fn planet_color() -> Color {
    Color::srgb(0.35, 0.65, 1.0)
}
fn field_color(capturable: bool) -> Color {
    if capturable {
        Color::srgba(0.30, 0.90, 0.60, 0.45)
    } else {
        Color::srgba(0.50, 0.50, 0.55, 0.30)
    }
}
fn orbit_color() -> Color {
    Color::srgba(1.0, 0.85, 0.30, 0.6)
}
fn player_color() -> Color {
    Color::srgb(1.0, 0.45, 0.25)
}

/// Draw the moon, planets, field outlines, the active orbit and the body.
#[allow(clippy::type_complexity)]
pub fn gizmo_rendering_system(
    mut gizmos: Gizmos,
    moons: Query<(&Moon, &Transform)>,
    planets: Query<(&Planet, &Transform)>,
    fields: Query<(&FieldShape, &GlobalTransform, Option<&GravityFieldConfig>), With<GravityField>>,
    machine: Option<Res<FlightStateMachine>>,
) {
    for (moon, transform) in moons.iter() {
        let pos = transform.translation.truncate();
        gizmos.circle_2d(pos, moon.radius, moon_color());
        let spoke = transform.rotation.mul_vec3(Vec3::Y).truncate() * moon.radius;
        gizmos.line_2d(pos, pos + spoke, moon_color());
    }

    for (planet, transform) in planets.iter() {
        gizmos.circle_2d(
            transform.translation.truncate(),
            planet.body_radius,
            planet_color(),
        );
    }

    for (shape, global, config) in fields.iter() {
        let (scale, _, translation) = global.to_scale_rotation_translation();
        let origin = translation.truncate();
        let color = field_color(config.is_some());
        match *shape {
            FieldShape::Box { size } => {
                gizmos.rect_2d(origin, size * scale.truncate(), color);
            }
            FieldShape::BoundsFallback { extents } => {
                gizmos.rect_2d(origin, extents * 2.0, color);
            }
            _ => {
                gizmos.circle_2d(origin, shape.bounding_radius(scale.truncate()), color);
            }
        }
    }

    let Some(machine) = machine else {
        return;
    };
    let state = machine.state();
    if let Some(orbit) = state.orbit.as_ref() {
        gizmos.circle_2d(orbit.center, orbit.radius, orbit_color());
    }
    gizmos.circle_2d(state.position, PLAYER_RADIUS, player_color());
    if state.velocity.length_squared() > 1e-4 {
        gizmos.line_2d(
            state.position,
            state.position + state.velocity * 0.1,
            player_color(),
        );
    }
}
