//! Player module: the launched body, its flight core, and the Bevy glue.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | `Player` marker, `PlanetId`, `FlightPhase`, `MoonAnchor`, `PlayerFlightState` |
//! | [`flight`] | `FlightStateMachine`: launches, captures, releases, termination |
//! | [`control`] | Input, collision, fixed-step and transform-sync systems |
//!
//! All public items are re-exported at this level so that the rest of the crate
//! can use flat `crate::player::*` imports.

pub mod control;
pub mod flight;
pub mod state;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use control::{
    flight_contact_system, flight_physics_tick_system, launch_input_system,
    planet_release_system, project_to_viewport, sync_player_transform_system, FieldOverlaps,
};
pub use flight::{FieldContact, FlightStateMachine, FlightTuning, FrameInput, PlanetLookup};
pub use state::{FlightPhase, MoonAnchor, PlanetId, Player, PlayerFlightState};

// ── Body spawn ────────────────────────────────────────────────────────────────

use crate::constants::PLAYER_RADIUS;
use crate::planet::RunEntity;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Spawn the player body at `position`.
///
/// The body is kinematic: the flight machine owns its motion and Rapier is
/// only asked to report sensor overlaps and the moon contact.  Kinematic
/// bodies do not report against fixed or other kinematic colliders by
/// default, so those pairs are enabled explicitly.
pub fn spawn_player(commands: &mut Commands, position: Vec2) -> Entity {
    commands
        .spawn((
            Player,
            RunEntity,
            RigidBody::KinematicPositionBased,
            Collider::ball(PLAYER_RADIUS),
            ActiveEvents::COLLISION_EVENTS,
            ActiveCollisionTypes::default()
                | ActiveCollisionTypes::KINEMATIC_KINEMATIC
                | ActiveCollisionTypes::KINEMATIC_STATIC,
            Transform::from_translation(position.extend(0.5)),
            Visibility::default(),
        ))
        .id()
}
