//! Player flight state.
//!
//! [`PlayerFlightState`] is the complete mutable simulation state of the
//! controlled body.  It is owned exclusively by
//! [`super::flight::FlightStateMachine`]; every other module sees it through a
//! shared borrow.
//!
//! ## Lifecycle
//!
//! - Created at run start in [`FlightPhase::OnMoon`] with zero velocity.
//! - Mutated on every physics tick and on every launch / capture event.
//! - Frozen the instant `game_ended` latches.
//! - Discarded on retry; a new run never reuses the old instance.

use crate::constants::INITIAL_ORBIT_SPEED;
use crate::orbit::OrbitParams;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player body entity.
#[derive(Component)]
pub struct Player;

// ── Identifiers ────────────────────────────────────────────────────────────────

/// Non-owning handle to a planet.
///
/// The Bevy driver derives it from `Entity::to_bits`, so a despawned planet's
/// id simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanetId(pub u64);

impl From<Entity> for PlanetId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

// ── Phase ──────────────────────────────────────────────────────────────────────

/// Discrete flight phase.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightPhase {
    /// Resting on the moon surface, riding its spin.
    #[default]
    OnMoon,
    /// Free straight-line flight.
    Flying,
    /// Captured by a planet's gravity field.
    OrbitingPlanet,
}

impl FlightPhase {
    /// Short label used by the HUD.
    pub fn label(self) -> &'static str {
        match self {
            FlightPhase::OnMoon => "ON MOON",
            FlightPhase::Flying => "FLYING",
            FlightPhase::OrbitingPlanet => "ORBITING",
        }
    }
}

// ── Moon anchor ────────────────────────────────────────────────────────────────

/// Where the body rests on the moon before launch.
///
/// The body rides the moon's spin: `offset` is rotated by `spin_rad_per_sec`
/// every frame while the phase is `OnMoon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonAnchor {
    pub center: Vec2,
    /// Body position relative to `center`.
    pub offset: Vec2,
    /// Signed spin rate; positive is counter-clockwise.
    pub spin_rad_per_sec: f32,
}

impl MoonAnchor {
    /// Resting position on top of a moon of `radius`, lifted by `clearance`.
    pub fn on_top(center: Vec2, radius: f32, clearance: f32, spin_deg_per_sec: f32) -> Self {
        Self {
            center,
            offset: Vec2::new(0.0, radius + clearance),
            spin_rad_per_sec: spin_deg_per_sec.to_radians(),
        }
    }

    /// Rotate the resting offset by the spin accumulated over `dt`.
    pub fn spin(&mut self, dt: f32) {
        self.offset = Vec2::from_angle(self.spin_rad_per_sec * dt).rotate(self.offset);
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.center + self.offset
    }
}

// ── State ──────────────────────────────────────────────────────────────────────

/// Mutable simulation state of the controlled body for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFlightState {
    pub phase: FlightPhase,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Planet currently captured; `Some` only while `OrbitingPlanet`.
    pub orbit_target: Option<PlanetId>,
    /// Orbit geometry; recomputed on each capture, advanced each physics tick.
    pub orbit: Option<OrbitParams>,
    /// Tangential speed; the score source.
    pub current_orbit_speed: f32,
    /// Highest speed reached since leaving the moon; the floor for the next capture.
    pub peak_speed: f32,
    /// Planet whose field is temporarily ignored after a launch from it.
    pub ignored_planet: Option<PlanetId>,
    /// Run-clock time (seconds) at which `ignored_planet` expires.
    pub ignored_until: f32,
    pub has_launched_from_moon: bool,
    /// Terminal latch: once set no transition, check or score write happens.
    pub game_ended: bool,
    pub moon_anchor: MoonAnchor,
}

impl PlayerFlightState {
    /// Fresh run state resting on the moon.
    pub fn new(moon_anchor: MoonAnchor) -> Self {
        Self {
            phase: FlightPhase::OnMoon,
            position: moon_anchor.position(),
            velocity: Vec2::ZERO,
            orbit_target: None,
            orbit: None,
            current_orbit_speed: INITIAL_ORBIT_SPEED,
            peak_speed: 0.0,
            ignored_planet: None,
            ignored_until: 0.0,
            has_launched_from_moon: false,
            game_ended: false,
            moon_anchor,
        }
    }

    /// Forget any ignored planet.
    #[inline]
    pub fn clear_ignore(&mut self) {
        self.ignored_planet = None;
        self.ignored_until = 0.0;
    }

    /// `true` while `planet` is still inside its re-entry window at `now`.
    #[inline]
    pub fn is_ignoring(&self, planet: PlanetId, now: f32) -> bool {
        self.ignored_planet == Some(planet) && now < self.ignored_until
    }
}
