//! Flight state machine: launches, captures, releases and run termination.
//!
//! ## Transitions
//!
//! | From             | Trigger                        | To               |
//! |------------------|--------------------------------|------------------|
//! | `OnMoon`         | launch                         | `Flying`         |
//! | `Flying`         | field overlap (not ignored)    | `OrbitingPlanet` |
//! | `OrbitingPlanet` | launch                         | `Flying`         |
//! | `OrbitingPlanet` | captured planet removed        | `Flying`         |
//! | any              | moon hit after moon launch     | ended (latched)  |
//! | any              | beyond the viewport extent     | ended (latched)  |
//!
//! `game_ended` is checked at the top of every entry point, so a finished run
//! is inert apart from its pending scene timer.
//!
//! ## Entry points
//!
//! The machine contains no loop or timing source.  The driver calls
//! [`FlightStateMachine::on_frame`] once per rendered frame and
//! [`FlightStateMachine::on_physics_tick`] once per fixed physics step, and
//! forwards sensor overlaps and moon contacts as they are detected.

use super::state::{FlightPhase, MoonAnchor, PlanetId, PlayerFlightState};
use crate::constants::{
    LAUNCH_SPEED, OUT_MARGIN, REENTER_DELAY_SECS, SCREEN_EXTENT_FACTOR, SUCCESS_SCENE_DELAY_SECS,
};
use crate::gravity_field::{FieldGeometry, GravityFieldConfig};
use crate::orbit::{advance_orbit, enter_orbit};
use crate::termination::{
    check_out_of_bounds, Collaborators, FinalScore, Outcome, Terminator, ViewportPoint,
};
use bevy::prelude::*;
use std::collections::HashMap;

// ── Inputs ─────────────────────────────────────────────────────────────────────

/// Flight tuning that stays fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightTuning {
    pub launch_speed: f32,
    /// Seconds a just-released planet cannot re-capture the body.
    pub reenter_delay: f32,
    pub out_of_screen_enabled: bool,
    pub screen_extent_factor: f32,
    pub out_margin: f32,
    /// Delay before the success scene request, letting the shatter play out.
    pub success_scene_delay: f32,
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self {
            launch_speed: LAUNCH_SPEED,
            reenter_delay: REENTER_DELAY_SECS,
            out_of_screen_enabled: true,
            screen_extent_factor: SCREEN_EXTENT_FACTOR,
            out_margin: OUT_MARGIN,
            success_scene_delay: SUCCESS_SCENE_DELAY_SECS,
        }
    }
}

/// Everything the driver observed this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Edge-triggered launch press; consumed once.
    pub launch: bool,
    /// The body's projected viewport position, if the camera could project it.
    pub viewport: Option<ViewportPoint>,
}

/// A gravity-field overlap as seen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldContact {
    /// Owning planet; `None` when the field has no planet parent.
    pub planet: Option<PlanetId>,
    pub planet_name: String,
    pub planet_center: Vec2,
    pub geometry: FieldGeometry,
    /// `None` when the field lacks its configuration; such fields never capture.
    pub config: Option<GravityFieldConfig>,
}

/// Resolves planet ids to their current centers during a physics tick.
pub trait PlanetLookup {
    fn planet_center(&self, planet: PlanetId) -> Option<Vec2>;
}

impl PlanetLookup for HashMap<PlanetId, Vec2> {
    fn planet_center(&self, planet: PlanetId) -> Option<Vec2> {
        self.get(&planet).copied()
    }
}

// ── State machine ──────────────────────────────────────────────────────────────

/// Owner of the player's flight state for one run.
#[derive(Resource)]
pub struct FlightStateMachine {
    state: PlayerFlightState,
    tuning: FlightTuning,
    terminator: Terminator,
    /// Run clock (seconds), advanced by `on_frame`.
    clock: f32,
}

impl FlightStateMachine {
    pub fn new(tuning: FlightTuning, moon: MoonAnchor, collaborators: Collaborators) -> Self {
        Self {
            state: PlayerFlightState::new(moon),
            tuning,
            terminator: Terminator::new(collaborators),
            clock: 0.0,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> &PlayerFlightState {
        &self.state
    }

    pub fn phase(&self) -> FlightPhase {
        self.state.phase
    }

    pub fn is_ended(&self) -> bool {
        self.state.game_ended
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn tuning(&self) -> &FlightTuning {
        &self.tuning
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    // ── Frame update ───────────────────────────────────────────────────────────

    /// Per-frame update: clock, moon spin, launch input, then the
    /// out-of-bounds check.
    pub fn on_frame(&mut self, input: FrameInput, dt: f32) {
        self.clock += dt;
        self.terminator.tick(dt);

        if self.state.game_ended {
            return;
        }

        if self.state.phase == FlightPhase::OnMoon {
            self.state.moon_anchor.spin(dt);
            self.state.position = self.state.moon_anchor.position();
        }

        if input.launch {
            match self.state.phase {
                FlightPhase::OnMoon => self.launch_from_moon(),
                FlightPhase::OrbitingPlanet => self.launch_from_planet(),
                FlightPhase::Flying => {}
            }
        }

        if let Some(vp) = input.viewport {
            self.check_out_of_screen(vp);
        }
    }

    // ── Physics tick ───────────────────────────────────────────────────────────

    /// Fixed-step update.  Orbit advancement only happens if the machine is
    /// still orbiting at tick start.
    pub fn on_physics_tick(&mut self, dt: f32, planets: &impl PlanetLookup) {
        if self.state.game_ended {
            return;
        }

        match self.state.phase {
            FlightPhase::OrbitingPlanet => {
                let center = self
                    .state
                    .orbit_target
                    .and_then(|planet| planets.planet_center(planet));
                let advanced = match (center, self.state.orbit.as_mut()) {
                    (Some(center), Some(orbit)) => Some(advance_orbit(orbit, center, dt)),
                    _ => None,
                };
                match advanced {
                    Some((position, velocity)) => {
                        self.state.position = position;
                        self.state.velocity = velocity;
                    }
                    None => self.release_capture(),
                }
            }
            FlightPhase::Flying => {
                self.state.position += self.state.velocity * dt;
            }
            FlightPhase::OnMoon => {
                self.state.position = self.state.moon_anchor.position();
            }
        }
    }

    // ── Launches ───────────────────────────────────────────────────────────────

    fn launch_from_moon(&mut self) {
        let state = &mut self.state;
        let outward = (state.position - state.moon_anchor.center).normalize_or(Vec2::Y);
        state.phase = FlightPhase::Flying;
        state.velocity = outward * self.tuning.launch_speed;
        state.has_launched_from_moon = true;
        state.clear_ignore();
        state.peak_speed = 0.0;
        info!("Launched from moon at speed {:.1}", self.tuning.launch_speed);
    }

    fn launch_from_planet(&mut self) {
        let state = &mut self.state;
        let Some(orbit) = state.orbit.take() else {
            return;
        };
        let outward = (state.position - orbit.center).normalize_or(Vec2::Y);

        state.phase = FlightPhase::Flying;
        state.velocity = outward * state.current_orbit_speed;
        state.ignored_planet = state.orbit_target.take();
        state.ignored_until = self.clock + self.tuning.reenter_delay;
        state.peak_speed = state.peak_speed.max(state.current_orbit_speed);
        info!("Launched from planet at speed {:.1}", state.current_orbit_speed);
    }

    /// Drop the current capture without an impulse; the body keeps its last
    /// tangential velocity.
    fn release_capture(&mut self) {
        let state = &mut self.state;
        state.peak_speed = state.peak_speed.max(state.current_orbit_speed);
        state.phase = FlightPhase::Flying;
        state.orbit_target = None;
        state.orbit = None;
        debug!("Captured planet vanished; released into free flight");
    }

    /// The driver saw `planet` despawn.  Releases the body if it was captured there.
    pub fn release_planet(&mut self, planet: PlanetId) {
        if self.state.game_ended {
            return;
        }
        if self.state.phase == FlightPhase::OrbitingPlanet
            && self.state.orbit_target == Some(planet)
        {
            self.release_capture();
        }
    }

    // ── Capture ────────────────────────────────────────────────────────────────

    /// Try to capture the body into `contact`'s field.  Called for both new and
    /// ongoing overlaps.  Returns `true` when a capture happened.
    pub fn on_field_overlap(&mut self, contact: &FieldContact) -> bool {
        if self.state.game_ended || self.state.phase != FlightPhase::Flying {
            return false;
        }

        let Some(planet) = contact.planet else {
            warn!("Gravity field has no planet parent; ignoring overlap");
            return false;
        };

        if self.state.is_ignoring(planet, self.clock) {
            return false;
        }

        let Some(config) = contact.config else {
            debug!("Gravity field of {} has no config; not capturable", contact.planet_name);
            return false;
        };

        let state = &mut self.state;
        let params = enter_orbit(
            state.position,
            state.velocity,
            contact.planet_center,
            &contact.geometry,
            &config.sanitized(),
            state.peak_speed,
        );

        state.phase = FlightPhase::OrbitingPlanet;
        state.orbit_target = Some(planet);
        state.position = params.snapped_position;
        state.velocity = params.tangential_velocity();
        state.current_orbit_speed = params.speed;
        state.peak_speed = state.peak_speed.max(params.speed);
        state.orbit = Some(params);
        state.clear_ignore();

        info!(
            "{} captured: speed {:.1} → {:.1}",
            contact.planet_name, params.entry_speed, params.speed
        );
        true
    }

    /// The body left `planet`'s field.  Expired ignore entries are dropped.
    pub fn on_field_exit(&mut self, planet: PlanetId) {
        if self.state.game_ended {
            return;
        }
        let expired = !self.state.is_ignoring(planet, self.clock);
        if self.state.ignored_planet == Some(planet) && expired {
            self.state.clear_ignore();
        }
    }

    // ── Termination ────────────────────────────────────────────────────────────

    /// The body touched the moon.  Ends the run with success once the body has
    /// left the moon at least once.  Returns `true` if this ended the run.
    pub fn on_moon_collision(&mut self) -> bool {
        if self.state.game_ended || !self.state.has_launched_from_moon {
            return false;
        }
        self.terminator.notify_impact(self.state.current_orbit_speed);
        self.end_run(Outcome::Success, self.tuning.success_scene_delay);
        true
    }

    fn check_out_of_screen(&mut self, vp: ViewportPoint) {
        if !self.tuning.out_of_screen_enabled {
            return;
        }
        if check_out_of_bounds(vp, self.tuning.screen_extent_factor, self.tuning.out_margin) {
            warn!("Body left the play area");
            self.end_run(Outcome::Failure, 0.0);
        }
    }

    fn end_run(&mut self, outcome: Outcome, delay: f32) {
        let state = &mut self.state;
        state.game_ended = true;
        state.velocity = Vec2::ZERO;
        let score = FinalScore::from_speed(state.current_orbit_speed);
        self.terminator.finalize(score, outcome, delay);
    }
}
