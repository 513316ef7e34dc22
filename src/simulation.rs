//! Simulation plugin: run lifecycle, system scheduling and the effect bridge.
//!
//! ## Run lifecycle
//!
//! | Trigger                        | Effect                                        |
//! |--------------------------------|-----------------------------------------------|
//! | `OnEnter(Playing)`             | despawn stale run entities, spawn a new run   |
//! | `R` while `Playing`            | [`RestartRun`] message → same reset in place  |
//! | `R` on a result screen         | `NextState(Playing)` → `OnEnter(Playing)`     |
//!
//! Every run start is counted in [`StatisticsStore`]; a run's clock is banked
//! as play time when it ends, or when a retry abandons it mid-flight.  `R` is
//! inert on a result screen while the leaderboard name is being typed.
//!
//! ## Effect bridge
//!
//! The flight core reports outcomes through the collaborator traits in
//! [`crate::termination`].  Here all three are implemented by handles onto one
//! shared [`RunOutbox`], and [`apply_run_effects_system`] drains the queue every
//! frame into ECS changes:
//!
//! | Effect        | Applied as                                             |
//! |---------------|--------------------------------------------------------|
//! | `FinalScore`  | `LastRunScore`, name prompt, play time banked          |
//! | `Scene`       | `NextState<GameState>`                                 |
//! | `TimeScale`   | `Time<Virtual>::set_relative_speed`                    |
//! | `Impact`      | moon shatter particles                                 |

use std::sync::{Arc, Mutex};

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::leaderboard::LeaderboardStore;
use crate::menu::{GameState, LastRunScore, NameEntry};
use crate::particles::spawn_shatter_particles;
use crate::planet::{
    moon_spin_system, planet_orbit_system, spawn_moon, spawn_planets, Moon, RunEntity,
};
use crate::player::{
    flight_contact_system, flight_physics_tick_system, launch_input_system, planet_release_system,
    spawn_player, sync_player_transform_system, FieldOverlaps, FlightStateMachine,
};
use crate::statistics::StatisticsStore;
use crate::termination::{Collaborators, ImpactNotifier, Outcome, SceneDirector, ScoreSink};
use bevy::prelude::*;

// ── Effect queue ──────────────────────────────────────────────────────────────

/// Something the flight core asked the outside world to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEffect {
    FinalScore(f64),
    Scene(GameState),
    TimeScale(f32),
    Impact(f64),
}

/// Shared queue of [`RunEffect`]s written by the run's collaborators.
#[derive(Resource, Debug, Clone, Default)]
pub struct RunOutbox(Arc<Mutex<Vec<RunEffect>>>);

impl RunOutbox {
    fn push(&self, effect: RunEffect) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(effect);
        }
    }

    /// Take every queued effect in the order it was pushed.
    pub fn drain(&self) -> Vec<RunEffect> {
        self.0
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    /// Collaborators for a new run, resolving scenes with `config`'s names.
    pub fn collaborators(&self, config: &GameConfig) -> Collaborators {
        Collaborators::new(
            OutboxScoreSink(self.clone()),
            OutboxSceneDirector {
                outbox: self.clone(),
                clear_scene: config.clear_scene.clone(),
                over_scene: config.over_scene.clone(),
            },
            OutboxImpactNotifier(self.clone()),
        )
    }
}

struct OutboxScoreSink(RunOutbox);

impl ScoreSink for OutboxScoreSink {
    fn record_final_score(&mut self, value: f64) {
        self.0.push(RunEffect::FinalScore(value));
    }
}

struct OutboxSceneDirector {
    outbox: RunOutbox,
    clear_scene: String,
    over_scene: String,
}

impl SceneDirector for OutboxSceneDirector {
    fn request_scene(&mut self, outcome: Outcome) -> GameResult<()> {
        let name = match outcome {
            Outcome::Success => &self.clear_scene,
            Outcome::Failure => &self.over_scene,
        };
        if name.trim().is_empty() {
            warn!("No scene configured for {:?}; staying on the play field", outcome);
            return Ok(());
        }
        let state = GameState::from_scene_name(name).ok_or_else(|| GameError::UnknownScene {
            name: name.clone(),
        })?;
        self.outbox.push(RunEffect::Scene(state));
        Ok(())
    }

    fn set_time_scale(&mut self, scale: f32) {
        self.outbox.push(RunEffect::TimeScale(scale));
    }
}

struct OutboxImpactNotifier(RunOutbox);

impl ImpactNotifier for OutboxImpactNotifier {
    fn notify_impact(&mut self, speed: f64) {
        self.0.push(RunEffect::Impact(speed));
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Request to throw away the current run and start a fresh one in place.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RestartRun;

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Opened at build time: the first OnEnter(Playing) runs before Startup.
        let config = app
            .world()
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();
        app.insert_resource(LeaderboardStore::open(&config.leaderboard_path))
            .insert_resource(StatisticsStore::open(&config.statistics_path))
            .init_resource::<FieldOverlaps>()
            .init_resource::<RunOutbox>()
            .init_resource::<NameEntry>()
            .add_message::<RestartRun>()
            .add_systems(OnEnter(GameState::Playing), begin_run_system)
            .add_systems(
                Update,
                (
                    launch_input_system,
                    flight_contact_system,
                    planet_release_system,
                    planet_orbit_system,
                    moon_spin_system,
                    sync_player_transform_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                FixedUpdate,
                flight_physics_tick_system.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                (
                    retry_input_system,
                    restart_run_system,
                    apply_run_effects_system,
                )
                    .chain()
                    .after(sync_player_transform_system),
            );
    }
}

// ── Run lifecycle ─────────────────────────────────────────────────────────────

/// Despawn the previous run and spawn a fresh moon, planets, body and machine.
#[allow(clippy::too_many_arguments)]
fn reset_run(
    commands: &mut Commands,
    config: &GameConfig,
    stale: impl IntoIterator<Item = Entity>,
    outbox: &RunOutbox,
    overlaps: &mut FieldOverlaps,
    virtual_time: &mut Time<Virtual>,
    stats: &mut StatisticsStore,
    entry: &mut NameEntry,
) {
    if let Err(err) = stats.record_game_start() {
        warn!("Could not save statistics: {}", err);
    }
    entry.reset();
    for entity in stale {
        commands.entity(entity).despawn();
    }
    overlaps.0.clear();
    outbox.drain();
    virtual_time.set_relative_speed(1.0);

    let anchor = config.moon_anchor();
    spawn_moon(commands, config);
    spawn_planets(commands, config);
    spawn_player(commands, anchor.position());
    commands.insert_resource(FlightStateMachine::new(
        config.flight_tuning(),
        anchor,
        outbox.collaborators(config),
    ));
    info!("Run started with {} planets", config.planets.len());
}

/// `OnEnter(Playing)`: start a run.
#[allow(clippy::too_many_arguments)]
pub fn begin_run_system(
    mut commands: Commands,
    config: Res<GameConfig>,
    stale: Query<Entity, With<RunEntity>>,
    outbox: Res<RunOutbox>,
    mut overlaps: ResMut<FieldOverlaps>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut stats: ResMut<StatisticsStore>,
    mut entry: ResMut<NameEntry>,
) {
    reset_run(
        &mut commands,
        &config,
        stale.iter(),
        &outbox,
        &mut overlaps,
        &mut virtual_time,
        &mut stats,
        &mut entry,
    );
}

/// Restart in place when a [`RestartRun`] message arrives.
#[allow(clippy::too_many_arguments)]
pub fn restart_run_system(
    mut requests: MessageReader<RestartRun>,
    mut commands: Commands,
    config: Res<GameConfig>,
    stale: Query<Entity, With<RunEntity>>,
    outbox: Res<RunOutbox>,
    mut overlaps: ResMut<FieldOverlaps>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut stats: ResMut<StatisticsStore>,
    mut entry: ResMut<NameEntry>,
    machine: Option<Res<FlightStateMachine>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    info!("Retry requested");
    // An ended run already banked its clock with the final score.
    if let Some(machine) = machine.filter(|m| !m.is_ended()) {
        if let Err(err) = stats.add_play_time(f64::from(machine.clock())) {
            warn!("Could not save statistics: {}", err);
        }
    }
    reset_run(
        &mut commands,
        &config,
        stale.iter(),
        &outbox,
        &mut overlaps,
        &mut virtual_time,
        &mut stats,
        &mut entry,
    );
}

/// `R` restarts the run from anywhere except a name prompt.
pub fn retry_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    entry: Res<NameEntry>,
    mut next_state: ResMut<NextState<GameState>>,
    mut restart: MessageWriter<RestartRun>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    match state.get() {
        GameState::Playing => {
            restart.write(RestartRun);
        }
        _ if entry.is_editing() => {}
        _ => next_state.set(GameState::Playing),
    }
}

// ── Effects ───────────────────────────────────────────────────────────────────

/// Apply everything the flight core queued since the last frame.
#[allow(clippy::too_many_arguments)]
pub fn apply_run_effects_system(
    mut commands: Commands,
    outbox: Res<RunOutbox>,
    config: Res<GameConfig>,
    mut next_state: ResMut<NextState<GameState>>,
    mut restart: MessageWriter<RestartRun>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut last_score: ResMut<LastRunScore>,
    mut entry: ResMut<NameEntry>,
    mut stats: ResMut<StatisticsStore>,
    machine: Option<Res<FlightStateMachine>>,
    moons: Query<(&Moon, &Transform)>,
) {
    for effect in outbox.drain() {
        match effect {
            RunEffect::FinalScore(value) => {
                last_score.0 = Some(value);
                entry.begin(value, &config.player_name);
                let played = machine.as_ref().map_or(0.0, |m| f64::from(m.clock()));
                if let Err(err) = stats.add_play_time(played) {
                    warn!("Could not save statistics: {}", err);
                }
            }
            RunEffect::Scene(GameState::Playing) => {
                restart.write(RestartRun);
            }
            RunEffect::Scene(state) => {
                info!("Switching to {:?}", state);
                next_state.set(state);
            }
            RunEffect::TimeScale(scale) => {
                virtual_time.set_relative_speed(scale.max(0.0));
            }
            RunEffect::Impact(speed) => {
                for (moon, transform) in moons.iter() {
                    spawn_shatter_particles(
                        &mut commands,
                        transform.translation.truncate(),
                        moon.radius,
                        speed as f32,
                    );
                }
            }
        }
    }
}
