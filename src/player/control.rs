//! Player input, contact and sync systems.
//!
//! These systems are the only place the ECS world talks to the
//! [`FlightStateMachine`].  They translate Bevy input, Rapier collision
//! messages and planet transforms into the machine's entry points, then copy
//! the resulting body position back onto the player entity.
//!
//! ## Pipeline (every `Update` frame while `Playing`)
//!
//! 1. [`launch_input_system`]: SPACE edge + viewport projection → `on_frame`.
//! 2. [`flight_contact_system`]: sensor/moon messages → overlap, exit, moon hit.
//! 3. [`planet_release_system`]: despawned planets → `release_planet`.
//! 4. [`sync_player_transform_system`]: body position → player `Transform`.
//!
//! [`flight_physics_tick_system`] runs in `FixedUpdate`.
//!
//! Rapier only reports when an overlap starts or stops, so the fields the body
//! is currently inside are tracked in [`FieldOverlaps`] and retried every frame.
//! This lets a body that entered a field while ignoring it be captured as soon
//! as the re-entry window closes.

use super::flight::{FieldContact, FlightStateMachine, FrameInput};
use super::state::{PlanetId, Player};
use crate::graphics::MainCamera;
use crate::gravity_field::{FieldGeometry, FieldShape, GravityField, GravityFieldConfig};
use crate::planet::{Moon, Planet};
use crate::termination::ViewportPoint;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::{HashMap, HashSet};

/// Gravity-field entities the player body currently overlaps.
#[derive(Resource, Debug, Default, Clone)]
pub struct FieldOverlaps(pub HashSet<Entity>);

// ── Viewport projection ───────────────────────────────────────────────────────

/// Project a world point into normalized viewport space (origin bottom-left).
///
/// Returns `None` when the camera has no viewport yet or cannot project the
/// point; callers skip the out-of-bounds check in that case.
pub fn project_to_viewport(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    world: Vec2,
) -> Option<ViewportPoint> {
    let size = camera.logical_viewport_size()?;
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    let px = camera
        .world_to_viewport(camera_transform, world.extend(0.0))
        .ok()?;
    Some(ViewportPoint::new(px.x / size.x, 1.0 - px.y / size.y))
}

// ── Step 1: Frame input ───────────────────────────────────────────────────────

/// Feed the launch edge and the projected body position to the machine.
pub fn launch_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    machine: Option<ResMut<FlightStateMachine>>,
) {
    let Some(mut machine) = machine else {
        return;
    };
    let viewport = camera.single().ok().and_then(|(camera, transform)| {
        project_to_viewport(camera, transform, machine.state().position)
    });
    let input = FrameInput {
        launch: keys.just_pressed(KeyCode::Space),
        viewport,
    };
    machine.on_frame(input, time.delta_secs());
}

// ── Step 2: Contacts ──────────────────────────────────────────────────────────

/// Describe a field overlap for the machine.
///
/// The field's world pose is rebuilt from its planet's current `Transform` so
/// that it agrees with the planet center even before transform propagation.
#[allow(clippy::type_complexity)]
fn field_contact(
    field: Entity,
    fields: &Query<
        (
            &FieldShape,
            &Transform,
            &GlobalTransform,
            Option<&GravityFieldConfig>,
            Option<&ChildOf>,
        ),
        With<GravityField>,
    >,
    planets: &Query<(&Planet, &Transform)>,
) -> Option<FieldContact> {
    let (shape, local, global, config, parent) = fields.get(field).ok()?;
    let owner = parent.and_then(|child_of| {
        let entity = child_of.parent();
        planets.get(entity).ok().map(|(planet, tf)| (entity, planet, tf))
    });

    Some(match owner {
        Some((entity, planet, planet_tf)) => {
            let world = planet_tf.mul_transform(*local);
            FieldContact {
                planet: Some(PlanetId::from(entity)),
                planet_name: planet.name.clone(),
                planet_center: planet_tf.translation.truncate(),
                geometry: FieldGeometry {
                    shape: *shape,
                    scale: world.scale.truncate(),
                    origin: world.translation.truncate(),
                },
                config: config.copied(),
            }
        }
        None => {
            let geometry = FieldGeometry::from_global(*shape, global);
            FieldContact {
                planet: None,
                planet_name: String::new(),
                planet_center: geometry.origin,
                geometry,
                config: config.copied(),
            }
        }
    })
}

/// Route Rapier collision messages involving the player to the machine, then
/// retry capture for every field still overlapped.
#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn flight_contact_system(
    mut collision_events: MessageReader<CollisionEvent>,
    players: Query<(), With<Player>>,
    moons: Query<(), With<Moon>>,
    fields: Query<
        (
            &FieldShape,
            &Transform,
            &GlobalTransform,
            Option<&GravityFieldConfig>,
            Option<&ChildOf>,
        ),
        With<GravityField>,
    >,
    planets: Query<(&Planet, &Transform)>,
    mut overlaps: ResMut<FieldOverlaps>,
    machine: Option<ResMut<FlightStateMachine>>,
) {
    let Some(mut machine) = machine else {
        collision_events.clear();
        return;
    };

    for event in collision_events.read() {
        let (e1, e2, started) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2, true),
            CollisionEvent::Stopped(e1, e2, _) => (*e1, *e2, false),
        };
        let other = if players.contains(e1) {
            e2
        } else if players.contains(e2) {
            e1
        } else {
            continue;
        };

        if moons.contains(other) {
            if started && machine.on_moon_collision() {
                info!("Body struck the moon");
            }
        } else if fields.contains(other) {
            if started {
                overlaps.0.insert(other);
            } else {
                overlaps.0.remove(&other);
                let planet = fields
                    .get(other)
                    .ok()
                    .and_then(|(.., parent)| parent)
                    .map(|child_of| PlanetId::from(child_of.parent()));
                if let Some(planet) = planet {
                    machine.on_field_exit(planet);
                }
            }
        }
    }

    overlaps.0.retain(|field| fields.contains(*field));
    for &field in overlaps.0.iter() {
        let Some(contact) = field_contact(field, &fields, &planets) else {
            continue;
        };
        if machine.on_field_overlap(&contact) {
            break;
        }
    }
}

// ── Step 3: Planet removal ────────────────────────────────────────────────────

/// Release the body from planets that were despawned mid-orbit.
pub fn planet_release_system(
    mut removed: RemovedComponents<Planet>,
    machine: Option<ResMut<FlightStateMachine>>,
) {
    let Some(mut machine) = machine else {
        removed.clear();
        return;
    };
    for entity in removed.read() {
        machine.release_planet(PlanetId::from(entity));
    }
}

// ── Step 4: Sync ──────────────────────────────────────────────────────────────

/// Copy the simulated body position onto the player entity so Rapier sees it.
pub fn sync_player_transform_system(
    machine: Option<Res<FlightStateMachine>>,
    mut q: Query<&mut Transform, With<Player>>,
) {
    let Some(machine) = machine else {
        return;
    };
    let position = machine.state().position;
    for mut transform in q.iter_mut() {
        transform.translation.x = position.x;
        transform.translation.y = position.y;
    }
}

// ── Fixed step ────────────────────────────────────────────────────────────────

/// Advance the body by one fixed physics step using current planet centers.
pub fn flight_physics_tick_system(
    time: Res<Time>,
    planets: Query<(Entity, &Transform), With<Planet>>,
    machine: Option<ResMut<FlightStateMachine>>,
) {
    let Some(mut machine) = machine else {
        return;
    };
    let centers: HashMap<PlanetId, Vec2> = planets
        .iter()
        .map(|(entity, tf)| (PlanetId::from(entity), tf.translation.truncate()))
        .collect();
    machine.on_physics_tick(time.delta_secs(), &centers);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::planet::{spawn_moon, RunEntity};
    use crate::player::flight::FlightTuning;
    use crate::player::FlightPhase;
    use crate::simulation::RunOutbox;
    use crate::termination::Collaborators;
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;

    fn contact_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<CollisionEvent>();
        app.init_resource::<FieldOverlaps>();
        app.add_systems(Update, flight_contact_system);
        app
    }

    fn insert_machine(app: &mut App, tuning: FlightTuning) {
        let config = GameConfig::default();
        let outbox = RunOutbox::default();
        let collaborators: Collaborators = outbox.collaborators(&config);
        app.insert_resource(FlightStateMachine::new(
            tuning,
            config.moon_anchor(),
            collaborators,
        ));
        app.insert_resource(outbox);
    }

    fn spawn_field_planet(world: &mut World, at: Vec2, radius: f32) -> (Entity, Entity) {
        let planet = world
            .spawn((
                Planet {
                    name: "Test".into(),
                    body_radius: 0.5,
                },
                Transform::from_translation(at.extend(0.0)),
                RunEntity,
            ))
            .id();
        let field = world
            .spawn((
                GravityField,
                FieldShape::Circle { radius },
                GravityFieldConfig::default(),
                Transform::default(),
                GlobalTransform::from_translation(at.extend(0.0)),
                ChildOf(planet),
            ))
            .id();
        (planet, field)
    }

    #[test]
    fn sensor_start_captures_flying_body() {
        let mut app = contact_test_app();
        insert_machine(&mut app, FlightTuning::default());
        let player = app.world_mut().spawn(Player).id();
        let (planet, field) = spawn_field_planet(app.world_mut(), Vec2::new(0.0, 5.0), 2.0);

        app.world_mut()
            .resource_mut::<FlightStateMachine>()
            .on_frame(
                FrameInput {
                    launch: true,
                    viewport: None,
                },
                0.0,
            );
        app.world_mut().write_message(CollisionEvent::Started(
            player,
            field,
            CollisionEventFlags::SENSOR,
        ));
        app.update();

        let machine = app.world().resource::<FlightStateMachine>();
        assert_eq!(machine.phase(), FlightPhase::OrbitingPlanet);
        assert_eq!(machine.state().orbit_target, Some(PlanetId::from(planet)));
        assert!(app.world().resource::<FieldOverlaps>().0.contains(&field));
    }

    #[test]
    fn stopped_event_clears_overlap() {
        let mut app = contact_test_app();
        insert_machine(&mut app, FlightTuning::default());
        let player = app.world_mut().spawn(Player).id();
        let (_, field) = spawn_field_planet(app.world_mut(), Vec2::new(0.0, 5.0), 2.0);

        app.world_mut().write_message(CollisionEvent::Started(
            field,
            player,
            CollisionEventFlags::SENSOR,
        ));
        app.update();
        app.world_mut().write_message(CollisionEvent::Stopped(
            player,
            field,
            CollisionEventFlags::SENSOR,
        ));
        app.update();

        assert!(app.world().resource::<FieldOverlaps>().0.is_empty());
        let machine = app.world().resource::<FlightStateMachine>();
        assert_eq!(machine.phase(), FlightPhase::OnMoon, "no launch, no capture");
    }

    #[test]
    fn moon_contact_before_launch_keeps_run_alive() {
        let mut app = contact_test_app();
        insert_machine(&mut app, FlightTuning::default());
        app.insert_resource(GameConfig::default());
        let player = app.world_mut().spawn(Player).id();
        app.add_systems(Startup, |mut commands: Commands, config: Res<GameConfig>| {
            spawn_moon(&mut commands, &config);
        });
        app.update();

        let moon = {
            let world = app.world_mut();
            world
                .query_filtered::<Entity, With<Moon>>()
                .single(world)
                .unwrap()
        };
        app.world_mut().write_message(CollisionEvent::Started(
            player,
            moon,
            CollisionEventFlags::empty(),
        ));
        app.update();

        assert!(!app.world().resource::<FlightStateMachine>().is_ended());
    }
}
