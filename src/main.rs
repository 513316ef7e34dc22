use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;

use moonsling::config;
use moonsling::graphics;
use moonsling::menu::GameMenuPlugin;
use moonsling::particles::ParticlesPlugin;
use moonsling::rendering::RenderingPlugin;
use moonsling::simulation::SimulationPlugin;

/// Configure Rapier physics: no global gravity, bodies are moved kinematically.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Moonsling".into(),
            resolution: WindowResolution::new(1200, 680),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.03)))
    // Loaded eagerly: the initial OnEnter(Playing) runs ahead of PreStartup.
    .insert_resource(config::load_game_config())
    // World units are game units; the camera scale does the pixel mapping.
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
    .add_plugins(GameMenuPlugin)
    .add_plugins(SimulationPlugin)
    .add_plugins(ParticlesPlugin)
    .add_plugins(RenderingPlugin)
    .add_systems(Startup, (graphics::setup_camera, setup_physics_config));

    app.run();
}
