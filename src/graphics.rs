use crate::config::GameConfig;
use bevy::prelude::*;

/// Marker for the single gameplay camera.
#[derive(Component)]
pub struct MainCamera;

/// Spawn the fixed 2D camera centred on the moon.
///
/// The orthographic scale maps world units to pixels; the out-of-bounds check
/// projects through this camera, so it must never move during a run.
pub fn setup_camera(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: config.camera_scale,
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_translation(Vec3::ZERO),
        MainCamera,
    ));
    info!("Camera spawned (scale {})", config.camera_scale);
}
