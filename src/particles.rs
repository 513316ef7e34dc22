//! Moon shatter burst, played when the body strikes the moon.
//!
//! [`spawn_shatter_particles`] only needs `&mut Commands`, so the effect
//! bridge can fire it without touching any asset storage.  Fragments get their
//! mesh and their own fading material a frame later:
//!
//! | System                       | Purpose                                        |
//! |------------------------------|------------------------------------------------|
//! | `attach_fragment_mesh_system` | Give new fragments the shared hexagon mesh    |
//! | `fragment_update_system`     | Drift with drag, fade out, despawn at lifetime |

use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};
use rand::Rng;

const SHATTER_BASE_COUNT: u32 = 12;
const SHATTER_MAX_COUNT: u32 = 48;
const FRAGMENT_RADIUS: f32 = 0.06;
const FRAGMENT_SIDES: u32 = 6;

/// Fraction of fragment speed lost per second.
const FRAGMENT_DRAG: f32 = 0.8;

/// Shared fragment mesh, created once at startup.
#[derive(Resource)]
pub struct FragmentMesh(pub Handle<Mesh>);

/// One piece of shattered moon rock.
#[derive(Component, Debug, Clone)]
pub struct ShatterFragment {
    pub velocity: Vec2,
    pub age: f32,
    /// Despawned once `age` reaches this.
    pub lifetime: f32,
    pub tint: Srgba,
    /// Set by `attach_fragment_mesh_system`.
    pub material: Option<Handle<ColorMaterial>>,
}

impl ShatterFragment {
    /// Remaining opacity: full at birth, easing out to zero at `lifetime`.
    pub fn alpha(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        let t = (self.age / self.lifetime).clamp(0.0, 1.0);
        (1.0 - t) * (1.0 - t)
    }
}

pub struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_fragment_mesh).add_systems(
            Update,
            (attach_fragment_mesh_system, fragment_update_system).chain(),
        );
    }
}

fn init_fragment_mesh(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    let handle = meshes.add(circle_mesh(FRAGMENT_RADIUS, FRAGMENT_SIDES));
    commands.insert_resource(FragmentMesh(handle));
}

pub fn attach_fragment_mesh_system(
    mut commands: Commands,
    mesh: Res<FragmentMesh>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut fresh: Query<(Entity, &mut ShatterFragment), Added<ShatterFragment>>,
) {
    for (entity, mut fragment) in fresh.iter_mut() {
        let material = materials.add(ColorMaterial::from_color(fragment.tint));
        fragment.material = Some(material.clone());
        commands
            .entity(entity)
            .insert((Mesh2d(mesh.0.clone()), MeshMaterial2d(material)));
    }
}

pub fn fragment_update_system(
    mut commands: Commands,
    time: Res<Time>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut fragments: Query<(Entity, &mut Transform, &mut ShatterFragment)>,
) {
    let dt = time.delta_secs();
    let damping = (1.0 - FRAGMENT_DRAG * dt).max(0.0);

    for (entity, mut transform, mut fragment) in fragments.iter_mut() {
        fragment.age += dt;
        if fragment.age >= fragment.lifetime {
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation += (fragment.velocity * dt).extend(0.0);
        fragment.velocity *= damping;

        let alpha = fragment.alpha();
        if let Some(mat) = fragment
            .material
            .as_ref()
            .and_then(|handle| materials.get_mut(handle))
        {
            mat.color = Color::Srgba(fragment.tint.with_alpha(alpha));
        }
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Number of shatter fragments for an impact at `speed`.
pub fn shatter_count(speed: f32) -> u32 {
    (SHATTER_BASE_COUNT as f32 + speed.max(0.0) * 1.5)
        .round()
        .min(SHATTER_MAX_COUNT as f32) as u32
}

/// Spawn the moon shatter burst at `center`.
///
/// Fragments leave the moon's rim; faster impacts throw more of them, further.
pub fn spawn_shatter_particles(commands: &mut Commands, center: Vec2, radius: f32, speed: f32) {
    let mut rng = rand::thread_rng();
    let energy = 1.0 + speed.max(0.0).sqrt() * 0.5;

    for _ in 0..shatter_count(speed) {
        let angle = rng.gen_range(0.0_f32..std::f32::consts::TAU);
        let dir = Vec2::from_angle(angle);
        let rim = dir * radius * rng.gen_range(0.6_f32..1.0_f32);

        // Pale moon-rock grey, some pieces faintly blue.
        let lum = rng.gen_range(0.65_f32..0.95_f32);
        let blue = (lum + rng.gen_range(0.0_f32..0.10_f32)).min(1.0);

        commands.spawn((
            ShatterFragment {
                velocity: dir * rng.gen_range(1.5_f32..5.0_f32) * energy,
                age: 0.0,
                lifetime: rng.gen_range(0.6_f32..1.4_f32),
                tint: Srgba::new(lum, lum, blue, 1.0),
                material: None,
            },
            Transform::from_translation((center + rim).extend(0.9)),
            Visibility::default(),
        ));
    }
}

/// Filled regular `sides`-gon as a triangle fan around the center vertex.
fn circle_mesh(radius: f32, sides: u32) -> Mesh {
    let rim = (0..sides).map(|i| {
        let angle = std::f32::consts::TAU * i as f32 / sides as f32;
        Vec2::from_angle(angle) * radius
    });
    let points: Vec<Vec2> = std::iter::once(Vec2::ZERO).chain(rim).collect();

    let positions: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, 0.0]).collect();
    let normals = vec![[0.0, 0.0, 1.0]; points.len()];
    let uvs: Vec<[f32; 2]> = points
        .iter()
        .map(|p| [p.x / (2.0 * radius) + 0.5, p.y / (2.0 * radius) + 0.5])
        .collect();
    let indices: Vec<u32> = (1..=sides)
        .flat_map(|i| [0, i, i % sides + 1])
        .collect();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(lifetime: f32) -> ShatterFragment {
        ShatterFragment {
            velocity: Vec2::X,
            age: 0.0,
            lifetime,
            tint: Srgba::WHITE,
            material: None,
        }
    }

    #[test]
    fn faster_impacts_throw_more_fragments() {
        assert_eq!(shatter_count(0.0), SHATTER_BASE_COUNT);
        assert!(shatter_count(10.0) > shatter_count(2.0));
        assert_eq!(shatter_count(1_000.0), SHATTER_MAX_COUNT);
    }

    #[test]
    fn fragments_fade_out() {
        let mut f = fragment(2.0);
        assert_eq!(f.alpha(), 1.0);
        f.age = 1.0;
        assert_eq!(f.alpha(), 0.25);
        f.age = 2.0;
        assert_eq!(f.alpha(), 0.0);
    }

    #[test]
    fn expired_fragments_despawn() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, fragment_update_system);
        app.world_mut().init_resource::<Assets<ColorMaterial>>();
        app.world_mut().spawn((fragment(0.0), Transform::default()));
        app.update();

        let world = app.world_mut();
        assert_eq!(world.query::<&ShatterFragment>().iter(world).count(), 0);
    }

    #[test]
    fn burst_spawns_one_entity_per_fragment() {
        let mut app = App::new();
        app.add_systems(Startup, |mut commands: Commands| {
            spawn_shatter_particles(&mut commands, Vec2::ZERO, 1.2, 6.0);
        });
        app.update();

        let world = app.world_mut();
        let count = world.query::<&ShatterFragment>().iter(world).count();
        assert_eq!(count as u32, shatter_count(6.0));
    }

    #[test]
    fn circle_mesh_is_a_triangle_fan() {
        let mesh = circle_mesh(1.0, 6);
        assert_eq!(mesh.count_vertices(), 7);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(18));
    }
}
