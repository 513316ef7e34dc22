//! Centralised gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::GameConfig::default`] reads every
//! value from this module, and `assets/game.toml` may override any subset at
//! startup.
//!
//! World units are arbitrary "game units"; the default layout places the moon at
//! the origin and planets within ±10 units, matching a camera that shows roughly
//! 24 × 14 units.

// ── Moon ──────────────────────────────────────────────────────────────────────

/// Speed given to the body when it leaves the moon surface.
pub const LAUNCH_SPEED: f32 = 10.0;

/// Radius of the moon collider.
pub const MOON_RADIUS: f32 = 1.2;

/// Visual and anchor spin of the moon (degrees per second, CCW).
///
/// The body rides the moon until launch, so the spin sets the launch heading.
pub const MOON_SPIN_DEG_PER_SEC: f32 = 10.0;

/// Gap between the moon surface and the resting body so the two colliders do
/// not report a contact before launch.
pub const MOON_REST_GAP: f32 = 0.05;

// ── Player body ───────────────────────────────────────────────────────────────

/// Collider radius of the player body.
pub const PLAYER_RADIUS: f32 = 0.2;

/// Orbit speed the body carries before its first capture.
///
/// Used as the score when the body hits the moon without ever orbiting.
pub const INITIAL_ORBIT_SPEED: f32 = 1.0;

// ── Orbit engine ──────────────────────────────────────────────────────────────

/// Shortest allowed time for one full revolution (seconds).
///
/// Caps angular speed at `2π / MIN_REVOLUTION_SECS` so tiny-radius captures stay
/// playable.
pub const MIN_REVOLUTION_SECS: f32 = 0.2;

/// Smallest orbit radius accepted after fallbacks (avoids division by zero).
pub const ORBIT_RADIUS_EPSILON: f32 = 0.01;

/// Squared length below which a radial vector counts as degenerate.
pub const DEGENERATE_RADIAL_SQ: f32 = 1e-6;

/// Squared speed below which a velocity has no usable direction.
pub const DEGENERATE_VELOCITY_SQ: f32 = 1e-4;

// ── Gravity fields ────────────────────────────────────────────────────────────

/// Default capture speed multiplier for a gravity field.
pub const DEFAULT_SPEED_MULTIPLIER: f32 = 1.5;

/// Default minimum orbit speed guaranteed by a gravity field.
pub const DEFAULT_MIN_ORBIT_SPEED: f32 = 1.0;

/// Seconds a just-released planet is ignored by its own gravity field.
pub const REENTER_DELAY_SECS: f32 = 1.0;

// ── Termination ───────────────────────────────────────────────────────────────

/// Additive viewport margin on top of the extent factor.
pub const OUT_MARGIN: f32 = 0.05;

/// Play area as a multiple of the visible screen (1 = exactly the screen).
pub const SCREEN_EXTENT_FACTOR: f32 = 2.0;

/// Delay before the success scene is requested, so the moon shatter can play out.
pub const SUCCESS_SCENE_DELAY_SECS: f32 = 1.5;

/// Scene requested after a moon impact.
pub const CLEAR_SCENE_NAME: &str = "GameClear";

/// Scene requested after leaving the play area.
pub const OVER_SCENE_NAME: &str = "GameOver";

// ── Leaderboard ───────────────────────────────────────────────────────────────

/// Maximum number of leaderboard entries kept on disk.
pub const LEADERBOARD_MAX_STORED: usize = 1000;

/// Maximum length of a sanitised player name.
pub const NAME_MAX_LENGTH: usize = 16;

/// Name used when a submitted name sanitises to nothing.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Leaderboard file location, relative to the working directory.
pub const LEADERBOARD_PATH: &str = "saves/leaderboard.toml";

/// Rows of the leaderboard listed on the result screen.
pub const LEADERBOARD_DISPLAY_COUNT: usize = 5;

// ── Statistics ────────────────────────────────────────────────────────────────

/// Play statistics file location, relative to the working directory.
pub const STATISTICS_PATH: &str = "saves/statistics.toml";

// ── Rendering ─────────────────────────────────────────────────────────────────

/// World units shown per screen pixel by the fixed camera.
pub const CAMERA_SCALE: f32 = 0.02;

/// Font size of the HUD and result overlay body text.
pub const HUD_FONT_SIZE: f32 = 20.0;
