//! Game-specific error types.
//!
//! The flight core never fails: degenerate geometry is recovered locally and
//! duplicate terminations are silent no-ops.  Errors only surface at the edges
//! of the game, where configuration, scene routing, leaderboard or statistics
//! I/O meet the outside world.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::error::{GameError, GameResult};
//!
//! fn resolve(name: &str) -> GameResult<GameState> {
//!     GameState::from_scene_name(name)
//!         .ok_or_else(|| GameError::UnknownScene { name: name.to_string() })
//! }
//! ```

use std::fmt;

/// Top-level error enum for the game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// A configured scene name does not resolve to any known game state.
    /// Treated as a configuration error: the run freezes instead of crashing.
    UnknownScene {
        /// The unresolvable scene name as written in the configuration.
        name: String,
    },

    /// The leaderboard file could not be read or written.
    LeaderboardIo {
        /// Path that was being accessed.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// The leaderboard file exists but is not valid TOML for the expected schema,
    /// or the board could not be serialised.
    LeaderboardFormat {
        /// Parser / serializer message.
        reason: String,
    },

    /// The play statistics file could not be read or written.
    StatisticsIo {
        path: String,
        reason: String,
    },

    /// The play statistics file is not valid TOML for the expected schema.
    StatisticsFormat { reason: String },

    /// A tuning value is outside its playable range.
    InvalidConfig {
        /// Name of the configuration key (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::UnknownScene { name } => {
                write!(f, "scene '{}' does not resolve to a known game state", name)
            }
            GameError::LeaderboardIo { path, reason } => {
                write!(f, "leaderboard I/O failed for {}: {}", path, reason)
            }
            GameError::LeaderboardFormat { reason } => {
                write!(f, "leaderboard data is malformed: {}", reason)
            }
            GameError::StatisticsIo { path, reason } => {
                write!(f, "statistics I/O failed for {}: {}", path, reason)
            }
            GameError::StatisticsFormat { reason } => {
                write!(f, "statistics data is malformed: {}", reason)
            }
            GameError::InvalidConfig {
                name,
                value,
                expected,
            } => write!(
                f,
                "config '{}' = {} is outside accepted range {}",
                name, value, expected
            ),
        }
    }
}

impl std::error::Error for GameError {}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if the moon launch speed is not strictly positive.
///
/// A zero launch speed leaves the body parked on the moon forever.
pub fn validate_launch_speed(value: f32) -> GameResult<()> {
    if value <= 0.0 || !value.is_finite() {
        Err(GameError::InvalidConfig {
            name: "launch_speed",
            value,
            expected: "(0.0, ∞)",
        })
    } else {
        Ok(())
    }
}

/// Returns an error if the screen extent factor would shrink the play area
/// below the visible screen.
pub fn validate_extent_factor(value: f32) -> GameResult<()> {
    if value < 1.0 || !value.is_finite() {
        Err(GameError::InvalidConfig {
            name: "screen_extent_factor",
            value,
            expected: "[1.0, ∞)",
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_speed_must_be_positive() {
        assert!(validate_launch_speed(10.0).is_ok());
        assert!(validate_launch_speed(0.0).is_err());
        assert!(validate_launch_speed(f32::NAN).is_err());
    }

    #[test]
    fn extent_factor_cannot_shrink_below_screen() {
        assert!(validate_extent_factor(1.0).is_ok());
        assert!(validate_extent_factor(2.0).is_ok());
        assert!(matches!(
            validate_extent_factor(0.5),
            Err(GameError::InvalidConfig { name: "screen_extent_factor", .. })
        ));
    }

    #[test]
    fn unknown_scene_message_names_the_scene() {
        let err = GameError::UnknownScene {
            name: "Leaderboard".into(),
        };
        assert!(err.to_string().contains("'Leaderboard'"));
    }
}
