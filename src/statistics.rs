//! Lifetime play statistics persisted as TOML under `saves/`.
//!
//! Every run start bumps `games_started`; the time spent in a run is banked
//! when it ends or is abandoned by a retry.  The result screen shows both.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PlayStatistics {
    pub games_started: u64,
    /// Accumulated in-run time, seconds.
    pub total_play_secs: f64,
}

impl PlayStatistics {
    pub fn record_game_start(&mut self) {
        self.games_started += 1;
    }

    /// Bank `secs` of play.  Negative or non-finite spans are dropped.
    pub fn add_play_time(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.total_play_secs += secs;
        }
    }

    /// One-line summary for the result screen.
    pub fn summary(&self) -> String {
        format!(
            "Games played: {}  |  Play time: {}",
            self.games_started,
            format_play_time(self.total_play_secs)
        )
    }

    /// Read statistics from `path`.  A missing or blank file starts from zero.
    pub fn load(path: &Path) -> GameResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(GameError::StatisticsIo {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(&contents).map_err(|err| GameError::StatisticsFormat {
            reason: err.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        let io_err = |err: std::io::Error| GameError::StatisticsIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|err| GameError::StatisticsFormat {
                reason: err.to_string(),
            })?;
        fs::write(path, serialized).map_err(io_err)
    }
}

/// `1h 02m 05s`, `3m 07s` or `42s`, truncated to whole seconds.
pub fn format_play_time(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

// ── Resource ──────────────────────────────────────────────────────────────────

/// The loaded statistics and the file they are persisted to.
#[derive(Resource, Debug, Clone, Default)]
pub struct StatisticsStore {
    pub stats: PlayStatistics,
    pub path: PathBuf,
}

impl StatisticsStore {
    /// Load the statistics at `path`, starting from zero when the file is
    /// missing or unusable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = PlayStatistics::load(&path).unwrap_or_else(|err| {
            warn!("{}; starting statistics from zero", err);
            PlayStatistics::default()
        });
        Self { stats, path }
    }

    pub fn record_game_start(&mut self) -> GameResult<()> {
        self.stats.record_game_start();
        self.stats.save(&self.path)
    }

    pub fn add_play_time(&mut self, secs: f64) -> GameResult<()> {
        self.stats.add_play_time(secs);
        debug!("Play time now {:.1}s", self.stats.total_play_secs);
        self.stats.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("moonsling-stats-{}-{}", std::process::id(), name))
            .join("statistics.toml")
    }

    #[test]
    fn play_time_formats_by_magnitude() {
        assert_eq!(format_play_time(0.0), "0s");
        assert_eq!(format_play_time(42.9), "42s");
        assert_eq!(format_play_time(187.0), "3m 07s");
        assert_eq!(format_play_time(3725.0), "1h 02m 05s");
        assert_eq!(format_play_time(-5.0), "0s");
        assert_eq!(format_play_time(f64::NAN), "0s");
    }

    #[test]
    fn bad_spans_are_not_banked() {
        let mut stats = PlayStatistics::default();
        stats.add_play_time(1.5);
        stats.add_play_time(-3.0);
        stats.add_play_time(f64::INFINITY);
        assert_eq!(stats.total_play_secs, 1.5);
    }

    #[test]
    fn summary_shows_count_and_time() {
        let stats = PlayStatistics {
            games_started: 3,
            total_play_secs: 65.0,
        };
        assert_eq!(stats.summary(), "Games played: 3  |  Play time: 1m 05s");
    }

    #[test]
    fn store_persists_every_update() {
        let path = temp_path("persist");
        let mut store = StatisticsStore::open(&path);
        assert_eq!(store.stats, PlayStatistics::default());

        store.record_game_start().unwrap();
        store.record_game_start().unwrap();
        store.add_play_time(12.5).unwrap();

        let reopened = StatisticsStore::open(&path);
        assert_eq!(reopened.stats.games_started, 2);
        assert_eq!(reopened.stats.total_play_secs, 12.5);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "games_started = \"many\"").unwrap();
        assert!(matches!(
            PlayStatistics::load(&path),
            Err(GameError::StatisticsFormat { .. })
        ));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
