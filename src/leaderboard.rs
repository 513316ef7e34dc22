//! Local leaderboard persisted as TOML under `saves/`.
//!
//! The board is the downstream of the run's score sink.  A finished run's
//! score is held on the result screen until the player confirms a name, then
//! submitted and written back to disk.  Entries are kept sorted best-first;
//! ties go to the earlier submission.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PLAYER_NAME, LEADERBOARD_MAX_STORED, NAME_MAX_LENGTH};
use crate::error::{GameError, GameResult};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
    /// Seconds since the Unix epoch at submission.
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
}

/// Trim `raw`, keep only `[A-Za-z0-9 _-]` and cap the length.
///
/// Returns the default player name when nothing usable is left.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .take(NAME_MAX_LENGTH)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// English ordinal suffix for a 1-based rank.
pub fn rank_suffix(rank: usize) -> &'static str {
    if (11..=13).contains(&(rank % 100)) {
        return "th";
    }
    match rank % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

pub fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Leaderboard {
    /// Insert a score and keep the board sorted and capped.
    pub fn add_score(&mut self, name: &str, score: f64, timestamp: u64) {
        self.entries.push(LeaderboardEntry {
            name: sanitize_name(name),
            score,
            timestamp,
        });
        self.entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        self.entries.truncate(LEADERBOARD_MAX_STORED);
    }

    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Display rows for the best `n` entries: rank, name, score.
    pub fn rows(&self, n: usize) -> Vec<String> {
        self.top(n)
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!("{:>2}. {:<16} {:>8.2}", i + 1, entry.name, entry.score)
            })
            .collect()
    }

    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    /// 1-based rank `score` would take on this board.
    ///
    /// A score equal to an existing entry ranks ahead of it.
    pub fn rank_for_score(&self, score: f64) -> usize {
        self.entries
            .iter()
            .position(|entry| score >= entry.score)
            .unwrap_or(self.entries.len())
            + 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a board from `path`.  A missing or blank file is an empty board.
    pub fn load(path: &Path) -> GameResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(GameError::LeaderboardIo {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(&contents).map_err(|err| GameError::LeaderboardFormat {
            reason: err.to_string(),
        })
    }

    /// Write the board to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> GameResult<()> {
        let io_err = |err: std::io::Error| GameError::LeaderboardIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|err| GameError::LeaderboardFormat {
                reason: err.to_string(),
            })?;
        fs::write(path, serialized).map_err(io_err)
    }
}

// ── Resource ──────────────────────────────────────────────────────────────────

/// The loaded leaderboard and the file it is persisted to.
#[derive(Resource, Debug, Clone, Default)]
pub struct LeaderboardStore {
    pub board: Leaderboard,
    pub path: PathBuf,
}

impl LeaderboardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            board: Leaderboard::default(),
            path: path.into(),
        }
    }

    /// Load the board at `path`.  A missing file starts empty; an unreadable
    /// or malformed one is reported and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let board = match Leaderboard::load(&path) {
            Ok(board) => {
                info!("Loaded {} leaderboard entries", board.len());
                board
            }
            Err(err) => {
                warn!("{}; starting with an empty leaderboard", err);
                Leaderboard::default()
            }
        };
        Self { board, path }
    }

    /// Add a score and persist the board.  The in-memory board is updated even
    /// when saving fails.
    pub fn submit(&mut self, name: &str, score: f64) -> GameResult<()> {
        self.board.add_score(name, score, current_unix_timestamp());
        self.board.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("moonsling-test-{}-{}", std::process::id(), name))
            .join("leaderboard.toml")
    }

    #[test]
    fn sanitize_strips_and_truncates() {
        assert_eq!(sanitize_name("  Ace<Pilot>!  "), "AcePilot");
        assert_eq!(sanitize_name("under_score-dash"), "under_score-dash");
        assert_eq!(sanitize_name("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnop");
        assert_eq!(sanitize_name("   "), "Player");
        assert_eq!(sanitize_name("@@@"), "Player");
    }

    #[test]
    fn entries_sort_by_score_then_time() {
        let mut board = Leaderboard::default();
        board.add_score("b", 5.0, 20);
        board.add_score("a", 5.0, 10);
        board.add_score("c", 9.0, 30);

        let names: Vec<_> = board.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(board.best().map(|e| e.score), Some(9.0));
        assert_eq!(board.top(2).len(), 2);
        assert_eq!(board.top(10).len(), 3);
    }

    #[test]
    fn board_is_capped() {
        let mut board = Leaderboard::default();
        for i in 0..(LEADERBOARD_MAX_STORED + 5) {
            board.add_score("p", i as f64, i as u64);
        }
        assert_eq!(board.len(), LEADERBOARD_MAX_STORED);
        assert_eq!(board.best().map(|e| e.score), Some((LEADERBOARD_MAX_STORED + 4) as f64));
    }

    #[test]
    fn rank_places_ties_ahead() {
        let mut board = Leaderboard::default();
        board.add_score("a", 10.0, 1);
        board.add_score("b", 5.0, 2);
        assert_eq!(board.rank_for_score(12.0), 1);
        assert_eq!(board.rank_for_score(10.0), 1);
        assert_eq!(board.rank_for_score(7.0), 2);
        assert_eq!(board.rank_for_score(1.0), 3);
        assert_eq!(Leaderboard::default().rank_for_score(1.0), 1);
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(rank_suffix(1), "st");
        assert_eq!(rank_suffix(2), "nd");
        assert_eq!(rank_suffix(3), "rd");
        assert_eq!(rank_suffix(4), "th");
        assert_eq!(rank_suffix(11), "th");
        assert_eq!(rank_suffix(12), "th");
        assert_eq!(rank_suffix(13), "th");
        assert_eq!(rank_suffix(21), "st");
        assert_eq!(rank_suffix(112), "th");
    }

    #[test]
    fn rows_list_best_entries_in_order() {
        let mut board = Leaderboard::default();
        board.add_score("Vega", 3.0, 1);
        board.add_score("Nova", 12.5, 2);
        board.add_score("Rigel", 7.25, 3);

        let rows = board.rows(2);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with(" 1. Nova"));
        assert!(rows[0].ends_with("12.50"));
        assert!(rows[1].starts_with(" 2. Rigel"));
        assert!(Leaderboard::default().rows(5).is_empty());
    }

    #[test]
    fn open_tolerates_malformed_file() {
        let path = temp_path("open-malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "entries = 7").unwrap();
        let store = LeaderboardStore::open(&path);
        assert!(store.board.is_empty());
        assert_eq!(store.path, path);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_loads_empty() {
        let board = Leaderboard::load(&temp_path("missing")).unwrap();
        assert!(board.is_empty());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let path = temp_path("persist");
        let mut store = LeaderboardStore::new(&path);
        store.submit("Nova", 12.5).unwrap();
        store.submit("Vega", 3.0).unwrap();

        let loaded = Leaderboard::load(&path).unwrap();
        assert_eq!(loaded, store.board);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let path = temp_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "entries = 7").unwrap();
        assert!(matches!(
            Leaderboard::load(&path),
            Err(GameError::LeaderboardFormat { .. })
        ));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
