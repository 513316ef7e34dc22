//! Game states and the result screens.
//!
//! ## States
//!
//! | State       | Description                                         |
//! |-------------|-----------------------------------------------------|
//! | `Playing`   | Initial state; a run is in progress                 |
//! | `GameClear` | The body struck the moon; result overlay shown      |
//! | `GameOver`  | The body left the play area; result overlay shown   |
//!
//! ## Systems (registered by `GameMenuPlugin`)
//!
//! | System                 | Schedule                | Purpose                     |
//! |------------------------|-------------------------|-----------------------------|
//! | `setup_result_overlay` | `OnEnter(GameClear)`    | Spawn the success overlay   |
//! | `setup_result_overlay` | `OnEnter(GameOver)`     | Spawn the failure overlay   |
//! | `cleanup_result`       | `OnExit(..)`            | Despawn the overlay         |
//! | `name_entry_input_system` | `Update`, result states | Type, save or skip a name |
//! | `result_prompt_system` | `Update`, result states | Refresh the name prompt     |
//! | `result_board_system`  | `Update`, result states | Refresh the top-N listing   |
//!
//! A finished run's score waits in [`NameEntry`] until the player presses
//! ENTER (submit) or ESC (discard).  The retry key is handled by
//! [`crate::simulation::SimulationPlugin`] and is inert while a name is being
//! typed.

use crate::constants::{LEADERBOARD_DISPLAY_COUNT, NAME_MAX_LENGTH};
use crate::leaderboard::{rank_suffix, sanitize_name, Leaderboard, LeaderboardStore};
use crate::statistics::StatisticsStore;
use crate::termination::Outcome;
use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::input::keyboard::KeyboardInput;
use bevy::input::ButtonState;
use bevy::prelude::*;

// ── Game state ────────────────────────────────────────────────────────────────

/// Top-level application state machine.
///
/// Every run system in [`crate::simulation::SimulationPlugin`] runs under
/// `.run_if(in_state(GameState::Playing))`.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Playing,
    GameClear,
    GameOver,
}

impl GameState {
    /// Resolve a configured scene name.  Matching ignores case and surrounding
    /// whitespace.
    pub fn from_scene_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            ("Playing", GameState::Playing),
            ("GameClear", GameState::GameClear),
            ("GameOver", GameState::GameOver),
        ]
        .into_iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(name))
        .map(|(_, state)| state)
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            GameState::Playing => None,
            GameState::GameClear => Some(Outcome::Success),
            GameState::GameOver => Some(Outcome::Failure),
        }
    }
}

/// Final score of the most recent run, shown by the result overlay.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct LastRunScore(pub Option<f64>);

// ── Component markers ─────────────────────────────────────────────────────────

/// Root node of the result overlay; despawned on exit.
#[derive(Component)]
pub struct ResultRoot;

/// Text node showing the name prompt or the retry hint.
#[derive(Component)]
pub struct ResultPromptText;

/// Text node listing the best leaderboard entries.
#[derive(Component)]
pub struct ResultBoardText;

// ── Name entry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum NameEntryStatus {
    /// No score waiting.
    #[default]
    Idle,
    Editing,
    /// Submitted under the contained (sanitised) name.
    Submitted(String),
    Skipped,
}

/// The leaderboard name being typed for the last run's score.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct NameEntry {
    pub buffer: String,
    /// Used when the buffer is left empty.
    pub default_name: String,
    pub score: Option<f64>,
    pub status: NameEntryStatus,
}

impl NameEntry {
    /// Start prompting for a name for `score`.
    pub fn begin(&mut self, score: f64, default_name: &str) {
        *self = Self {
            buffer: String::new(),
            default_name: default_name.to_string(),
            score: Some(score),
            status: NameEntryStatus::Editing,
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_editing(&self) -> bool {
        self.status == NameEntryStatus::Editing
    }

    /// Append typed text, keeping only characters a name may contain.
    pub fn push_text(&mut self, text: &str) {
        if !self.is_editing() {
            return;
        }
        for c in text.chars() {
            let allowed = c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-');
            if allowed && self.buffer.chars().count() < NAME_MAX_LENGTH {
                self.buffer.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.is_editing() {
            self.buffer.pop();
        }
    }

    /// Stop editing and hand back the sanitised name and the score to submit.
    pub fn confirm(&mut self) -> Option<(String, f64)> {
        if !self.is_editing() {
            return None;
        }
        let score = self.score?;
        let raw = if self.buffer.trim().is_empty() {
            &self.default_name
        } else {
            &self.buffer
        };
        let name = sanitize_name(raw);
        self.status = NameEntryStatus::Submitted(name.clone());
        Some((name, score))
    }

    /// Discard the score without submitting it.
    pub fn skip(&mut self) {
        if self.is_editing() {
            self.status = NameEntryStatus::Skipped;
        }
    }

    pub fn prompt(&self) -> String {
        match &self.status {
            NameEntryStatus::Idle => "Press R to retry".to_string(),
            NameEntryStatus::Editing if self.buffer.is_empty() => format!(
                "Name: _  ({})\nENTER to save  |  ESC to skip",
                sanitize_name(&self.default_name)
            ),
            NameEntryStatus::Editing => {
                format!("Name: {}_\nENTER to save  |  ESC to skip", self.buffer)
            }
            NameEntryStatus::Submitted(name) => format!("Saved as {name}\nPress R to retry"),
            NameEntryStatus::Skipped => "Score not saved\nPress R to retry".to_string(),
        }
    }
}

/// Top-N listing shown on the result screen.
pub fn board_listing(board: &Leaderboard) -> String {
    let rows = board.rows(LEADERBOARD_DISPLAY_COUNT);
    if rows.is_empty() {
        return "No scores yet".to_string();
    }
    format!("TOP {}\n{}", LEADERBOARD_DISPLAY_COUNT, rows.join("\n"))
}

// ── Plugin ────────────────────────────────────────────────────────────────────

/// Registers `GameState` and the result overlays.
///
/// Add before any plugin that uses `in_state(GameState::..)`.
pub struct GameMenuPlugin;

impl Plugin for GameMenuPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<LastRunScore>()
            .init_resource::<NameEntry>()
            .add_systems(OnEnter(GameState::GameClear), setup_result_overlay)
            .add_systems(OnEnter(GameState::GameOver), setup_result_overlay)
            .add_systems(OnExit(GameState::GameClear), cleanup_result)
            .add_systems(OnExit(GameState::GameOver), cleanup_result)
            .add_systems(
                Update,
                (
                    name_entry_input_system,
                    result_prompt_system,
                    result_board_system,
                )
                    .chain()
                    .run_if(not(in_state(GameState::Playing))),
            );
    }
}

// ── Colour helpers ────────────────────────────────────────────────────────────

fn clear_title_color() -> Color {
    Color::srgb(0.95, 0.88, 0.45)
}
fn over_title_color() -> Color {
    Color::srgb(1.0, 0.22, 0.22)
}
fn clear_border() -> Color {
    Color::srgb(0.60, 0.52, 0.18)
}
fn over_border() -> Color {
    Color::srgb(0.55, 0.10, 0.10)
}
fn body_color() -> Color {
    Color::srgb(0.80, 0.82, 0.92)
}
fn subtitle_color() -> Color {
    Color::srgb(0.55, 0.55, 0.65)
}
fn hint_color() -> Color {
    Color::srgb(0.40, 0.40, 0.50)
}
fn prompt_color() -> Color {
    Color::srgb(0.85, 0.85, 0.55)
}

// ── Result text ───────────────────────────────────────────────────────────────

/// Text lines of a result overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub title: &'static str,
    pub score_line: String,
    pub best_line: String,
    pub rank_line: Option<String>,
}

impl ResultSummary {
    pub fn new(outcome: Outcome, score: Option<f64>, board: &Leaderboard) -> Self {
        let (title, label) = match outcome {
            Outcome::Success => ("MOON STRUCK", "Score"),
            Outcome::Failure => ("LOST IN SPACE", "Final Score"),
        };
        let score_line = match score {
            Some(v) => format!("{label}: {v:.2}"),
            None => format!("{label}: ---"),
        };
        let best_line = match board.best() {
            Some(best) => format!("Best: {:.2} ({})", best.score, best.name),
            None => "Best: ---".to_string(),
        };
        let rank_line = score.map(|v| {
            let rank = board.rank_for_score(v);
            format!("Your rank: {}{}", rank, rank_suffix(rank))
        });
        Self {
            title,
            score_line,
            best_line,
            rank_line,
        }
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

fn text_line(card: &mut ChildSpawnerCommands<'_>, text: String, size: f32, color: Color) {
    card.spawn((
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
    ));
}

/// Spawn the result overlay for the state just entered.
pub fn setup_result_overlay(
    mut commands: Commands,
    state: Res<State<GameState>>,
    score: Res<LastRunScore>,
    store: Res<LeaderboardStore>,
    entry: Res<NameEntry>,
    stats: Res<StatisticsStore>,
) {
    let Some(outcome) = state.get().outcome() else {
        return;
    };
    let summary = ResultSummary::new(outcome, score.0, &store.board);
    let (title_color, border) = match outcome {
        Outcome::Success => (clear_title_color(), clear_border()),
        Outcome::Failure => (over_title_color(), over_border()),
    };

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
            ZIndex(300),
            ResultRoot,
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(Val::Px(40.0)),
                        row_gap: Val::Px(14.0),
                        border: UiRect::all(Val::Px(2.0)),
                        min_width: Val::Px(320.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.04, 0.04, 0.08)),
                    BorderColor::all(border),
                ))
                .with_children(|card| {
                    text_line(card, summary.title.to_string(), 42.0, title_color);
                    text_line(card, summary.score_line.clone(), 22.0, body_color());
                    text_line(card, summary.best_line.clone(), 16.0, subtitle_color());
                    if let Some(rank) = &summary.rank_line {
                        text_line(card, rank.clone(), 16.0, subtitle_color());
                    }
                    card.spawn((
                        Text::new(board_listing(&store.board)),
                        TextFont {
                            font_size: 14.0,
                            ..default()
                        },
                        TextColor(body_color()),
                        ResultBoardText,
                    ));
                    text_line(card, stats.stats.summary(), 12.0, hint_color());
                    card.spawn((
                        Text::new(entry.prompt()),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(prompt_color()),
                        ResultPromptText,
                    ));
                });
        });
}

/// Typed characters, BACKSPACE, ENTER (submit) and ESC (skip) for the name
/// prompt.
pub fn name_entry_input_system(
    mut typed: MessageReader<KeyboardInput>,
    keys: Res<ButtonInput<KeyCode>>,
    mut entry: ResMut<NameEntry>,
    mut store: ResMut<LeaderboardStore>,
) {
    if !entry.is_editing() {
        typed.clear();
        return;
    }
    for event in typed.read() {
        if event.state != ButtonState::Pressed {
            continue;
        }
        if let Some(text) = &event.text {
            entry.push_text(text.as_str());
        }
    }
    if keys.just_pressed(KeyCode::Backspace) {
        entry.backspace();
    }
    if keys.just_pressed(KeyCode::Escape) {
        entry.skip();
        info!("Score submission skipped");
        return;
    }
    if keys.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]) {
        if let Some((name, score)) = entry.confirm() {
            info!("Submitting {:.2} as {}", score, name);
            if let Err(err) = store.submit(&name, score) {
                error!("Could not save leaderboard: {}", err);
            }
        }
    }
}

pub fn result_prompt_system(
    entry: Res<NameEntry>,
    mut texts: Query<&mut Text, With<ResultPromptText>>,
) {
    if !entry.is_changed() {
        return;
    }
    for mut text in texts.iter_mut() {
        text.0 = entry.prompt();
    }
}

pub fn result_board_system(
    store: Res<LeaderboardStore>,
    mut texts: Query<&mut Text, With<ResultBoardText>>,
) {
    if !store.is_changed() {
        return;
    }
    for mut text in texts.iter_mut() {
        text.0 = board_listing(&store.board);
    }
}

/// Despawn the result overlay.
pub fn cleanup_result(mut commands: Commands, query: Query<Entity, With<ResultRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_names_resolve_loosely() {
        assert_eq!(GameState::from_scene_name("GameClear"), Some(GameState::GameClear));
        assert_eq!(GameState::from_scene_name(" gameover "), Some(GameState::GameOver));
        assert_eq!(GameState::from_scene_name("Leaderboard"), None);
        assert_eq!(GameState::from_scene_name(""), None);
    }

    #[test]
    fn typed_name_is_filtered_and_capped() {
        let mut entry = NameEntry::default();
        entry.push_text("ignored");
        assert!(entry.buffer.is_empty(), "no typing without a pending score");

        entry.begin(4.5, "Player");
        entry.push_text("Nova!\r");
        entry.push_text(" 7");
        assert_eq!(entry.buffer, "Nova 7");
        entry.backspace();
        assert_eq!(entry.buffer, "Nova ");

        entry.push_text(&"x".repeat(40));
        assert_eq!(entry.buffer.chars().count(), NAME_MAX_LENGTH);
    }

    #[test]
    fn confirm_submits_once_with_sanitised_name() {
        let mut entry = NameEntry::default();
        entry.begin(9.25, "Player");
        entry.push_text("  Vega  ");
        assert_eq!(entry.confirm(), Some(("Vega".to_string(), 9.25)));
        assert_eq!(entry.status, NameEntryStatus::Submitted("Vega".into()));
        assert_eq!(entry.confirm(), None);
        assert!(entry.prompt().starts_with("Saved as Vega"));
    }

    #[test]
    fn empty_name_falls_back_to_default() {
        let mut entry = NameEntry::default();
        entry.begin(1.0, "Pilot");
        assert!(entry.prompt().contains("(Pilot)"));
        assert_eq!(entry.confirm(), Some(("Pilot".to_string(), 1.0)));
    }

    #[test]
    fn skip_discards_the_score() {
        let mut entry = NameEntry::default();
        entry.begin(2.0, "Player");
        entry.skip();
        assert_eq!(entry.status, NameEntryStatus::Skipped);
        assert_eq!(entry.confirm(), None);
        assert!(!entry.is_editing());
    }

    #[test]
    fn listing_shows_top_rows() {
        assert_eq!(board_listing(&Leaderboard::default()), "No scores yet");
        let mut board = Leaderboard::default();
        for i in 0..8 {
            board.add_score(&format!("P{i}"), i as f64, i as u64);
        }
        let listing = board_listing(&board);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), LEADERBOARD_DISPLAY_COUNT + 1);
        assert_eq!(lines[0], format!("TOP {}", LEADERBOARD_DISPLAY_COUNT));
        assert!(lines[1].starts_with(" 1. P7"));
    }

    #[test]
    fn enter_submits_typed_name_to_board() {
        let dir = std::env::temp_dir().join(format!("moonsling-menu-{}", std::process::id()));
        let path = dir.join("leaderboard.toml");

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<KeyboardInput>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.insert_resource(LeaderboardStore::new(&path));
        app.init_resource::<NameEntry>();
        app.add_systems(Update, name_entry_input_system);

        app.world_mut().resource_mut::<NameEntry>().begin(7.5, "Player");
        app.world_mut().resource_mut::<NameEntry>().push_text("Orion");
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Enter);
        app.update();

        let board = &app.world().resource::<LeaderboardStore>().board;
        assert_eq!(board.len(), 1);
        assert_eq!(board.best().map(|e| e.name.as_str()), Some("Orion"));
        assert!(!app.world().resource::<NameEntry>().is_editing());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn summary_without_board_shows_placeholders() {
        let summary = ResultSummary::new(Outcome::Failure, Some(3.456), &Leaderboard::default());
        assert_eq!(summary.title, "LOST IN SPACE");
        assert_eq!(summary.score_line, "Final Score: 3.46");
        assert_eq!(summary.best_line, "Best: ---");
        assert_eq!(summary.rank_line.as_deref(), Some("Your rank: 1st"));
    }

    #[test]
    fn summary_ranks_against_board() {
        let mut board = Leaderboard::default();
        board.add_score("Ace", 20.0, 1);
        board.add_score("Deuce", 12.0, 2);
        board.add_score("Me", 9.0, 3);
        let summary = ResultSummary::new(Outcome::Success, Some(9.0), &board);
        assert_eq!(summary.score_line, "Score: 9.00");
        assert_eq!(summary.best_line, "Best: 20.00 (Ace)");
        assert_eq!(summary.rank_line.as_deref(), Some("Your rank: 3rd"));
    }
}
