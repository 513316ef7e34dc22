//! Termination detector: out-of-bounds check, final score hand-off, and the
//! outcome scene request.
//!
//! ## Collaborators
//!
//! The core talks to the outside world through three injected interfaces,
//! bundled in [`Collaborators`] and handed to the flight core at construction:
//!
//! | Trait              | Call                        | Bevy adapter effect                  |
//! |--------------------|-----------------------------|--------------------------------------|
//! | [`ScoreSink`]      | `record_final_score(f64)`   | leaderboard submit + result screen   |
//! | [`SceneDirector`]  | `request_scene(Outcome)`    | `NextState<GameState>`               |
//! | [`SceneDirector`]  | `set_time_scale(f32)`       | `Time<Virtual>` relative speed       |
//! | [`ImpactNotifier`] | `notify_impact(f64)`        | moon shatter particles               |
//!
//! ## Idempotence
//!
//! [`Terminator::finalize`] latches on first call.  Any later call, with any
//! score, is a silent no-op, so exactly one score and one scene request are
//! issued per run.

use crate::error::GameResult;
use bevy::log::{error, info};

// ── Viewport check ────────────────────────────────────────────────────────────

/// Body position projected into normalized viewport space.
///
/// `(0, 0)` is the bottom-left of the visible screen, `(1, 1)` the top-right.
/// `z < 0` means the point is behind the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ViewportPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Signed deviation from the viewport center; `±1` is the screen edge.
    #[inline]
    pub fn deviation(&self) -> (f32, f32) {
        ((self.x - 0.5) / 0.5, (self.y - 0.5) / 0.5)
    }
}

/// `true` when the point lies beyond `extent_factor + margin` screen
/// half-widths from the viewport center on either axis.
///
/// Points behind the camera are never out of bounds.
pub fn check_out_of_bounds(vp: ViewportPoint, extent_factor: f32, margin: f32) -> bool {
    if vp.z < 0.0 {
        return false;
    }
    let (fx, fy) = vp.deviation();
    let max_abs = extent_factor + margin;
    fx.abs() > max_abs || fy.abs() > max_abs
}

// ── Outcome & collaborators ───────────────────────────────────────────────────

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The body struck the moon after launching from it.
    Success,
    /// The body left the play area.
    Failure,
}

/// The single final score of a run, derived from the orbit speed at termination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalScore(pub f64);

impl FinalScore {
    pub fn from_speed(speed: f32) -> Self {
        Self(f64::from(speed))
    }
}

/// Receives the final score for persistence and display.
pub trait ScoreSink: Send + Sync {
    fn record_final_score(&mut self, value: f64);
}

/// Routes the outcome to a scene and controls the global simulation rate.
pub trait SceneDirector: Send + Sync {
    /// Request the scene for `outcome`.  An error means the destination could
    /// not be resolved; the caller freezes the simulation.
    fn request_scene(&mut self, outcome: Outcome) -> GameResult<()>;

    /// Set the global simulation rate (`1.0` normal, `0.0` frozen).
    fn set_time_scale(&mut self, scale: f32);
}

/// Fire-and-forget notification for the cosmetic moon impact effect.
pub trait ImpactNotifier: Send + Sync {
    fn notify_impact(&mut self, speed: f64);
}

/// The outbound interfaces of one run.
pub struct Collaborators {
    pub score: Box<dyn ScoreSink>,
    pub scenes: Box<dyn SceneDirector>,
    pub impact: Box<dyn ImpactNotifier>,
}

impl Collaborators {
    pub fn new(
        score: impl ScoreSink + 'static,
        scenes: impl SceneDirector + 'static,
        impact: impl ImpactNotifier + 'static,
    ) -> Self {
        Self {
            score: Box::new(score),
            scenes: Box::new(scenes),
            impact: Box::new(impact),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Collaborators { .. }")
    }
}

// ── Terminator ────────────────────────────────────────────────────────────────

/// A scene request waiting for its display delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingScene {
    pub outcome: Outcome,
    /// Seconds left before the request is issued.
    pub remaining: f32,
}

/// Ends the run exactly once and schedules the outcome scene.
#[derive(Debug)]
pub struct Terminator {
    collaborators: Collaborators,
    final_score: Option<FinalScore>,
    pending: Option<PendingScene>,
    scene_requests: u32,
    frozen: bool,
}

impl Terminator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            final_score: None,
            pending: None,
            scene_requests: 0,
            frozen: false,
        }
    }

    /// Forward a moon impact to the cosmetic collaborator.
    pub fn notify_impact(&mut self, speed: f32) {
        self.collaborators.impact.notify_impact(f64::from(speed));
    }

    /// Record `score`, restore the simulation rate and request the scene for
    /// `outcome`, after `delay` seconds when `delay > 0`.
    ///
    /// Returns `false` (and does nothing) if the run was already finalized.
    pub fn finalize(&mut self, score: FinalScore, outcome: Outcome, delay: f32) -> bool {
        if self.final_score.is_some() {
            return false;
        }
        self.final_score = Some(score);
        info!("Run finished ({:?}): final score {:.2}", outcome, score.0);

        self.collaborators.score.record_final_score(score.0);
        self.collaborators.scenes.set_time_scale(1.0);

        if delay > 0.0 {
            self.pending = Some(PendingScene {
                outcome,
                remaining: delay,
            });
        } else {
            self.request(outcome);
        }
        true
    }

    /// Count down a pending delayed scene request and issue it when due.
    pub fn tick(&mut self, dt: f32) {
        let Some(mut pending) = self.pending.take() else {
            return;
        };
        pending.remaining -= dt;
        if pending.remaining <= 0.0 {
            self.request(pending.outcome);
        } else {
            self.pending = Some(pending);
        }
    }

    fn request(&mut self, outcome: Outcome) {
        self.scene_requests += 1;
        if let Err(err) = self.collaborators.scenes.request_scene(outcome) {
            error!("Scene request for {:?} failed: {}; freezing simulation", outcome, err);
            self.collaborators.scenes.set_time_scale(0.0);
            self.frozen = true;
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.final_score.is_some()
    }

    pub fn final_score(&self) -> Option<FinalScore> {
        self.final_score
    }

    pub fn pending(&self) -> Option<PendingScene> {
        self.pending
    }

    /// Number of scene requests issued (at most one per run).
    pub fn scene_requests(&self) -> u32 {
        self.scene_requests
    }

    /// `true` after a scene request failed and the simulation was frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        scores: Vec<f64>,
        scenes: Vec<Outcome>,
        scales: Vec<f32>,
    }

    #[derive(Clone, Default)]
    struct Recorder {
        log: Arc<Mutex<Log>>,
        fail_scenes: bool,
    }

    impl ScoreSink for Recorder {
        fn record_final_score(&mut self, value: f64) {
            self.log.lock().unwrap().scores.push(value);
        }
    }

    impl SceneDirector for Recorder {
        fn request_scene(&mut self, outcome: Outcome) -> GameResult<()> {
            if self.fail_scenes {
                return Err(GameError::UnknownScene {
                    name: "Nowhere".into(),
                });
            }
            self.log.lock().unwrap().scenes.push(outcome);
            Ok(())
        }

        fn set_time_scale(&mut self, scale: f32) {
            self.log.lock().unwrap().scales.push(scale);
        }
    }

    impl ImpactNotifier for Recorder {
        fn notify_impact(&mut self, _speed: f64) {}
    }

    fn terminator(recorder: &Recorder) -> Terminator {
        Terminator::new(Collaborators::new(
            recorder.clone(),
            recorder.clone(),
            recorder.clone(),
        ))
    }

    #[test]
    fn out_of_bounds_uses_additive_margin() {
        let at = |fx: f32| ViewportPoint::new(0.5 + fx * 0.5, 0.5);
        assert!(check_out_of_bounds(at(1.6), 1.5, 0.05));
        assert!(!check_out_of_bounds(at(1.5), 1.5, 0.05));
        assert!(check_out_of_bounds(at(-1.6), 1.5, 0.05));
        assert!(check_out_of_bounds(ViewportPoint::new(0.5, 0.5 - 0.8), 1.5, 0.05));
    }

    #[test]
    fn behind_camera_is_never_out_of_bounds() {
        let vp = ViewportPoint {
            x: 40.0,
            y: 0.5,
            z: -1.0,
        };
        assert!(!check_out_of_bounds(vp, 1.0, 0.0));
    }

    #[test]
    fn finalize_records_only_first_score() {
        let recorder = Recorder::default();
        let mut t = terminator(&recorder);

        assert!(t.finalize(FinalScore(15.0), Outcome::Failure, 0.0));
        assert!(!t.finalize(FinalScore(99.0), Outcome::Success, 0.0));

        let log = recorder.log.lock().unwrap();
        assert_eq!(log.scores, vec![15.0]);
        assert_eq!(log.scenes, vec![Outcome::Failure]);
        assert_eq!(log.scales, vec![1.0]);
        assert_eq!(t.final_score(), Some(FinalScore(15.0)));
        assert_eq!(t.scene_requests(), 1);
    }

    #[test]
    fn delayed_request_fires_once_after_delay() {
        let recorder = Recorder::default();
        let mut t = terminator(&recorder);
        t.finalize(FinalScore(3.0), Outcome::Success, 1.5);

        t.tick(1.0);
        assert!(recorder.log.lock().unwrap().scenes.is_empty());
        t.tick(0.6);
        t.tick(5.0);

        assert_eq!(recorder.log.lock().unwrap().scenes, vec![Outcome::Success]);
        assert!(t.pending().is_none());
        assert_eq!(t.scene_requests(), 1);
    }

    #[test]
    fn failed_scene_request_freezes_simulation() {
        let recorder = Recorder {
            fail_scenes: true,
            ..Default::default()
        };
        let mut t = terminator(&recorder);
        t.finalize(FinalScore(2.0), Outcome::Failure, 0.0);

        assert!(t.is_frozen());
        assert_eq!(recorder.log.lock().unwrap().scales, vec![1.0, 0.0]);
    }
}
