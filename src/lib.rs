//! Moonsling: launch a body off a spinning moon, get captured and boosted by
//! planetary gravity fields, and sling back into the moon for a score.
//!
//! The flight core (`orbit`, `player::flight`, `termination`) is plain Rust
//! driven through explicit entry points; the remaining modules are the Bevy
//! and Rapier glue around it.

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod graphics;
pub mod gravity_field;
pub mod leaderboard;
pub mod menu;
pub mod orbit;
pub mod particles;
pub mod planet;
pub mod player;
pub mod rendering;
pub mod simulation;
pub mod statistics;
pub mod termination;
