//! Core game logic for a single snake episode
//!
//! Everything here is per-instance: one `EpisodeState` advanced one tick at
//! a time by the `GameEngine`. Batching lives in `crate::rl::environment`.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::{Direction, NUM_ACTIONS};
pub use config::GameConfig;
pub use engine::{GameEngine, StepOutcome};
pub use state::{EpisodeState, EpisodeStatus, Position, Snake};
