//! Batched snake simulation and prioritized experience replay for
//! off-policy reinforcement learning.
//!
//! This library provides:
//! - Core game logic for a single episode (game module)
//! - A lockstep batched environment, flat observation encoding, a
//!   priority-weighted replay store, and DQN training glue (rl module)
//! - Training statistics tracking (metrics module)
//!
//! The function approximator itself is not part of this crate: the trainer
//! consumes any scoring function implementing [`rl::QEstimator`] and only
//! exchanges plain numeric tensors with it.

pub mod error;
pub mod game;
pub mod metrics;
pub mod rl;

pub use error::SnakeDqnError;
