//! Reinforcement learning layer for the Snake game
//!
//! Provides:
//! - Flat observation encoding (grid cells, direction one-hot, fruit delta)
//! - A lockstep batched environment with auto-resetting instances
//! - A prioritized replay store with stale-update detection
//! - A DQN training loop generic over the Q-value approximator

pub mod backend;
pub mod config;
pub mod environment;
pub mod memory;
pub mod observation;
pub mod trainer;

pub use backend::{default_device, DefaultBackend};
pub use config::DqnConfig;
pub use environment::{BatchedEnvironment, StepBatch};
pub use memory::{PrioritizedReplay, SampleBatch, Transition};
pub use observation::{encode_state, observation_dim, observation_tensor, stack_observations};
pub use trainer::{DqnTrainer, QEstimator};
