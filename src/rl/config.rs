//! DQN algorithm hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Configuration for the DQN (Deep Q-Network) training loop
///
/// This struct contains all hyperparameters used by the trainer: batch
/// simulation width, replay store shape, epsilon-greedy exploration
/// schedule, discount, target refresh cadence, and the prioritized
/// sampling exponents. Defaults are tuned for the Snake environment.
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::DqnConfig;
///
/// // Use default hyperparameters
/// let config = DqnConfig::default();
///
/// // Or customize specific parameters
/// let config = DqnConfig {
///     num_instances: 16,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Number of game instances stepped together each tick
    ///
    /// Default: 64
    pub num_instances: usize,

    /// Capacity of the replay store; the oldest transition is evicted
    /// once the store is full
    ///
    /// Default: 100_000
    pub memory_capacity: usize,

    /// Minibatch size drawn from the replay store per optimization step
    ///
    /// Default: 128
    pub batch_size: usize,

    /// Discount factor for future rewards (gamma)
    ///
    /// Values closer to 1.0 make the agent more far-sighted.
    ///
    /// Default: 0.99
    pub gamma: f32,

    /// Initial epsilon for epsilon-greedy action selection
    ///
    /// Default: 1.0
    pub epsilon_start: f64,

    /// Floor epsilon; decay never takes exploration below this
    ///
    /// Default: 0.05
    pub epsilon_end: f64,

    /// Multiplicative epsilon decay applied once per tick
    ///
    /// Default: 0.995
    pub epsilon_decay: f64,

    /// Environment steps between target estimator refreshes
    ///
    /// Counted in per-instance steps, so one tick with 64 instances
    /// advances the counter by 64.
    ///
    /// Default: 1000
    pub target_update_interval: usize,

    /// Prioritization exponent (alpha)
    ///
    /// 0.0 gives uniform sampling; 1.0 samples proportionally to raw
    /// priority.
    ///
    /// Default: 0.6
    pub per_alpha: f64,

    /// Importance-sampling exponent (beta)
    ///
    /// Controls how strongly sampled weights correct the prioritization
    /// bias. 1.0 fully compensates.
    ///
    /// Default: 0.4
    pub per_beta: f64,

    /// Positive floor applied to every stored priority
    ///
    /// Keeps zero-TD-error transitions reachable by sampling.
    ///
    /// Default: 0.01
    pub per_epsilon: f64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            num_instances: 64,
            memory_capacity: 100_000,
            batch_size: 128,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            target_update_interval: 1000,
            per_alpha: 0.6,
            per_beta: 0.4,
            per_epsilon: 0.01,
        }
    }
}
