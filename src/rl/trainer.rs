//! DQN training loop over the batched environment
//!
//! This module drives the off-policy training cycle: epsilon-greedy action
//! selection across all game instances, transition storage into the
//! prioritized replay store, TD-target computation against a target
//! estimator, and priority refresh from the resulting TD errors.
//!
//! The Q-function itself lives behind the [`QEstimator`] trait; the trainer
//! only consumes Q-value batches and hands back fit targets, so any
//! approximator with a frozen target copy plugs in.

use anyhow::Context;
use burn::tensor::{backend::Backend, Tensor};
use rand::Rng;

use crate::error::SnakeDqnError;
use crate::game::{GameConfig, NUM_ACTIONS};
use crate::metrics::TrainingStats;

use super::config::DqnConfig;
use super::environment::BatchedEnvironment;
use super::memory::{PrioritizedReplay, Transition};
use super::observation::stack_observations;

/// Rolling-average window for reported statistics
const STATS_WINDOW: usize = 100;

/// Q-value approximator with a separable target copy
///
/// `policy_values` and `target_values` both map a `[N, D]` observation batch
/// to `[N, A]` Q-values; the target variant must come from the frozen copy
/// that `refresh_target` synchronizes with the policy.
pub trait QEstimator<B: Backend> {
    /// Q-values from the online policy estimator, `[N, A]`
    fn policy_values(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Q-values from the frozen target estimator, `[N, A]`
    fn target_values(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Fit the online estimator toward per-sample scalar targets
    ///
    /// `targets[i]` is the TD target for `Q(states[i], actions[i])`;
    /// `is_weights` scales each sample's loss contribution. Returns the
    /// weighted loss for reporting.
    fn fit(
        &mut self,
        states: Tensor<B, 2>,
        actions: &[usize],
        targets: &[f32],
        is_weights: &[f32],
    ) -> f32;

    /// Copy the online estimator's parameters into the target estimator
    fn refresh_target(&mut self);
}

/// DQN trainer coupling environment, replay store and estimator
pub struct DqnTrainer<B: Backend, Q: QEstimator<B>> {
    env: BatchedEnvironment<B>,
    replay: PrioritizedReplay<Transition<B>>,
    estimator: Q,
    config: DqnConfig,
    stats: TrainingStats,

    /// Current exploration rate
    epsilon: f64,
    /// Per-instance environment steps taken so far
    env_steps: usize,
    /// Latest observation per instance, the `state` side of the next
    /// transition
    current: Vec<Tensor<B, 1>>,
    /// Running reward accumulator per instance, reset on episode end
    episode_rewards: Vec<f32>,
    /// Running length accumulator per instance, reset on episode end
    episode_lengths: Vec<usize>,
}

impl<B: Backend, Q: QEstimator<B>> DqnTrainer<B, Q> {
    /// Create a trainer with fresh episodes in every instance
    pub fn new(game_config: GameConfig, config: DqnConfig, estimator: Q, device: B::Device) -> Self {
        let env = BatchedEnvironment::new(game_config, config.num_instances, device);
        let current = env.instance_observations();
        let replay = PrioritizedReplay::new(
            config.memory_capacity,
            config.per_alpha,
            config.per_beta,
            config.per_epsilon,
        );
        let num_instances = config.num_instances;

        Self {
            env,
            replay,
            estimator,
            config: config.clone(),
            stats: TrainingStats::new(STATS_WINDOW),
            epsilon: config.epsilon_start,
            env_steps: 0,
            current,
            episode_rewards: vec![0.0; num_instances],
            episode_lengths: vec![0; num_instances],
        }
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Per-instance environment steps taken so far
    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }

    pub fn estimator(&self) -> &Q {
        &self.estimator
    }

    /// Epsilon-greedy action selection over the current observation batch
    fn select_actions(&self, rng: &mut impl Rng) -> Vec<usize> {
        let states = stack_observations(&self.current);
        let q_values = self
            .estimator
            .policy_values(states)
            .into_data()
            .to_vec::<f32>()
            .expect("Q-value tensor should hold f32 data");

        q_values
            .chunks(NUM_ACTIONS)
            .map(|row| {
                if rng.gen::<f64>() < self.epsilon {
                    rng.gen_range(0..NUM_ACTIONS)
                } else {
                    argmax(row)
                }
            })
            .collect()
    }

    /// Advance every instance one step, store transitions, and optimize
    ///
    /// Returns the minibatch loss when an optimization step ran (the store
    /// must hold at least one full batch first).
    pub fn tick(&mut self, rng: &mut impl Rng) -> Result<Option<f32>, SnakeDqnError> {
        let actions = self.select_actions(rng);
        let step = self.env.step(&actions)?;

        for i in 0..self.env.num_instances() {
            self.replay.push(
                Transition {
                    state: self.current[i].clone(),
                    action: actions[i],
                    reward: step.rewards[i],
                    next_state: step.instance_observations[i].clone(),
                    done: step.dones[i],
                },
                None,
            );

            self.episode_rewards[i] += step.rewards[i];
            self.episode_lengths[i] += 1;
            if step.dones[i] {
                self.stats.record_episode(
                    self.episode_rewards[i],
                    self.episode_lengths[i],
                    step.scores[i],
                );
                self.episode_rewards[i] = 0.0;
                self.episode_lengths[i] = 0;
            }
        }

        // Finished instances were reset inside step, so re-encoding from the
        // environment picks up their fresh episodes
        self.current = self.env.instance_observations();

        let loss = if self.replay.len() >= self.config.batch_size {
            let loss = self.optimize_step(rng)?;
            self.stats.record_loss(loss);
            Some(loss)
        } else {
            None
        };

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_end);

        // Refresh on every crossing of the interval, counted in per-instance
        // steps; a tick can cross at most one boundary in practice but the
        // comparison holds either way
        let refreshes_before = self.env_steps / self.config.target_update_interval;
        self.env_steps += self.env.num_instances();
        if self.env_steps / self.config.target_update_interval > refreshes_before {
            self.estimator.refresh_target();
            log::debug!(
                "target estimator refreshed at {} env steps",
                self.env_steps
            );
        }

        Ok(loss)
    }

    /// One prioritized minibatch update
    ///
    /// Computes TD targets from the frozen estimator, fits the online
    /// estimator under importance weights, and feeds the absolute TD errors
    /// back as fresh priorities. A stale sampled index (overwritten between
    /// sampling and update) is logged, not fatal: the fit already happened
    /// and the live priorities were applied.
    fn optimize_step(&mut self, rng: &mut impl Rng) -> Result<f32, SnakeDqnError> {
        let batch_size = self.config.batch_size;
        let gamma = self.config.gamma;

        let (states, next_states, actions, rewards, dones, indices, is_weights) = {
            let batch = self.replay.sample(batch_size, rng)?;
            let states: Vec<_> = batch.values.iter().map(|t| t.state.clone()).collect();
            let next_states: Vec<_> = batch.values.iter().map(|t| t.next_state.clone()).collect();
            let actions: Vec<_> = batch.values.iter().map(|t| t.action).collect();
            let rewards: Vec<_> = batch.values.iter().map(|t| t.reward).collect();
            let dones: Vec<_> = batch.values.iter().map(|t| t.done).collect();
            (
                stack_observations(&states),
                stack_observations(&next_states),
                actions,
                rewards,
                dones,
                batch.indices,
                batch.is_weights,
            )
        };

        let next_q = self
            .estimator
            .target_values(next_states)
            .into_data()
            .to_vec::<f32>()
            .expect("Q-value tensor should hold f32 data");

        let targets: Vec<f32> = next_q
            .chunks(NUM_ACTIONS)
            .zip(rewards.iter().zip(&dones))
            .map(|(row, (&reward, &done))| {
                if done {
                    reward
                } else {
                    reward + gamma * max_value(row)
                }
            })
            .collect();

        let policy_q = self
            .estimator
            .policy_values(states.clone())
            .into_data()
            .to_vec::<f32>()
            .expect("Q-value tensor should hold f32 data");

        let td_errors: Vec<f64> = policy_q
            .chunks(NUM_ACTIONS)
            .zip(actions.iter().zip(&targets))
            .map(|(row, (&action, &target))| f64::from((row[action] - target).abs()))
            .collect();

        let loss = self
            .estimator
            .fit(states, &actions, &targets, &is_weights);

        if let Err(SnakeDqnError::StaleIndex { index }) =
            self.replay.update_priorities(&indices, &td_errors)
        {
            log::warn!("dropped priority update for overwritten replay index {index}");
        }

        Ok(loss)
    }

    /// Run the training loop for a fixed number of ticks
    pub fn run(&mut self, num_ticks: usize, rng: &mut impl Rng) -> anyhow::Result<()> {
        for tick in 0..num_ticks {
            self.tick(rng)
                .with_context(|| format!("training tick {tick} failed"))?;
        }
        log::info!("{}", self.stats.format_summary());
        Ok(())
    }
}

/// Index of the largest element; ties break toward the lower index
fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

fn max_value(row: &[f32]) -> f32 {
    row.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    type TestBackend = NdArray<f32>;

    /// Estimator returning constant Q-values, counting calls
    struct StubEstimator {
        fits: Cell<usize>,
        refreshes: Cell<usize>,
    }

    impl StubEstimator {
        fn new() -> Self {
            Self {
                fits: Cell::new(0),
                refreshes: Cell::new(0),
            }
        }
    }

    impl QEstimator<TestBackend> for StubEstimator {
        fn policy_values(&self, states: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
            let [n, _] = states.dims();
            Tensor::zeros([n, NUM_ACTIONS], &states.device())
        }

        fn target_values(&self, states: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
            let [n, _] = states.dims();
            Tensor::zeros([n, NUM_ACTIONS], &states.device())
        }

        fn fit(
            &mut self,
            _states: Tensor<TestBackend, 2>,
            actions: &[usize],
            targets: &[f32],
            is_weights: &[f32],
        ) -> f32 {
            assert_eq!(actions.len(), targets.len());
            assert_eq!(actions.len(), is_weights.len());
            self.fits.set(self.fits.get() + 1);
            0.5
        }

        fn refresh_target(&mut self) {
            self.refreshes.set(self.refreshes.get() + 1);
        }
    }

    fn small_trainer(config: DqnConfig) -> DqnTrainer<TestBackend, StubEstimator> {
        DqnTrainer::new(
            GameConfig::small(),
            config,
            StubEstimator::new(),
            NdArrayDevice::default(),
        )
    }

    #[test]
    fn test_tick_fills_replay() {
        let config = DqnConfig {
            num_instances: 4,
            batch_size: 128,
            ..Default::default()
        };
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..3 {
            let loss = trainer.tick(&mut rng).unwrap();
            // Not enough data for a minibatch yet
            assert!(loss.is_none());
        }
        assert_eq!(trainer.replay_len(), 12);
        assert_eq!(trainer.env_steps(), 12);
    }

    /// Small config so optimization kicks in after two ticks
    fn small_config() -> DqnConfig {
        DqnConfig {
            num_instances: 4,
            batch_size: 8,
            memory_capacity: 64,
            target_update_interval: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_optimize_runs_once_filled() {
        let config = small_config();
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(1);

        // 2 ticks x 4 instances reach the batch size of 8
        assert!(trainer.tick(&mut rng).unwrap().is_none());
        let loss = trainer.tick(&mut rng).unwrap();
        assert_eq!(loss, Some(0.5));
        assert_eq!(trainer.estimator().fits.get(), 1);
    }

    #[test]
    fn test_target_refresh_counts_env_steps() {
        // 4 instances, interval 10: crossings after ticks 3 (12 steps),
        // 5 (20), 8 (32), 10 (40)
        let config = small_config();
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(2);

        let mut refreshes_per_tick = Vec::new();
        for _ in 0..10 {
            trainer.tick(&mut rng).unwrap();
            refreshes_per_tick.push(trainer.estimator().refreshes.get());
        }
        assert_eq!(refreshes_per_tick, vec![0, 0, 1, 1, 2, 2, 2, 3, 3, 4]);
    }

    #[test]
    fn test_epsilon_decays_to_floor() {
        let config = DqnConfig {
            num_instances: 2,
            epsilon_start: 0.1,
            epsilon_end: 0.05,
            epsilon_decay: 0.5,
            ..Default::default()
        };
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(3);

        trainer.tick(&mut rng).unwrap();
        assert_eq!(trainer.epsilon(), 0.05);
        trainer.tick(&mut rng).unwrap();
        assert_eq!(trainer.epsilon(), 0.05);
    }

    #[test]
    fn test_episodes_recorded_on_small_grid() {
        // With full exploration on a 6x6 grid, instances die regularly
        let config = DqnConfig {
            num_instances: 4,
            batch_size: 10_000,
            epsilon_start: 1.0,
            epsilon_decay: 1.0,
            ..Default::default()
        };
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..200 {
            trainer.tick(&mut rng).unwrap();
        }
        assert!(trainer.stats().total_episodes() > 0);
        assert!(trainer.stats().mean_episode_length() > 0.0);
    }

    #[test]
    fn test_run_reports_context() {
        let config = small_config();
        let mut trainer = small_trainer(config);
        let mut rng = StdRng::seed_from_u64(5);
        trainer.run(5, &mut rng).unwrap();
        assert_eq!(trainer.env_steps(), 20);
    }

    #[test]
    fn test_argmax_tie_breaks_low() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[0.0, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax(&[-1.0, -3.0, -0.5, -2.0]), 2);
    }
}
