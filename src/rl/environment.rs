use super::observation::{observation_dim, observation_tensor, stack_observations};
use crate::error::SnakeDqnError;
use crate::game::{Direction, EpisodeState, EpisodeStatus, GameConfig, GameEngine};
use burn::tensor::{backend::Backend, Tensor};

/// Result of advancing the whole batch by one tick
#[derive(Debug, Clone)]
pub struct StepBatch<B: Backend> {
    /// Post-action observations, shape [N, D]. For finished instances this
    /// is the terminal observation; the reset state becomes visible on the
    /// next call.
    pub observations: Tensor<B, 2>,
    /// The same observations as per-instance rows, shape [D] each, so a
    /// trainer can store transitions without slicing the batch
    pub instance_observations: Vec<Tensor<B, 1>>,
    /// Per-instance reward for this tick
    pub rewards: Vec<f32>,
    /// Per-instance terminal flag (Died or Won this tick)
    pub dones: Vec<bool>,
    /// Per-instance score after this tick (pre-reset for finished instances)
    pub scores: Vec<u32>,
}

/// Batched snake environment for reinforcement learning
///
/// Owns N independent episode instances and advances all of them one
/// synchronized tick per `step` call. Each instance is updated only from its
/// own prior state and its own action; instances never observe one another.
///
/// Finished instances are auto-reset inside `step`, after their terminal
/// observation, reward and done flag have been captured, so callers never
/// special-case terminated instances. The fresh state is first observable on
/// the following call (a one-tick delay).
pub struct BatchedEnvironment<B: Backend> {
    engine: GameEngine,
    states: Vec<EpisodeState>,
    device: B::Device,
}

impl<B: Backend> BatchedEnvironment<B> {
    /// Create a batched environment with `num_instances` fresh episodes
    pub fn new(config: GameConfig, num_instances: usize, device: B::Device) -> Self {
        assert!(num_instances > 0, "batch must hold at least one instance");
        let mut engine = GameEngine::new(config);
        let states = (0..num_instances).map(|_| engine.reset()).collect();
        Self {
            engine,
            states,
            device,
        }
    }

    /// Number of instances advanced per tick
    pub fn num_instances(&self) -> usize {
        self.states.len()
    }

    /// Length of each instance's observation vector
    pub fn observation_dim(&self) -> usize {
        observation_dim(self.engine.config().grid_size)
    }

    /// Read access to the per-instance states
    pub fn states(&self) -> &[EpisodeState] {
        &self.states
    }

    /// Device observations are created on
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Reinitialize every instance and return their observations, [N, D]
    pub fn reset_all(&mut self) -> Tensor<B, 2> {
        for state in &mut self.states {
            *state = self.engine.reset();
        }
        self.get_observations()
    }

    /// Encode the current state of all instances without advancing, [N, D]
    pub fn get_observations(&self) -> Tensor<B, 2> {
        stack_observations(&self.instance_observations())
    }

    /// Encode the current state of all instances as per-instance rows
    pub fn instance_observations(&self) -> Vec<Tensor<B, 1>> {
        self.states
            .iter()
            .map(|state| observation_tensor(state, &self.device))
            .collect()
    }

    /// Advance every instance by one tick
    ///
    /// All action ids are validated before any instance mutates, so an
    /// `InvalidAction` error leaves the batch untouched. Reversal actions
    /// are ignored per instance (direction unchanged), not an error.
    pub fn step(&mut self, actions: &[usize]) -> Result<StepBatch<B>, SnakeDqnError> {
        assert_eq!(
            actions.len(),
            self.states.len(),
            "one action per instance required"
        );

        let directions = actions
            .iter()
            .enumerate()
            .map(|(instance, &action)| {
                Direction::from_index(action).ok_or(SnakeDqnError::InvalidAction {
                    action,
                    instance,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = self.states.len();
        let mut instance_observations = Vec::with_capacity(n);
        let mut rewards = Vec::with_capacity(n);
        let mut dones = Vec::with_capacity(n);
        let mut scores = Vec::with_capacity(n);

        for (state, direction) in self.states.iter_mut().zip(directions) {
            let outcome = self.engine.step(state, direction);

            // Capture the post-action view before any reset
            instance_observations.push(observation_tensor(state, &self.device));
            rewards.push(outcome.reward);
            dones.push(outcome.done);
            scores.push(state.score);

            // Terminal -> Running edge: the reset happens here, after
            // capture, and is not observable until the next tick
            match state.status {
                EpisodeStatus::Running => {}
                EpisodeStatus::Died | EpisodeStatus::Won => {
                    *state = self.engine.reset();
                }
            }
        }

        Ok(StepBatch {
            observations: stack_observations(&instance_observations),
            instance_observations,
            rewards,
            dones,
            scores,
        })
    }
}
