use super::{
    action::Direction,
    config::GameConfig,
    state::{EpisodeState, EpisodeStatus, Position, Snake},
};
use rand::Rng;

/// Result of a single tick for one instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Reward for this tick; exactly one of the four reward rules applies
    pub reward: f32,
    /// True iff the instance is Died or Won after this tick
    pub done: bool,
    /// Whether the snake ate a fruit this tick
    pub ate_fruit: bool,
}

/// Advances a single episode instance
///
/// The engine owns the configuration and the fruit-placement RNG; the
/// episode state it mutates is passed in. `step` reads and writes only that
/// one instance, which is what lets the batched environment advance N
/// instances as a plain per-instance map.
pub struct GameEngine {
    config: GameConfig,
    rng: rand::rngs::ThreadRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: rand::thread_rng(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Build a fresh episode: a snake of the configured length centered on
    /// the grid moving Right, fruit on a random unoccupied cell
    pub fn reset(&mut self) -> EpisodeState {
        let center = (self.config.grid_size / 2) as i32;

        let snake = Snake::new(
            Position::new(center, center),
            Direction::Right,
            self.config.initial_snake_length,
        );

        let fruit = self.spawn_fruit_avoid_snake(&snake);

        EpisodeState::new(snake, fruit, self.config.grid_size)
    }

    /// Execute one tick for one instance
    ///
    /// Order of operations: apply the direction unless it reverses the
    /// current one; advance the head; on a fruit cell keep the tail (grow),
    /// bump the score and either mark Won (body fills the grid, fruit not
    /// respawned) or respawn the fruit; otherwise drop the tail. If the
    /// instance did not win, it dies when the new head is out of bounds or
    /// on another body cell, checked against the post-move body.
    ///
    /// The caller must not step a terminal instance; the batched
    /// environment resets terminal instances before their next tick.
    pub fn step(&mut self, state: &mut EpisodeState, direction: Direction) -> StepOutcome {
        debug_assert_eq!(state.status, EpisodeStatus::Running);

        // Reversals are silently ignored (no 180-degree turns)
        if !state.snake.direction.is_opposite(direction) {
            state.snake.direction = direction;
        }

        let ate_fruit =
            state.snake.head().moved_in_direction(state.snake.direction) == state.fruit;
        state.snake.advance(ate_fruit);

        if ate_fruit {
            state.score += 1;
            if state.snake.len() == state.cell_count() {
                state.status = EpisodeStatus::Won;
            } else {
                state.fruit = self.spawn_fruit_avoid_snake(&state.snake);
            }
        }

        if state.status != EpisodeStatus::Won {
            let head = state.snake.head();
            if !state.is_in_bounds(head) || state.snake.collides_with_body(head) {
                state.status = EpisodeStatus::Died;
            }
        }

        let reward = match state.status {
            EpisodeStatus::Won => self.config.reward_win,
            EpisodeStatus::Died => self.config.reward_death,
            EpisodeStatus::Running if ate_fruit => self.config.reward_fruit,
            EpisodeStatus::Running => self.config.reward_step,
        };

        StepOutcome {
            reward,
            done: state.is_terminal(),
            ate_fruit,
        }
    }

    /// Spawn a fruit at a random cell not occupied by the snake
    fn spawn_fruit_avoid_snake(&mut self, snake: &Snake) -> Position {
        loop {
            let x = self.rng.gen_range(0..self.config.grid_size) as i32;
            let y = self.rng.gen_range(0..self.config.grid_size) as i32;
            let pos = Position::new(x, y);

            if !snake.body.contains(&pos) {
                return pos;
            }
        }
    }
}
