use serde::{Deserialize, Serialize};

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square game grid, in cells
    pub grid_size: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,

    // Rewards (exactly one applies per tick)
    /// Reward for eating a fruit without terminating
    pub reward_fruit: f32,
    /// Reward for dying (wall or self collision)
    pub reward_death: f32,
    /// Reward for an ordinary step (small negative, encourages short paths)
    pub reward_step: f32,
    /// Reward for filling the entire grid
    pub reward_win: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 12,
            initial_snake_length: 3,
            reward_fruit: 5.0,
            reward_death: -10.0,
            reward_step: -0.01,
            reward_win: 100.0,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(6)
    }

    /// Total number of grid cells (the win condition body length)
    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size
    }
}
