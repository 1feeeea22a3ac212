use burn::tensor::{backend::Backend, Tensor, TensorData};

use crate::game::{EpisodeState, NUM_ACTIONS};

/// Length of the flat observation vector for a given grid size
///
/// Layout: grid_size^2 cell values, a 4-wide direction one-hot, and a
/// 2-wide relative fruit position.
pub fn observation_dim(grid_size: usize) -> usize {
    grid_size * grid_size + NUM_ACTIONS + 2
}

/// Encode one episode into its flat observation vector
///
/// - Grid cells (x-major): 0.0 empty, 1.0 snake body, 2.0 fruit. The fruit
///   is written last, so on a won episode the cell under the head reads 2.0.
///   Out-of-bounds body cells (the head after a wall death) are skipped.
/// - Direction one-hot in {Up, Down, Left, Right} order.
/// - Relative fruit position `(fruit - head) / (grid_size - 1)`, each
///   component in [-1, 1].
pub fn encode_state(state: &EpisodeState) -> Vec<f32> {
    let grid = state.grid_size;
    let mut data = vec![0.0f32; observation_dim(grid)];

    for &pos in &state.snake.body {
        if state.is_in_bounds(pos) {
            data[(pos.x as usize) * grid + pos.y as usize] = 1.0;
        }
    }
    if state.is_in_bounds(state.fruit) {
        data[(state.fruit.x as usize) * grid + state.fruit.y as usize] = 2.0;
    }

    let base = grid * grid;
    data[base + state.snake.direction.index()] = 1.0;

    let head = state.snake.head();
    let denom = (grid - 1) as f32;
    data[base + NUM_ACTIONS] = (state.fruit.x - head.x) as f32 / denom;
    data[base + NUM_ACTIONS + 1] = (state.fruit.y - head.y) as f32 / denom;

    data
}

/// Encode one episode into a rank-1 tensor of shape [D]
pub fn observation_tensor<B: Backend>(state: &EpisodeState, device: &B::Device) -> Tensor<B, 1> {
    let data = encode_state(state);
    let dim = data.len();
    Tensor::from_data(TensorData::new(data, [dim]), device)
}

/// Stack per-instance observation rows into a [N, D] batch tensor
pub fn stack_observations<B: Backend>(rows: &[Tensor<B, 1>]) -> Tensor<B, 2> {
    Tensor::stack(rows.to_vec(), 0)
}
