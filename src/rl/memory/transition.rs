//! Stored experience unit

use burn::prelude::*;

/// One environment step as seen by the learner
///
/// `state` and `next_state` are flat observation vectors; `next_state` is
/// the terminal observation when `done` is set, not the auto-reset one.
#[derive(Debug, Clone)]
pub struct Transition<B: Backend> {
    pub state: Tensor<B, 1>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Tensor<B, 1>,
    pub done: bool,
}
