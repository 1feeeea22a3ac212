//! Experience replay with proportional prioritization

mod replay;
mod sum_tree;
mod transition;

pub use replay::{PrioritizedReplay, SampleBatch};
pub use sum_tree::{MaxTree, SumTree};
pub use transition::Transition;
