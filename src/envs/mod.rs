pub mod block_world;
pub mod renderer;

pub use block_world::{BlockWorldConfig, BlockWorldEnv, StartSelection, GOAL_REWARD, ILLEGAL_MOVE_REWARD, MOVE_REWARD};
pub use renderer::{LogRenderer, NullRenderer, Renderer};
