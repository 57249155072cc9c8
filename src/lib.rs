pub mod agents;
pub mod catalog;
pub mod config;
pub mod core;
pub mod engine;
pub mod envs;
pub mod spaces;
pub mod utils;
pub mod wrappers;

pub use crate::agents::{EpisodeStats, QLearningConfig, QLearningTrainer, QTable, TrainingReport};
pub use crate::catalog::{ActionCatalog, ActionTerm, StateCatalog};
pub use crate::config::RunConfig;
pub use crate::core::{Env, EnvError, Info, InfoValue, RenderFrame, Result, Step, TabularEnv};
pub use crate::engine::{Bindings, NativeBlocksEngine, RuleEngine, Term};
pub use crate::envs::{BlockWorldConfig, BlockWorldEnv, LogRenderer, NullRenderer, Renderer, StartSelection};
pub use crate::spaces::{Discrete, Observation, ObservationSpace, Space};
pub use crate::utils::{encode_png, save_png, training_chart};
pub use crate::wrappers::{RecordEpisodeStatistics, TimeLimit};
