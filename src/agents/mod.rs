pub mod q_learning;

pub use q_learning::{decay_epsilon, epsilon_greedy, EpisodeStats, QLearningConfig, QLearningTrainer, QTable, TrainingReport};
