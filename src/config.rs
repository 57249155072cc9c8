//! Run configuration: environment options, Q-learning hyperparameters and
//! artifact paths. Loadable from TOML with the `serde` feature:
//!
//! ```toml
//! chart_path = "episode_returns_and_steps.png"
//! initial_world = "123"
//!
//! [env]
//! start_selection = "uniform_random"
//! render = false
//!
//! [agent]
//! episodes = 20
//! gamma = 0.1
//! epsilon = 0.06
//! decay = 0.2
//! ```

use std::path::PathBuf;

use crate::agents::QLearningConfig;
use crate::core::Result;
use crate::engine::native::DEFAULT_INITIAL;
use crate::envs::BlockWorldConfig;

pub const DEFAULT_CHART_PATH: &str = "episode_returns_and_steps.png";

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    pub env: BlockWorldConfig,
    pub agent: QLearningConfig,
    /// Where the training chart is written.
    pub chart_path: PathBuf,
    /// Canonical initial world of the in-process engine.
    pub initial_world: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            env: BlockWorldConfig::default(),
            agent: QLearningConfig::default(),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            initial_world: DEFAULT_INITIAL.to_string(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).map_err(|e| crate::core::EnvError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::core::EnvError::Io(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.agent.episodes, 20);
        assert_eq!(cfg.agent.gamma, 0.1);
        assert_eq!(cfg.agent.epsilon, 0.06);
        assert_eq!(cfg.agent.decay, 0.2);
        assert_eq!(cfg.chart_path, PathBuf::from(DEFAULT_CHART_PATH));
        assert!(cfg.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_partial_toml() {
        use crate::envs::StartSelection;

        let cfg = RunConfig::from_toml_str(
            r#"
            chart_path = "out.png"

            [env]
            start_selection = "uniform_random"

            [agent]
            episodes = 5
            max_steps_per_episode = 200
            "#,
        )
        .unwrap();
        assert_eq!(cfg.env.start_selection, StartSelection::UniformRandom);
        assert_eq!(cfg.agent.episodes, 5);
        assert_eq!(cfg.agent.max_steps_per_episode, Some(200));
        assert_eq!(cfg.agent.gamma, 0.1);
        assert_eq!(cfg.chart_path, PathBuf::from("out.png"));
        assert_eq!(cfg.env.fixed_start, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_fixed_start_index() {
        let cfg = RunConfig::from_toml_str("[env]\nstart_selection = \"fixed\"\nfixed_start = 7\n").unwrap();
        assert_eq!(cfg.env.fixed_start, Some(7));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_invalid_hyperparameters() {
        let err = RunConfig::from_toml_str("[agent]\ngamma = 2.0\n").unwrap_err();
        assert!(matches!(err, crate::core::EnvError::Config(_)));
    }
}
