//! Tabular Q-learning over a [`TabularEnv`].
//!
//! The backup is a one-step lookahead *replacement*:
//! `Q[s,a] <- r + gamma * max_a' Q[s',a']`. There is no learning rate; the old
//! estimate is overwritten, not blended.

use log::{debug, info};
use rand::Rng;

use crate::core::{Env, EnvError, Result, TabularEnv};
use crate::spaces::{Discrete, Space};
use crate::utils::rng::SeedSequence;
use crate::wrappers::{RecordEpisodeStatistics, TimeLimit, EPISODE_LENGTH, EPISODE_RETURN};

/// Dense (state, action) value table, row-major by state.
#[derive(Clone, Debug, PartialEq)]
pub struct QTable {
    states: usize,
    actions: usize,
    values: Vec<f64>,
}

impl QTable {
    pub fn zeros(states: usize, actions: usize) -> Self {
        assert!(states > 0 && actions > 0, "QTable requires at least one state and one action");
        Self { states, actions, values: vec![0.0; states * actions] }
    }

    /// Every entry drawn uniformly from [0, 1).
    pub fn random<R: Rng + ?Sized>(states: usize, actions: usize, rng: &mut R) -> Self {
        let mut q = Self::zeros(states, actions);
        for v in q.values.iter_mut() {
            *v = rng.r#gen::<f64>();
        }
        q
    }

    pub fn states(&self) -> usize { self.states }
    pub fn actions(&self) -> usize { self.actions }

    #[inline]
    pub fn get(&self, state: usize, action: usize) -> f64 { self.row(state)[action] }

    #[inline]
    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        assert!(action < self.actions, "action {action} out of range 0..{}", self.actions);
        self.values[state * self.actions + action] = value;
    }

    pub fn row(&self, state: usize) -> &[f64] {
        assert!(state < self.states, "state {state} out of range 0..{}", self.states);
        &self.values[state * self.actions..(state + 1) * self.actions]
    }

    /// Largest value in the state's row.
    pub fn max(&self, state: usize) -> f64 {
        self.row(state).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the largest value in the state's row; ties go to the first.
    pub fn argmax(&self, state: usize) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (i, &v) in row.iter().enumerate().skip(1) {
            if v > row[best] { best = i; }
        }
        best
    }

    /// Bellman backup for one transition. Returns the new value of `Q[state, action]`.
    pub fn update(&mut self, state: usize, action: usize, reward: f64, next_state: usize, gamma: f64) -> f64 {
        let value = reward + gamma * self.max(next_state);
        self.set(state, action, value);
        value
    }
}

/// Uniform random action with probability `epsilon`, otherwise the greedy one.
pub fn epsilon_greedy<R: Rng + ?Sized>(q: &QTable, state: usize, epsilon: f64, rng: &mut R) -> usize {
    if rng.r#gen::<f64>() < epsilon {
        Discrete::new(q.actions() as u32).sample(rng) as usize
    } else {
        q.argmax(state)
    }
}

/// Multiplicative decay `epsilon - decay * epsilon`; approaches zero without reaching it.
pub fn decay_epsilon(epsilon: f64, decay: f64) -> f64 {
    epsilon - decay * epsilon
}

/// Hyperparameters of a training run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QLearningConfig {
    pub episodes: usize,
    /// Discount factor gamma.
    pub gamma: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Fraction of epsilon removed after every episode.
    pub decay: f64,
    /// Truncate episodes after this many steps; `None` runs until termination.
    pub max_steps_per_episode: Option<u32>,
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self { episodes: 20, gamma: 0.1, epsilon: 0.06, decay: 0.2, max_steps_per_episode: None, seed: 42 }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(EnvError::Config("episodes must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(EnvError::Config(format!("gamma {} outside [0, 1]", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(EnvError::Config(format!("epsilon {} outside [0, 1]", self.epsilon)));
        }
        if !(0.0..1.0).contains(&self.decay) {
            return Err(EnvError::Config(format!("decay {} outside [0, 1)", self.decay)));
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(EnvError::Config("max_steps_per_episode must be > 0".into()));
        }
        Ok(())
    }
}

/// Outcome of one episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeStats {
    /// Zero-based episode number.
    pub episode: usize,
    pub total_reward: f64,
    pub steps: usize,
    /// Whether the episode ended by termination rather than truncation.
    pub terminated: bool,
    /// Exploration rate used during the episode.
    pub epsilon: f64,
}

#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeStats>,
    pub final_epsilon: f64,
    pub q_table: QTable,
}

impl TrainingReport {
    pub fn returns(&self) -> Vec<f64> { self.episodes.iter().map(|e| e.total_reward).collect() }

    pub fn steps(&self) -> Vec<usize> { self.episodes.iter().map(|e| e.steps).collect() }

    /// Greedy action of the learned table.
    pub fn policy(&self, state: usize) -> usize { self.q_table.argmax(state) }
}

/// Runs epsilon-greedy Q-learning episodes against an environment.
pub struct QLearningTrainer {
    config: QLearningConfig,
}

impl QLearningTrainer {
    pub fn new(config: QLearningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QLearningConfig { &self.config }

    pub fn run<E: TabularEnv>(&self, env: &mut E) -> Result<TrainingReport> {
        self.run_with(env, |_| {})
    }

    /// Like [`Self::run`], calling `on_episode` after each finished episode.
    /// Any error from the environment aborts the whole run.
    pub fn run_with<E, F>(&self, env: &mut E, on_episode: F) -> Result<TrainingReport>
    where
        E: TabularEnv,
        F: FnMut(&EpisodeStats),
    {
        match self.config.max_steps_per_episode {
            Some(max) => self.train(&mut RecordEpisodeStatistics::new(TimeLimit::new(env, max)), on_episode),
            None => self.train(&mut RecordEpisodeStatistics::new(env), on_episode),
        }
    }

    fn train<E, F>(&self, env: &mut RecordEpisodeStatistics<E>, mut on_episode: F) -> Result<TrainingReport>
    where
        E: TabularEnv,
        F: FnMut(&EpisodeStats),
    {
        let cfg = &self.config;
        let mut seeds = SeedSequence::new(cfg.seed);
        let mut init_rng = seeds.next_rng();
        let mut policy_rng = seeds.next_rng();

        let mut q = QTable::random(env.state_count(), env.action_count(), &mut init_rng);
        let mut epsilon = cfg.epsilon;
        let mut episodes = Vec::with_capacity(cfg.episodes);
        info!(
            "training {} episodes on {}x{} table (gamma={}, epsilon={}, decay={})",
            cfg.episodes,
            q.states(),
            q.actions(),
            cfg.gamma,
            cfg.epsilon,
            cfg.decay
        );

        for episode in 0..cfg.episodes {
            let (obs, _info) = env.reset(None)?;
            let mut state = E::state_index(&obs);
            let mut stats = EpisodeStats { episode, total_reward: 0.0, steps: 0, terminated: false, epsilon };
            loop {
                let action = epsilon_greedy(&q, state, epsilon, &mut policy_rng);
                let step = env.step(action as u32)?;
                let next_state = E::state_index(&step.observation);
                let reward = step.reward as f64;
                let value = q.update(state, action, reward, next_state, cfg.gamma);
                debug!("s={state} a={action} r={reward} s'={next_state} q={value:.4}");

                state = next_state;
                if step.terminated || step.truncated {
                    stats.total_reward = step.info.get_f64(EPISODE_RETURN).unwrap_or_default();
                    stats.steps = step.info.get_i64(EPISODE_LENGTH).unwrap_or_default() as usize;
                    stats.terminated = step.terminated;
                    break;
                }
            }
            epsilon = decay_epsilon(epsilon, cfg.decay);
            info!(
                "episode {}/{}: return={} steps={} terminated={}",
                episode + 1,
                cfg.episodes,
                stats.total_reward,
                stats.steps,
                stats.terminated
            );
            on_episode(&stats);
            episodes.push(stats);
        }

        Ok(TrainingReport { episodes, final_epsilon: epsilon, q_table: q })
    }
}
