use log::{debug, info, warn};

use crate::catalog::{ActionCatalog, StateCatalog};
use crate::core::{Env, EnvError, Info, InfoValue, RenderFrame, Result, Step, TabularEnv};
use crate::engine::{reset_to_command, step_command, RuleEngine, CURRENT_STATE_QUERY, RESET_COMMAND, STATE_VAR};
use crate::envs::renderer::{LogRenderer, Renderer};
use crate::spaces::{Discrete, Observation, ObservationSpace, Space};
use crate::utils::rng::{rng_from_seed, RngStream};

/// Unit cost of a legal move.
pub const MOVE_REWARD: f32 = -1.0;
/// Reward for a move that reaches the target.
pub const GOAL_REWARD: f32 = 100.0;
/// Penalty for a move the engine rejects.
pub const ILLEGAL_MOVE_REWARD: f32 = -10.0;

/// How `reset` picks the start configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StartSelection {
    /// The catalog entry `BlockWorldConfig::fixed_start` if set, otherwise the
    /// engine's canonical initial world.
    #[default]
    Fixed,
    /// Uniform over the whole state catalog, drawn from the env RNG.
    UniformRandom,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockWorldConfig {
    pub start_selection: StartSelection,
    /// State index used by `StartSelection::Fixed`.
    pub fixed_start: Option<usize>,
    /// Forward agent and target to a renderer after every reset/step.
    pub render: bool,
    /// Seed of the env RNG; `reset(Some(seed))` replaces it.
    pub seed: u64,
}

impl Default for BlockWorldConfig {
    fn default() -> Self {
        Self { start_selection: StartSelection::Fixed, fixed_start: None, render: false, seed: 1_234_567 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Ready,
    InEpisode,
    Closed,
}

#[derive(Clone, Debug, PartialEq)]
struct Position {
    agent: String,
    agent_index: usize,
    target: String,
    target_index: usize,
}

impl Position {
    fn observation(&self) -> Observation {
        Observation { agent: self.agent_index as u32, target: self.target_index as u32 }
    }
}

/// BlockWorld environment backed by a rule engine session.
///
/// Observation: `{agent, target}` state indices in `[0, state_count)`.
/// Action space: `Discrete(action_count)`, one index per enumerated action schema.
/// Reward: -1 per legal move, +100 when the move reaches the target (terminal),
/// -10 when the engine rejects the move. Never truncates on its own; wrap in
/// [`crate::wrappers::TimeLimit`] for a step bound.
///
/// `reset` sends the canonical `reset` command and, when [`StartSelection`]
/// names a catalog entry, a `reset(<state>)` command placing the engine world
/// in that configuration. The target is the agent's freshly observed state,
/// so an episode asks the agent to bring the world back to where it started
/// after its first move perturbs it. The start index is reported in the reset
/// info as `start_index`.
///
/// Calling `step` before the first `reset`, or after a terminal step, fails
/// with `EnvError::NotReady`. Every operation after `close` fails with
/// `EnvError::Closed`.
pub struct BlockWorldEnv<E: RuleEngine> {
    engine: Option<E>,
    states: StateCatalog,
    actions: ActionCatalog,
    config: BlockWorldConfig,
    renderer: Option<Box<dyn Renderer>>,
    rng: RngStream,
    phase: Phase,
    position: Option<Position>,
    start_index: usize,
}

impl<E: RuleEngine> BlockWorldEnv<E> {
    /// Open an engine session with `connect` and build both catalogs against it.
    /// Rendering, if enabled, goes to a [`LogRenderer`].
    pub fn open<F>(config: BlockWorldConfig, connect: F) -> Result<Self>
    where
        F: FnOnce() -> Result<E>,
    {
        Self::open_with_renderer(config, connect, None)
    }

    /// Like [`Self::open`] with an explicit renderer. The renderer is only
    /// used when `config.render` is set.
    pub fn open_with_renderer<F>(
        config: BlockWorldConfig,
        connect: F,
        renderer: Option<Box<dyn Renderer>>,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<E>,
    {
        let mut engine = connect().map_err(|e| match e {
            EnvError::EngineCommunication(_) => e,
            other => EnvError::EngineCommunication(format!("could not open engine session: {other}")),
        })?;

        let catalogs = StateCatalog::build(&mut engine)
            .and_then(|s| ActionCatalog::build(&mut engine).map(|a| (s, a)))
            .and_then(|(s, a)| {
                match config.fixed_start {
                    Some(i) if i >= s.len() => {
                        Err(EnvError::Config(format!("fixed_start {i} outside state range 0..{}", s.len())))
                    }
                    _ => Ok((s, a)),
                }
            });
        let (states, actions) = match catalogs {
            Ok(c) => c,
            Err(e) => {
                if let Err(shutdown_err) = engine.shutdown() {
                    warn!("engine shutdown after failed construction also failed: {shutdown_err}");
                }
                return Err(e);
            }
        };

        let renderer = if config.render {
            Some(renderer.unwrap_or_else(|| Box::new(LogRenderer::new()) as Box<dyn Renderer>))
        } else {
            None
        };
        info!(
            "blockworld ready: {} states, {} actions, start selection {:?}",
            states.len(),
            actions.len(),
            config.start_selection
        );
        Ok(Self {
            engine: Some(engine),
            states,
            actions,
            rng: rng_from_seed(config.seed),
            config,
            renderer,
            phase: Phase::Ready,
            position: None,
            start_index: 0,
        })
    }

    /// Wrap an already open session.
    pub fn from_engine(config: BlockWorldConfig, engine: E) -> Result<Self> {
        Self::open(config, || Ok(engine))
    }

    pub fn config(&self) -> &BlockWorldConfig { &self.config }
    pub fn state_catalog(&self) -> &StateCatalog { &self.states }
    pub fn action_catalog(&self) -> &ActionCatalog { &self.actions }
    pub fn state_count(&self) -> usize { self.states.len() }
    pub fn action_count(&self) -> usize { self.actions.len() }

    pub fn action_space(&self) -> Discrete { Discrete::new(self.actions.len() as u32) }

    pub fn observation_space(&self) -> ObservationSpace { ObservationSpace::new(self.states.len() as u32) }

    /// Symbolic state of the agent in the current episode.
    pub fn agent_state(&self) -> Option<&str> { self.position.as_ref().map(|p| p.agent.as_str()) }

    /// Symbolic target of the current episode.
    pub fn target_state(&self) -> Option<&str> { self.position.as_ref().map(|p| p.target.as_str()) }

    /// Start index picked by the most recent reset.
    pub fn start_index(&self) -> usize { self.start_index }

    pub fn is_closed(&self) -> bool { self.phase == Phase::Closed }

    fn engine_mut(&mut self) -> Result<&mut E> {
        self.engine.as_mut().ok_or(EnvError::Closed)
    }

    /// Catalog index to place the world in, `None` for the canonical start.
    fn select_start(&mut self) -> Option<usize> {
        match self.config.start_selection {
            StartSelection::Fixed => self.config.fixed_start,
            StartSelection::UniformRandom => {
                Some(Discrete::new(self.states.len() as u32).sample(&mut self.rng) as usize)
            }
        }
    }

    fn place_world(&mut self, start: Option<usize>) -> Result<()> {
        if !self.engine_mut()?.command(RESET_COMMAND)? {
            return Err(EnvError::EngineCommunication("engine rejected the reset command".into()));
        }
        if let Some(i) = start {
            let state = self.states.state_of(i)?.to_string();
            if !self.engine_mut()?.command(&reset_to_command(&state))? {
                return Err(EnvError::EngineCommunication(format!("engine rejected reset to {state}")));
            }
        }
        Ok(())
    }

    fn query_current(&mut self) -> Result<(String, usize)> {
        let solutions = self.engine_mut()?.solutions(CURRENT_STATE_QUERY)?;
        let state = solutions
            .first()
            .and_then(|b| b.get(STATE_VAR))
            .map(|t| t.to_string())
            .ok_or_else(|| EnvError::EngineCommunication("current state query returned no solution".into()))?;
        let index = self.states.index_of(&state)?;
        Ok((state, index))
    }

    fn show_position(&mut self) {
        if let (Some(renderer), Some(pos)) = (self.renderer.as_mut(), self.position.as_ref()) {
            renderer.show(&pos.agent, &pos.target);
        }
    }
}

impl<E: RuleEngine> Env for BlockWorldEnv<E> {
    type Obs = Observation;
    type Act = u32;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        if self.phase == Phase::Closed {
            return Err(EnvError::Closed);
        }
        if let Some(s) = seed { self.rng = rng_from_seed(s); }
        self.phase = Phase::Ready;
        self.position = None;

        let start = self.select_start();
        self.place_world(start)?;
        let (agent, agent_index) = self.query_current()?;
        if start.is_some_and(|i| i != agent_index) {
            return Err(EnvError::EngineCommunication(format!("engine reports {agent} after a seeded reset")));
        }
        self.start_index = agent_index;
        let position = Position { target: agent.clone(), target_index: agent_index, agent, agent_index };
        let observation = position.observation();
        debug!("reset: start_index={} agent={} target={}", self.start_index, position.agent, position.target);
        self.position = Some(position);
        self.phase = Phase::InEpisode;

        let mut info = Info::new();
        info.insert("distance", InfoValue::from(observation.distance() as i64));
        info.insert("start_index", InfoValue::from(self.start_index));
        self.show_position();
        Ok((observation, info))
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        match self.phase {
            Phase::Closed => return Err(EnvError::Closed),
            Phase::Ready => return Err(EnvError::NotReady("call reset() before step()".into())),
            Phase::InEpisode => {}
        }
        let index = action as usize;
        if index >= self.actions.len() {
            return Err(EnvError::InvalidAction(format!(
                "action {action} outside action space 0..{}",
                self.actions.len()
            )));
        }
        let command = step_command(self.actions.call_string_of(index)?);
        let accepted = self.engine_mut()?.command(&command)?;

        let mut reward = ILLEGAL_MOVE_REWARD;
        let mut terminated = false;
        if accepted {
            let (agent, agent_index) = self.query_current()?;
            let pos = self.position.as_mut().ok_or_else(|| EnvError::NotReady("no active episode".into()))?;
            pos.agent = agent;
            pos.agent_index = agent_index;
            reward = MOVE_REWARD;
            if pos.agent == pos.target {
                reward = GOAL_REWARD;
                terminated = true;
            }
        }
        let pos = self.position.as_ref().ok_or_else(|| EnvError::NotReady("no active episode".into()))?;
        let observation = pos.observation();
        debug!("{command}: accepted={accepted} agent={} reward={reward}", pos.agent);
        if terminated {
            self.phase = Phase::Ready;
        }
        self.show_position();
        Ok(Step::new(observation, reward, terminated, false, Info::new()))
    }

    fn render(&self) -> Option<RenderFrame> {
        self.position
            .as_ref()
            .map(|p| RenderFrame::Text(format!("agent={} target={}", p.agent, p.target)))
    }

    fn close(&mut self) -> Result<()> {
        self.phase = Phase::Closed;
        match self.engine.take() {
            Some(mut engine) => {
                info!("closing engine session");
                engine.shutdown()
            }
            None => Ok(()),
        }
    }
}

impl<E: RuleEngine> TabularEnv for BlockWorldEnv<E> {
    fn state_count(&self) -> usize { self.states.len() }
    fn action_count(&self) -> usize { self.actions.len() }
    fn state_index(obs: &Observation) -> usize { obs.agent as usize }
}

impl<E: RuleEngine> Drop for BlockWorldEnv<E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("engine shutdown on drop failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NativeBlocksEngine;

    fn native_env(config: BlockWorldConfig) -> BlockWorldEnv<NativeBlocksEngine> {
        BlockWorldEnv::open(config, || Ok(NativeBlocksEngine::new())).unwrap()
    }

    fn action_index(env: &BlockWorldEnv<NativeBlocksEngine>, call: &str) -> u32 {
        (0..env.action_count()).find(|&i| env.action_catalog().call_string_of(i).unwrap() == call).unwrap() as u32
    }

    #[test]
    fn reset_starts_on_target() {
        let mut env = native_env(BlockWorldConfig::default());
        let (obs, info) = env.reset(None).unwrap();
        assert_eq!(obs.agent, obs.target);
        assert_eq!(info.get_i64("distance"), Some(0));
        assert_eq!(env.agent_state(), Some("123"));
        assert!(env.observation_space().contains(&obs));
    }

    #[test]
    fn move_away_and_back_terminates() {
        let mut env = native_env(BlockWorldConfig::default());
        let (start, _) = env.reset(None).unwrap();

        let away = env.step(action_index(&env, "move(a,1,b)")).unwrap();
        assert_eq!(away.reward, MOVE_REWARD);
        assert!(!away.terminated);
        assert_ne!(away.observation.agent, start.agent);
        assert_eq!(away.observation.target, start.target);

        let back = env.step(action_index(&env, "move(a,b,1)")).unwrap();
        assert_eq!(back.reward, GOAL_REWARD);
        assert!(back.terminated);
        assert!(!back.truncated);
        assert_eq!(back.observation.agent, start.agent);

        assert!(matches!(env.step(0), Err(EnvError::NotReady(_))));
    }

    #[test]
    fn rejected_move_keeps_agent() {
        let mut env = native_env(BlockWorldConfig::default());
        let (start, _) = env.reset(None).unwrap();
        // b does not sit on slot 1
        let s = env.step(action_index(&env, "move(b,1,3)")).unwrap();
        assert_eq!(s.reward, ILLEGAL_MOVE_REWARD);
        assert!(!s.terminated);
        assert_eq!(s.observation, start);
    }

    #[test]
    fn render_reports_both_states() {
        let mut env = native_env(BlockWorldConfig::default());
        assert!(env.render().is_none());
        env.reset(None).unwrap();
        assert_eq!(env.render(), Some(RenderFrame::Text("agent=123 target=123".into())));
    }

    #[test]
    fn fixed_start_out_of_range_is_rejected() {
        let config = BlockWorldConfig { fixed_start: Some(10_000), ..Default::default() };
        let err = BlockWorldEnv::open(config, || Ok(NativeBlocksEngine::new())).err().unwrap();
        assert!(matches!(err, EnvError::Config(_)));
    }

    #[test]
    fn fixed_start_places_the_world_in_that_state() {
        let catalog_env = native_env(BlockWorldConfig::default());
        let tower = catalog_env.state_catalog().index_of("1ab").unwrap();
        let mut env = native_env(BlockWorldConfig { fixed_start: Some(tower), ..Default::default() });
        let (obs, info) = env.reset(None).unwrap();
        assert_eq!(obs.agent as usize, tower);
        assert_eq!(obs.target as usize, tower);
        assert_eq!(info.get_i64("start_index"), Some(tower as i64));
        assert_eq!(env.agent_state(), Some("1ab"));

        // only the top of the tower can move
        let s = env.step(action_index(&env, "move(a,1,2)")).unwrap();
        assert_eq!(s.reward, ILLEGAL_MOVE_REWARD);
        let s = env.step(action_index(&env, "move(c,b,2)")).unwrap();
        assert_eq!(s.reward, MOVE_REWARD);
        assert_eq!(env.target_state(), Some("1ab"));
    }

    #[test]
    fn canonical_start_reports_observed_index() {
        let mut env = native_env(BlockWorldConfig::default());
        let (obs, info) = env.reset(None).unwrap();
        let canonical = env.state_catalog().index_of("123").unwrap();
        assert_eq!(obs.agent as usize, canonical);
        assert_eq!(info.get_i64("start_index"), Some(canonical as i64));
    }
}
