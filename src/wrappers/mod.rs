// Wrappers for Env composition.
//
// - TimeLimit: step bound per episode, reported as truncation
// - RecordEpisodeStatistics: cumulative return and length in the final step's Info

use crate::core::{Env, Info, InfoValue, RenderFrame, Result, Step, TabularEnv};

/// A wrapper that enforces a maximum number of steps per episode, marking truncation when exceeded.
pub struct TimeLimit<E: Env> {
    inner: E,
    max_steps: u32,
    steps: u32,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(inner: E, max_steps: u32) -> Self {
        Self { inner, max_steps, steps: 0 }
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for TimeLimit<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.steps = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.steps += 1;
        if !s.terminated && !s.truncated && self.steps >= self.max_steps {
            s.truncated = true;
        }
        Ok(s)
    }

    fn render(&self) -> Option<RenderFrame> { self.inner.render() }
    fn close(&mut self) -> Result<()> { self.inner.close() }
}

impl<E: TabularEnv> TabularEnv for TimeLimit<E> {
    fn state_count(&self) -> usize { self.inner.state_count() }
    fn action_count(&self) -> usize { self.inner.action_count() }
    fn state_index(obs: &Self::Obs) -> usize { E::state_index(obs) }
}

/// Info key of the cumulative episode return (f64).
pub const EPISODE_RETURN: &str = "episode_return";
/// Info key of the episode length in steps (i64).
pub const EPISODE_LENGTH: &str = "episode_length";

/// RecordEpisodeStatistics tracks cumulative return and episode length.
/// On episode end (terminated or truncated), it injects [`EPISODE_RETURN`] and
/// [`EPISODE_LENGTH`] into the returned Step's Info.
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
    ep_return: f64,
    ep_length: i64,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner, ep_return: 0.0, ep_length: 0 } }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.ep_return = 0.0;
        self.ep_length = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.ep_return += s.reward as f64;
        self.ep_length += 1;
        if s.terminated || s.truncated {
            s.info.insert(EPISODE_RETURN, InfoValue::from(self.ep_return));
            s.info.insert(EPISODE_LENGTH, InfoValue::from(self.ep_length));
            self.ep_return = 0.0;
            self.ep_length = 0;
        }
        Ok(s)
    }

    fn render(&self) -> Option<RenderFrame> { self.inner.render() }
    fn close(&mut self) -> Result<()> { self.inner.close() }
}

impl<E: TabularEnv> TabularEnv for RecordEpisodeStatistics<E> {
    fn state_count(&self) -> usize { self.inner.state_count() }
    fn action_count(&self) -> usize { self.inner.action_count() }
    fn state_index(obs: &Self::Obs) -> usize { E::state_index(obs) }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts up by the action; terminates at 3.
    struct CounterEnv {
        state: i32,
    }

    impl Env for CounterEnv {
        type Obs = i32;
        type Act = i32;

        fn reset(&mut self, _seed: Option<u64>) -> Result<(Self::Obs, Info)> {
            self.state = 0;
            Ok((self.state, Info::new()))
        }

        fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
            self.state += action;
            Ok(Step::new(self.state, -1.0, self.state >= 3, false, Info::new()))
        }
    }

    #[test]
    fn time_limit_truncates() {
        let mut env = TimeLimit::new(CounterEnv { state: 0 }, 2);
        env.reset(None).unwrap();
        assert!(!env.step(0).unwrap().truncated);
        let s = env.step(0).unwrap();
        assert!(s.truncated);
        assert!(!s.terminated);
        env.reset(None).unwrap();
        assert!(!env.step(0).unwrap().truncated);
    }

    #[test]
    fn time_limit_leaves_terminal_steps_alone() {
        let mut env = TimeLimit::new(CounterEnv { state: 0 }, 1);
        env.reset(None).unwrap();
        let s = env.step(5).unwrap();
        assert!(s.terminated);
        assert!(!s.truncated);
    }

    #[test]
    fn episode_statistics_on_final_step() {
        let mut env = RecordEpisodeStatistics::new(CounterEnv { state: 0 });
        env.reset(None).unwrap();
        let first = env.step(1).unwrap();
        assert!(first.info.is_empty());
        let last = env.step(2).unwrap();
        assert_eq!(last.info.get_f64(EPISODE_RETURN), Some(-2.0));
        assert_eq!(last.info.get_i64(EPISODE_LENGTH), Some(2));
    }

    #[test]
    fn truncated_episode_statistics_count_up_to_the_limit() {
        let mut env = RecordEpisodeStatistics::new(TimeLimit::new(CounterEnv { state: 0 }, 4));
        env.reset(None).unwrap();
        for _ in 0..3 {
            assert!(env.step(0).unwrap().info.is_empty());
        }
        let last = env.step(0).unwrap();
        assert!(last.truncated);
        assert_eq!(last.info.get_f64(EPISODE_RETURN), Some(-4.0));
        assert_eq!(last.info.get_i64(EPISODE_LENGTH), Some(4));
        // counters restart with the next episode
        env.reset(None).unwrap();
        let s = env.step(3).unwrap();
        assert_eq!(s.info.get_i64(EPISODE_LENGTH), Some(1));
    }
}
