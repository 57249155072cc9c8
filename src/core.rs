// Core traits and types for the BlockWorld environment

/// A small ordered info map returned next to observations.
/// It stores small numbers of key-value pairs, which is all `reset`/`step` need.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Shortcut for integer-valued entries such as `distance`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(InfoValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(InfoValue::F64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Value types used in info maps.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<usize> for InfoValue { fn from(v: usize) -> Self { InfoValue::I64(v as i64) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }

/// A frame returned by `Env::render`.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderFrame {
    /// Textual representation of a frame (the symbolic world state).
    Text(String),
    /// Raw pixel buffer in row-major RGBA format.
    Pixels {
        width: u32,
        height: u32,
        /// Pixel data. Convention: RGB uses 3 bytes per pixel, RGBA uses 4.
        data: Vec<u8>,
    },
}

/// A step result from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f32, terminated: bool, truncated: bool, info: Info) -> Self {
        Self { observation, reward, terminated, truncated, info }
    }
}

/// Errors across environment, catalog and engine APIs.
///
/// A move the engine rejects is not an error: it is reported through the
/// reward channel by [`crate::envs::BlockWorldEnv::step`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("Catalog enumeration failed: {0}")]
    CatalogEnumeration(String),
    #[error("Unknown state: {0}")]
    UnknownState(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Environment is closed")]
    Closed,
    #[error("Environment not ready: {0}")]
    NotReady(String),
    #[error("Engine communication failed: {0}")]
    EngineCommunication(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Convenience alias for results using EnvError.
pub type Result<T> = std::result::Result<T, EnvError>;

/// Core environment trait following the Gymnasium contract.
///
/// Unlike pure simulators, environments here talk to an external engine, so
/// every operation that touches it can fail.
pub trait Env {
    type Obs;
    type Act;

    /// Reset the environment to an initial state.
    /// Implementations should re-seed internal RNGs when `seed` is provided.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)>;

    /// Apply an action and advance the environment by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>>;

    /// Render a frame of the current state, if supported.
    fn render(&self) -> Option<RenderFrame> { None }

    /// Close and release any external resources. Must be idempotent.
    fn close(&mut self) -> Result<()> { Ok(()) }
}

/// An environment over dense state and action indices, as consumed by tabular agents.
pub trait TabularEnv: Env<Act = u32> {
    fn state_count(&self) -> usize;
    fn action_count(&self) -> usize;

    /// Index of the agent's state inside an observation.
    fn state_index(obs: &Self::Obs) -> usize;
}

impl<E: Env + ?Sized> Env for &mut E {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> { (**self).reset(seed) }
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> { (**self).step(action) }
    fn render(&self) -> Option<RenderFrame> { (**self).render() }
    fn close(&mut self) -> Result<()> { (**self).close() }
}

impl<E: TabularEnv + ?Sized> TabularEnv for &mut E {
    fn state_count(&self) -> usize { (**self).state_count() }
    fn action_count(&self) -> usize { (**self).action_count() }
    fn state_index(obs: &Self::Obs) -> usize { E::state_index(obs) }
}
