// Renderer contract for symbolic world states.

use log::info;

/// Receives the agent's symbolic state and the episode target after every
/// reset and step. Rendering is output only: it never feeds back into rewards
/// or termination.
pub trait Renderer {
    fn show(&mut self, agent: &str, target: &str);
}

/// Writes each shown agent/target pair to the log under the `blockworld::render` target.
#[derive(Clone, Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self { Self::default() }

    /// Number of states shown so far.
    pub fn frames(&self) -> u64 { self.frames }
}

impl Renderer for LogRenderer {
    fn show(&mut self, agent: &str, target: &str) {
        self.frames += 1;
        info!(target: "blockworld::render", "[{}] agent {} target {}", self.frames, agent, target);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn show(&mut self, _agent: &str, _target: &str) {}
}
