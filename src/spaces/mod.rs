/// Space implementations

pub mod space;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use space::Space;

/// A discrete space of integers in [0, n).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    n: u32,
}

impl Discrete {
    pub fn new(n: u32) -> Self {
        assert!(n > 0, "Discrete space requires n > 0");
        Self { n }
    }

    pub fn n(&self) -> u32 { self.n }
}

impl Space for Discrete {
    type Element = u32;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        if self.n == 1 { return 0; }
        let dist = Uniform::from(0..self.n);
        dist.sample(rng)
    }

    fn contains(&self, elem: &Self::Element) -> bool { *elem < self.n }
}

/// Observation of a goal-conditioned discrete environment: where the agent
/// is and where it has to get to, both as state indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    pub agent: u32,
    pub target: u32,
}

impl Observation {
    /// `|agent - target|`, reported as `distance` in reset info.
    pub fn distance(&self) -> u32 { self.agent.abs_diff(self.target) }
}

/// Dict-like space of two independent `Discrete` components keyed `agent` and `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationSpace {
    pub agent: Discrete,
    pub target: Discrete,
}

impl ObservationSpace {
    /// Both components range over the same `n` states.
    pub fn new(n: u32) -> Self {
        Self { agent: Discrete::new(n), target: Discrete::new(n) }
    }
}

impl Space for ObservationSpace {
    type Element = Observation;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        Observation { agent: self.agent.sample(rng), target: self.target.sample(rng) }
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        self.agent.contains(&elem.agent) && self.target.contains(&elem.target)
    }
}
