//! In-process blocks-stacking engine.
//!
//! Three blocks `a`, `b`, `c` rest either on one of the table slots `1`, `2`,
//! `3` or on another block. A world is described by the support of each
//! block in `a b c` order, so `"123"` has every block on its own slot and
//! `"1ab"` is a single tower `c` on `b` on `a` on slot 1.

use log::debug;

use super::{
    Bindings, RuleEngine, Term, ACTIONS_QUERY, ACTION_VAR, CURRENT_STATE_QUERY,
    RESET_COMMAND, STATES_QUERY, STATE_VAR,
};
use crate::core::{EnvError, Result};

static BLOCKS: [char; 3] = ['a', 'b', 'c'];
static SLOTS: [char; 3] = ['1', '2', '3'];

/// Default canonical initial world.
pub const DEFAULT_INITIAL: &str = "123";

fn supports() -> impl Iterator<Item = char> {
    SLOTS.iter().chain(BLOCKS.iter()).copied()
}

fn block_index(c: char) -> Option<usize> {
    BLOCKS.iter().position(|&b| b == c)
}

fn support_term(c: char) -> Term {
    match c.to_digit(10) {
        Some(d) => Term::Number(d as i64),
        None => Term::Atom(c.to_string()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct World([char; 3]);

impl World {
    fn parse(desc: &str) -> Option<Self> {
        let chars: Vec<char> = desc.chars().collect();
        let chars: [char; 3] = chars.try_into().ok()?;
        let w = World(chars);
        w.is_valid().then_some(w)
    }

    fn descriptor(&self) -> String { self.0.iter().collect() }

    fn is_valid(&self) -> bool {
        for (i, &s) in self.0.iter().enumerate() {
            if s == BLOCKS[i] || !supports().any(|x| x == s) { return false; }
            if self.0.iter().filter(|&&o| o == s).count() > 1 { return false; }
        }
        // every chain of blocks must bottom out on a slot
        (0..BLOCKS.len()).all(|i| {
            let mut cur = self.0[i];
            for _ in 0..BLOCKS.len() {
                match block_index(cur) {
                    Some(j) => cur = self.0[j],
                    None => return true,
                }
            }
            false
        })
    }

    fn is_clear(&self, support: char) -> bool { !self.0.contains(&support) }

    fn apply(&self, block: char, from: char, to: char) -> Option<World> {
        let i = block_index(block)?;
        if self.0[i] != from || to == block || to == from { return None; }
        if !supports().any(|s| s == to) { return None; }
        if !self.is_clear(block) || !self.is_clear(to) { return None; }
        let mut next = *self;
        next.0[i] = to;
        next.is_valid().then_some(next)
    }

    fn all() -> Vec<World> {
        let mut out = Vec::new();
        for a in supports() {
            for b in supports() {
                for c in supports() {
                    let w = World([a, b, c]);
                    if w.is_valid() { out.push(w); }
                }
            }
        }
        out
    }
}

fn parse_move(query: &str) -> Option<(char, char, char)> {
    let call = query.strip_prefix("step(")?.strip_suffix(')')?;
    let args = call.strip_prefix("move(")?.strip_suffix(')')?;
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 { return None; }
    let mut chars = parts.iter().map(|p| {
        let mut it = p.chars();
        match (it.next(), it.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    });
    Some((chars.next()??, chars.next()??, chars.next()??))
}

/// A rule engine session answering the blocks-world queries in-process.
#[derive(Clone, Debug)]
pub struct NativeBlocksEngine {
    initial: World,
    world: World,
    open: bool,
}

impl Default for NativeBlocksEngine {
    fn default() -> Self {
        let initial = World([SLOTS[0], SLOTS[1], SLOTS[2]]);
        Self { initial, world: initial, open: true }
    }
}

impl NativeBlocksEngine {
    pub fn new() -> Self { Self::default() }

    /// Open a session whose `reset` command restores `initial`.
    pub fn with_initial(initial: &str) -> Result<Self> {
        let w = World::parse(initial)
            .ok_or_else(|| EnvError::Config(format!("not a valid blocks world: {initial:?}")))?;
        Ok(Self { initial: w, world: w, open: true })
    }

    /// Descriptor of the engine's current world.
    pub fn current(&self) -> String { self.world.descriptor() }

    fn ensure_open(&self) -> Result<()> {
        if self.open { Ok(()) } else { Err(EnvError::EngineCommunication("engine session is shut down".into())) }
    }
}

impl RuleEngine for NativeBlocksEngine {
    fn solutions(&mut self, query: &str) -> Result<Vec<Bindings>> {
        self.ensure_open()?;
        match query {
            STATES_QUERY => Ok(World::all()
                .iter()
                .map(|w| Bindings::single(STATE_VAR, Term::atom(w.descriptor())))
                .collect()),
            ACTIONS_QUERY => {
                let mut out = Vec::new();
                for block in BLOCKS {
                    for from in supports().filter(|&s| s != block) {
                        for to in supports().filter(|&s| s != block && s != from) {
                            let args = vec![Term::atom(block.to_string()), support_term(from), support_term(to)];
                            out.push(Bindings::single(ACTION_VAR, Term::compound("move", args)));
                        }
                    }
                }
                Ok(out)
            }
            CURRENT_STATE_QUERY => Ok(vec![Bindings::single(STATE_VAR, Term::atom(self.world.descriptor()))]),
            other => Err(EnvError::EngineCommunication(format!("unsupported query: {other}"))),
        }
    }

    fn command(&mut self, query: &str) -> Result<bool> {
        self.ensure_open()?;
        if query == RESET_COMMAND {
            self.world = self.initial;
            return Ok(true);
        }
        if let Some(desc) = query.strip_prefix("reset(").and_then(|q| q.strip_suffix(')')) {
            return Ok(match World::parse(desc) {
                Some(w) => {
                    self.world = w;
                    true
                }
                None => false,
            });
        }
        let (block, from, to) = parse_move(query)
            .ok_or_else(|| EnvError::EngineCommunication(format!("unsupported command: {query}")))?;
        match self.world.apply(block, from, to) {
            Some(next) => {
                debug!("move({block},{from},{to}): {} -> {}", self.world.descriptor(), next.descriptor());
                self.world = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}
