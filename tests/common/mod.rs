// Scripted rule engine shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use blockworld_gym::engine::{
    ACTIONS_QUERY, ACTION_VAR, CURRENT_STATE_QUERY, RESET_COMMAND, STATES_QUERY, STATE_VAR,
};
use blockworld_gym::{Bindings, EnvError, Result, RuleEngine, Term};

/// What the engine saw, readable after the engine is moved into an env.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub queries: Vec<String>,
    pub shutdowns: usize,
    /// Any later query containing this breaks the session.
    pub fail_on: Option<String>,
}

/// Engine over an explicit transition table. Commands without an entry for
/// the current state are rejected (`Ok(false)`), as is `reset(<s>)` for an
/// unknown `s`.
pub struct ScriptedEngine {
    states: Vec<String>,
    actions: Vec<Term>,
    initial: String,
    current: String,
    transitions: HashMap<(String, String), String>,
    pub log: Rc<RefCell<EngineLog>>,
}

impl ScriptedEngine {
    pub fn new(states: &[&str], actions: Vec<Term>) -> Self {
        let initial = states.first().map(|s| s.to_string()).unwrap_or_default();
        Self {
            states: states.iter().map(|s| s.to_string()).collect(),
            actions,
            current: initial.clone(),
            initial,
            transitions: HashMap::new(),
            log: Rc::new(RefCell::new(EngineLog::default())),
        }
    }

    /// `call` moves `from` to `to`.
    pub fn transition(mut self, from: &str, call: &str, to: &str) -> Self {
        self.transitions.insert((from.to_string(), format!("step({call})")), to.to_string());
        self
    }

    /// Any query containing `pattern` breaks the session.
    pub fn failing_on(self, pattern: &str) -> Self {
        self.log.borrow_mut().fail_on = Some(pattern.to_string());
        self
    }

    pub fn log(&self) -> Rc<RefCell<EngineLog>> { Rc::clone(&self.log) }

    fn record(&self, query: &str) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.queries.push(query.to_string());
        match &log.fail_on {
            Some(p) if query.contains(p.as_str()) => {
                Err(EnvError::EngineCommunication(format!("connection lost during {query}")))
            }
            _ => Ok(()),
        }
    }
}

impl RuleEngine for ScriptedEngine {
    fn solutions(&mut self, query: &str) -> Result<Vec<Bindings>> {
        self.record(query)?;
        match query {
            STATES_QUERY => Ok(self.states.iter().map(|s| Bindings::single(STATE_VAR, Term::atom(s.clone()))).collect()),
            ACTIONS_QUERY => Ok(self.actions.iter().map(|a| Bindings::single(ACTION_VAR, a.clone())).collect()),
            CURRENT_STATE_QUERY => Ok(vec![Bindings::single(STATE_VAR, Term::atom(self.current.clone()))]),
            other => Err(EnvError::EngineCommunication(format!("unexpected query {other}"))),
        }
    }

    fn command(&mut self, query: &str) -> Result<bool> {
        self.record(query)?;
        if query == RESET_COMMAND {
            self.current = self.initial.clone();
            return Ok(true);
        }
        if let Some(s) = query.strip_prefix("reset(").and_then(|q| q.strip_suffix(')')) {
            if !self.states.iter().any(|known| known == s) {
                return Ok(false);
            }
            self.current = s.to_string();
            return Ok(true);
        }
        match self.transitions.get(&(self.current.clone(), query.to_string())) {
            Some(next) => {
                self.current = next.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        self.log.borrow_mut().shutdowns += 1;
        Ok(())
    }
}

/// Two states, one action `go()` taking `s0` to `s1`.
pub fn one_way_engine() -> ScriptedEngine {
    ScriptedEngine::new(&["s0", "s1"], vec![Term::compound("go", vec![])]).transition("s0", "go()", "s1")
}

/// Two states, one action `flip()` toggling between them.
pub fn toggle_engine() -> ScriptedEngine {
    ScriptedEngine::new(&["s0", "s1"], vec![Term::compound("flip", vec![])])
        .transition("s0", "flip()", "s1")
        .transition("s1", "flip()", "s0")
}
