//! Rule-engine query contract.
//!
//! The environment never looks inside the engine: it sends textual queries
//! and gets back either variable bindings (enumeration/read queries) or a
//! success flag (commands). Anything that speaks this contract can back a
//! [`crate::envs::BlockWorldEnv`], including the in-process [`NativeBlocksEngine`]
//! and scripted mocks in tests.

pub mod native;

use std::fmt;

use crate::core::Result;

pub use native::NativeBlocksEngine;

/// Query enumerating every derivable world state, bound to `State`.
pub const STATES_QUERY: &str = "state(State)";
/// Query enumerating every action schema, bound to `A`.
pub const ACTIONS_QUERY: &str = "action(A)";
/// Command placing the engine world in its canonical initial configuration.
pub const RESET_COMMAND: &str = "reset";
/// Query reading the engine's current world state, bound to `State`.
pub const CURRENT_STATE_QUERY: &str = "current_state(State)";

pub const STATE_VAR: &str = "State";
pub const ACTION_VAR: &str = "A";

/// Command performing the action rendered as `call`.
pub fn step_command(call: &str) -> String { format!("step({call})") }

/// Command placing the engine world in the configuration `state`, one of the
/// descriptors bound by [`STATES_QUERY`]. Rejected (`Ok(false)`) for anything else.
pub fn reset_to_command(state: &str) -> String { format!("{RESET_COMMAND}({state})") }

/// A term as returned by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(String),
    Number(i64),
    Str(String),
    Compound { functor: String, args: Vec<Term> },
}

impl Term {
    pub fn atom<S: Into<String>>(s: S) -> Self { Term::Atom(s.into()) }

    pub fn compound<S: Into<String>>(functor: S, args: Vec<Term>) -> Self {
        Term::Compound { functor: functor.into(), args }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(s) | Term::Str(s) => f.write_str(s),
            Term::Number(n) => write!(f, "{n}"),
            Term::Compound { functor, args } => {
                write!(f, "{functor}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 { f.write_str(",")?; }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One solution of an enumeration query: variable name to bound term, in binding order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(String, Term)>,
}

impl Bindings {
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Single-variable solution, the common shape for `state(State)` and `action(A)`.
    pub fn single<S: Into<String>>(var: S, term: Term) -> Self {
        Self { entries: vec![(var.into(), term)] }
    }

    pub fn insert<S: Into<String>>(&mut self, var: S, term: Term) {
        let var = var.into();
        if let Some((_, t)) = self.entries.iter_mut().find(|(v, _)| *v == var) {
            *t = term;
        } else {
            self.entries.push((var, term));
        }
    }

    pub fn get(&self, var: &str) -> Option<&Term> {
        self.entries.iter().find(|(v, _)| v == var).map(|(_, t)| t)
    }
}

/// Request/response channel to a rule engine session.
///
/// Every call blocks until the engine answers. `Err` always means the
/// session itself failed; a command the engine rejects is `Ok(false)`.
pub trait RuleEngine {
    /// Run an enumeration/read query and collect all solutions.
    fn solutions(&mut self, query: &str) -> Result<Vec<Bindings>>;

    /// Run a command query and report whether it succeeded.
    fn command(&mut self, query: &str) -> Result<bool>;

    /// Release the session. Calling it more than once must be harmless.
    fn shutdown(&mut self) -> Result<()>;
}

impl<E: RuleEngine + ?Sized> RuleEngine for Box<E> {
    fn solutions(&mut self, query: &str) -> Result<Vec<Bindings>> { (**self).solutions(query) }
    fn command(&mut self, query: &str) -> Result<bool> { (**self).command(query) }
    fn shutdown(&mut self) -> Result<()> { (**self).shutdown() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_terms_render_verbatim() {
        let t = Term::compound("move", vec![Term::atom("a"), Term::atom("b"), Term::Number(4)]);
        assert_eq!(t.to_string(), "move(a,b,4)");
        assert_eq!(Term::compound("noop", vec![]).to_string(), "noop()");
    }

    #[test]
    fn bindings_replace_existing_variable() {
        let mut b = Bindings::single(STATE_VAR, Term::atom("123"));
        b.insert(STATE_VAR, Term::atom("1a2"));
        assert_eq!(b.get(STATE_VAR), Some(&Term::atom("1a2")));
        assert_eq!(b.get("Other"), None);
    }

    #[test]
    fn step_command_wraps_call() {
        assert_eq!(step_command("move(a,1,2)"), "step(move(a,1,2))");
    }

    #[test]
    fn reset_to_command_names_the_state() {
        assert_eq!(reset_to_command("1ab"), "reset(1ab)");
    }
}
