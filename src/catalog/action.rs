use std::collections::HashMap;
use std::fmt;

use log::{debug, info};

use crate::core::{EnvError, Result};
use crate::engine::{RuleEngine, Term, ACTIONS_QUERY, ACTION_VAR};

/// A structured action: name plus ordered, already stringified arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActionTerm {
    pub name: String,
    pub args: Vec<String>,
}

impl ActionTerm {
    pub fn new<S: Into<String>>(name: S, args: Vec<String>) -> Self {
        Self { name: name.into(), args }
    }

    /// Convert an engine term. Arguments are stringified verbatim; an atom
    /// becomes a zero-argument action.
    pub fn from_term(term: &Term) -> Result<Self> {
        match term {
            Term::Compound { functor, args } => {
                Ok(Self::new(functor.clone(), args.iter().map(|a| a.to_string()).collect()))
            }
            Term::Atom(name) => Ok(Self::new(name.clone(), Vec::new())),
            other => Err(EnvError::CatalogEnumeration(format!("action is not a callable term: {other}"))),
        }
    }

    /// Canonical call string: `name(arg1,arg2,...)`.
    pub fn render_call(&self) -> String {
        format!("{}({})", self.name, self.args.join(","))
    }
}

impl fmt::Display for ActionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_call())
    }
}

/// Bijection between action terms and action indices, with the rendered call string of each.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionCatalog {
    actions: Vec<ActionTerm>,
    calls: Vec<String>,
    index: HashMap<ActionTerm, usize>,
}

impl ActionCatalog {
    /// Enumerate every action schema from the engine with one query.
    pub fn build<E: RuleEngine + ?Sized>(engine: &mut E) -> Result<Self> {
        let solutions = engine
            .solutions(ACTIONS_QUERY)
            .map_err(|e| EnvError::CatalogEnumeration(format!("action enumeration failed: {e}")))?;
        let terms = solutions
            .iter()
            .map(|b| {
                let term = b
                    .get(ACTION_VAR)
                    .ok_or_else(|| EnvError::CatalogEnumeration(format!("solution without `{ACTION_VAR}` binding")))?;
                ActionTerm::from_term(term)
            })
            .collect::<Result<Vec<_>>>()?;
        let catalog = Self::from_terms(terms)?;
        info!("action catalog built with {} actions", catalog.len());
        Ok(catalog)
    }

    /// Build from terms in enumeration order. Repeated terms keep their first index.
    pub fn from_terms<I: IntoIterator<Item = ActionTerm>>(terms: I) -> Result<Self> {
        let mut actions = Vec::new();
        let mut calls = Vec::new();
        let mut index = HashMap::new();
        for t in terms {
            if index.contains_key(&t) {
                debug!("duplicate action {t} ignored");
                continue;
            }
            index.insert(t.clone(), actions.len());
            calls.push(t.render_call());
            actions.push(t);
        }
        if actions.is_empty() {
            return Err(EnvError::CatalogEnumeration("engine returned no actions".into()));
        }
        Ok(Self { actions, calls, index })
    }

    pub fn index_of(&self, action: &ActionTerm) -> Result<usize> {
        self.index.get(action).copied().ok_or_else(|| EnvError::UnknownAction(action.to_string()))
    }

    pub fn action_of(&self, index: usize) -> Result<&ActionTerm> {
        self.actions.get(index).ok_or_else(|| self.out_of_range(index))
    }

    pub fn call_string_of(&self, index: usize) -> Result<&str> {
        self.calls.get(index).map(String::as_str).ok_or_else(|| self.out_of_range(index))
    }

    pub fn len(&self) -> usize { self.actions.len() }

    pub fn is_empty(&self) -> bool { self.actions.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &ActionTerm> { self.actions.iter() }

    fn out_of_range(&self, index: usize) -> EnvError {
        EnvError::UnknownAction(format!("index {index} out of range 0..{}", self.actions.len()))
    }
}
