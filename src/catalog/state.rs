use std::collections::HashMap;

use log::{debug, info};

use crate::core::{EnvError, Result};
use crate::engine::{RuleEngine, STATES_QUERY, STATE_VAR};

/// Bijection between symbolic state descriptors and state indices.
#[derive(Clone, Debug, PartialEq)]
pub struct StateCatalog {
    states: Vec<String>,
    index: HashMap<String, usize>,
}

impl StateCatalog {
    /// Enumerate every derivable state from the engine with one query.
    pub fn build<E: RuleEngine + ?Sized>(engine: &mut E) -> Result<Self> {
        let solutions = engine
            .solutions(STATES_QUERY)
            .map_err(|e| EnvError::CatalogEnumeration(format!("state enumeration failed: {e}")))?;
        let descriptors = solutions
            .iter()
            .map(|b| {
                b.get(STATE_VAR)
                    .map(|t| t.to_string())
                    .ok_or_else(|| EnvError::CatalogEnumeration(format!("solution without `{STATE_VAR}` binding")))
            })
            .collect::<Result<Vec<_>>>()?;
        let catalog = Self::from_descriptors(descriptors)?;
        info!("state catalog built with {} states", catalog.len());
        Ok(catalog)
    }

    /// Build from descriptors in enumeration order. Repeated descriptors keep their first index.
    pub fn from_descriptors<I, S>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut states = Vec::new();
        let mut index = HashMap::new();
        for d in descriptors {
            let d = d.into();
            if index.contains_key(&d) {
                debug!("duplicate state descriptor {d:?} ignored");
                continue;
            }
            index.insert(d.clone(), states.len());
            states.push(d);
        }
        if states.is_empty() {
            return Err(EnvError::CatalogEnumeration("engine returned no states".into()));
        }
        Ok(Self { states, index })
    }

    pub fn index_of(&self, state: &str) -> Result<usize> {
        self.index.get(state).copied().ok_or_else(|| EnvError::UnknownState(state.to_string()))
    }

    pub fn state_of(&self, index: usize) -> Result<&str> {
        self.states
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| EnvError::UnknownState(format!("index {index} out of range 0..{}", self.states.len())))
    }

    pub fn len(&self) -> usize { self.states.len() }

    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// Descriptors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }
}
