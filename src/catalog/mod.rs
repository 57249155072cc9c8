//! Closed-world catalogs mapping engine descriptors to dense indices.
//!
//! Both catalogs are built once from a single enumeration query and are
//! read-only afterwards. Index `i` is the position of the descriptor in
//! first-seen enumeration order, so indices always cover `[0, len)`.

pub mod action;
pub mod state;

pub use action::{ActionCatalog, ActionTerm};
pub use state::StateCatalog;
