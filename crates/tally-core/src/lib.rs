//! # tally-core
//!
//! Core data structures for the tally formula library.
//!
//! This crate provides the fundamental types used throughout tally:
//! - [`Variable`] and [`VariableKind`] - Named numeric values (constants or expressions)
//! - [`Formula`] - Named expressions evaluated on demand with contextual inputs
//! - [`Catalog`] - The in-memory collection of variables and formulas, with
//!   name validation and id-based editing
//!
//! ## Example
//!
//! ```rust
//! use tally_core::{Catalog, VariableKind};
//!
//! let mut catalog = Catalog::new();
//! catalog.add_variable("basic", VariableKind::Constant, "10000").unwrap();
//! catalog.add_variable("DA", VariableKind::Dynamic, "BASIC*0.2").unwrap();
//! catalog.add_formula("net", "BASIC + DA").unwrap();
//!
//! // Names are stored in canonical (uppercase) form
//! assert!(catalog.variable_by_name("BASIC").is_some());
//! ```

pub mod catalog;
pub mod error;
pub mod model;

// Re-exports for convenience
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use model::{
    canonical_name, is_canonical_name, Formula, FormulaId, Variable, VariableId, VariableKind,
};

/// Opening sequence of a contextual placeholder (`{{#name}}`)
pub const PLACEHOLDER_OPEN: &str = "{{#";
