//! Prelude module - common imports for tally users
//!
//! ```rust
//! use tally::prelude::*;
//! ```

pub use crate::{
    // Extension traits
    CatalogEvaluationExt,
    // Main types
    Catalog,
    ContextValues,
    Engine,
    EngineOptions,
    // Error types
    Error,
    EvaluationError,
    Formula,
    FormulaError,
    Variable,
    VariableKind,
};
