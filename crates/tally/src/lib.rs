//! # tally
//!
//! Define named numeric variables and formulas, then evaluate formulas to a
//! single number.
//!
//! ## Features
//!
//! - Constant and dynamic variables that reference each other by name
//! - Dependency resolution with cycle detection
//! - Contextual inputs supplied per evaluation through `{{#name}}` placeholders
//! - `+ - * /` with parentheses, evaluated in double precision
//!
//! ## Example
//!
//! ```rust
//! use tally::prelude::*;
//!
//! let mut catalog = Catalog::new();
//! catalog.add_variable("GROSS", VariableKind::Constant, "3000").unwrap();
//! catalog.add_formula("daily", "(GROSS/30)*{{#num_of_days}}").unwrap();
//!
//! let ctx = ContextValues::new().with("num_of_days", "20");
//! assert_eq!(catalog.evaluate("DAILY", &ctx).unwrap(), 2000.0);
//! ```

pub mod evaluation;
pub mod prelude;

// Re-export evaluation types
pub use evaluation::{CatalogEvaluationExt, EvaluationError, EvaluationResult};

// Re-export core types
pub use tally_core::{
    canonical_name, is_canonical_name, Catalog, Error, Formula, FormulaId, Result, Variable,
    VariableId, VariableKind, PLACEHOLDER_OPEN,
};

// Re-export formula types
pub use tally_formula::{
    context_placeholders, evaluate_formula, parse_expression, resolve_variables,
    substitute_context, tokenize_and_evaluate, ContextValues, Engine, EngineOptions, Expr,
    FormulaError, FormulaResult, ResolvedValues, DEFAULT_MAX_DEPTH,
};
