//! # tally-formula
//!
//! Expression engine for tally.
//!
//! This crate provides:
//! - Tokenizing and parsing arithmetic expressions (text → [`Expr`])
//! - Evaluation with `+ - * /` and parentheses in double precision
//! - Contextual placeholder substitution (`{{#name}}`)
//! - Variable resolution with dependency ordering and cycle detection
//! - Formula evaluation tying the above together
//!
//! ## Example
//!
//! ```rust
//! use tally_core::Variable;
//! use tally_formula::{evaluate_formula, tokenize_and_evaluate, ContextValues};
//!
//! assert_eq!(tokenize_and_evaluate("2+3*4").unwrap(), 14.0);
//!
//! let variables = vec![
//!     Variable::constant("1", "BASIC", "10000"),
//!     Variable::dynamic("2", "DA", "BASIC*0.2"),
//! ];
//! let ctx = ContextValues::new().with("days", "10");
//! assert_eq!(evaluate_formula("DA/20*{{#days}}", &variables, &ctx).unwrap(), 1000.0);
//! ```

pub mod ast;
pub mod context;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod resolver;

pub use ast::{BinaryOperator, Expr};
pub use context::{context_placeholders, substitute_context, ContextValues};
pub use dependency::{DependencyGraph, DEFAULT_MAX_DEPTH};
pub use engine::{evaluate_formula, Engine, EngineOptions};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_postfix, tokenize_and_evaluate, EmptyEnvironment, Environment};
pub use lexer::{tokenize, LexMode, Token};
pub use parser::{assemble, parse_arithmetic, parse_expression, to_postfix};
pub use resolver::{resolve_variables, resolve_variables_with_depth, ResolvedValues};
