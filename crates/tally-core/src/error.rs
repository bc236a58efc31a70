//! Error types for tally-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while editing a [`Catalog`](crate::Catalog)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A name was empty after trimming
    #[error("{0} name is required")]
    EmptyName(&'static str),

    /// A name is not a valid reference identifier
    #[error("Invalid name: {0} (expected letters, digits and '_', not starting with a digit)")]
    InvalidName(String),

    /// An expression was empty after trimming
    #[error("Expression is required for {0}")]
    EmptyExpression(String),

    /// A variable name is already taken (case-insensitive)
    #[error("Variable name already exists: {0}")]
    DuplicateVariableName(String),

    /// A variable expression contains a contextual placeholder
    #[error("Contextual placeholders are not allowed in variables: {0}")]
    PlaceholderInVariable(String),

    /// Two records in a loaded document share an id
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// No variable with the given id
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// No formula with the given id
    #[error("Formula not found: {0}")]
    FormulaNotFound(String),
}
