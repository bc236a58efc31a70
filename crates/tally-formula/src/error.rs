//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing, resolving or evaluating an expression
///
/// Every error is terminal for the call that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// A character that cannot start or continue any token
    #[error("Invalid character '{character}' at position {position}")]
    Syntax { character: char, position: usize },

    /// A run of digits and dots that is not a decimal number
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Unbalanced `(` or `)`
    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    /// Operators without enough operands, or operands without operators
    #[error("Invalid expression")]
    InvalidExpression,

    /// Right operand of `/` evaluated to zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Reference to a variable that is not defined
    #[error("Variable \"{0}\" is not defined")]
    UndefinedVariable(String),

    /// A variable depends on itself, directly or through others
    #[error("Circular dependency detected at \"{name}\" ({})", .path.join(" -> "))]
    CircularDependency { name: String, path: Vec<String> },

    /// Dependency chain longer than the configured limit
    #[error("Dependency chain of \"{name}\" is deeper than {limit}")]
    DependencyTooDeep { name: String, limit: usize },

    /// Two variables share a name
    #[error("Variable name is not unique: {0}")]
    DuplicateVariableName(String),

    /// A variable expression uses a contextual placeholder
    #[error("Contextual placeholders are not allowed in variable \"{0}\"")]
    PlaceholderInVariable(String),

    /// No value was supplied for a contextual placeholder
    #[error("Missing value for contextual variable \"{0}\"")]
    MissingContextValue(String),

    /// The supplied value for a contextual placeholder is not a number
    #[error("Contextual variable \"{name}\" must be numeric. Got \"{value}\".")]
    NonNumericContextValue { name: String, value: String },
}
