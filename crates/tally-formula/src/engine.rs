//! Formula evaluation
//!
//! Ties the pieces together: contextual substitution, variable resolution,
//! then evaluation of the formula against the resolved values.
//!
//! # Example
//!
//! ```rust
//! use tally_core::Variable;
//! use tally_formula::{evaluate_formula, ContextValues};
//!
//! let variables = vec![Variable::constant("1", "GROSS", "3000")];
//! let context = ContextValues::new().with("num_of_days", "20");
//!
//! let result = evaluate_formula("(GROSS/30)*{{#num_of_days}}", &variables, &context).unwrap();
//! assert_eq!(result, 2000.0);
//! ```

use lazy_regex::regex;
use regex::Regex;
use tally_core::Variable;
use tracing::debug;

use crate::context::{substitute_context, ContextValues};
use crate::dependency::DEFAULT_MAX_DEPTH;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::parser::parse_expression;
use crate::resolver::{resolve_variables_with_depth, ResolvedValues};

/// Options for formula evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Longest dependency chain allowed between variables (default: 256)
    pub max_depth: usize,
}

fn reference_regex() -> &'static Regex {
    regex!(r"\b[A-Z_][A-Z0-9_]*\b")
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Stateless formula evaluator
///
/// Every call starts from scratch; nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    /// Create an engine with custom options
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Resolve every variable in the set
    pub fn resolve(&self, variables: &[Variable]) -> FormulaResult<ResolvedValues> {
        resolve_variables_with_depth(variables, self.options.max_depth)
    }

    /// Evaluate a formula expression
    ///
    /// Steps, each of which may fail and abort the evaluation:
    /// 1. substitute contextual placeholders
    /// 2. resolve all variables
    /// 3. check that every name in the substituted text is defined
    /// 4. parse the substituted text and evaluate it against the resolved values
    pub fn evaluate(
        &self,
        expression: &str,
        variables: &[Variable],
        context: &ContextValues,
    ) -> FormulaResult<f64> {
        debug!(expression, "evaluating formula");

        let substituted = substitute_context(expression, context)?;
        let values = self.resolve(variables)?;
        let result = self.evaluate_resolved(&substituted, &values)?;

        debug!(expression, result, "formula evaluated");
        Ok(result)
    }

    /// Evaluate a placeholder-free expression against already resolved values
    ///
    /// Names are looked up in the raw text before it is parsed, so an
    /// undefined name is reported even when the expression is also malformed.
    pub fn evaluate_resolved(
        &self,
        expression: &str,
        values: &ResolvedValues,
    ) -> FormulaResult<f64> {
        if let Some(name) = reference_regex()
            .find_iter(expression)
            .map(|m| m.as_str())
            .find(|name| !values.contains(name))
        {
            return Err(FormulaError::UndefinedVariable(name.to_string()));
        }

        let ast = parse_expression(expression)?;
        evaluate(&ast, values)
    }
}

/// Evaluate a formula expression with default options
pub fn evaluate_formula(
    expression: &str,
    variables: &[Variable],
    context: &ContextValues,
) -> FormulaResult<f64> {
    Engine::default().evaluate(expression, variables, context)
}
