//! Catalog evaluation
//!
//! Evaluates stored formulas against the catalog's variables.
//!
//! # Example
//!
//! ```rust
//! use tally::prelude::*;
//!
//! let mut catalog = Catalog::new();
//! catalog.add_variable("BASIC", VariableKind::Constant, "10000").unwrap();
//! catalog.add_variable("DA", VariableKind::Dynamic, "BASIC*0.2").unwrap();
//!
//! let values = catalog.resolve().unwrap();
//! assert_eq!(values.get("DA"), Some(2000.0));
//!
//! let missing = catalog.undefined_references("BASIC + HRA").unwrap();
//! assert_eq!(missing, vec!["HRA".to_string()]);
//! ```

use tally_core::{Catalog, Error};
use tally_formula::{
    parse_expression, ContextValues, DependencyGraph, Engine, EngineOptions, FormulaError,
    FormulaResult, ResolvedValues,
};
use thiserror::Error as ThisError;
use tracing::debug;

/// Result type for catalog evaluation
pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;

/// Errors from evaluating a stored formula
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum EvaluationError {
    /// The catalog could not supply what was asked for
    #[error(transparent)]
    Catalog(#[from] Error),

    /// The engine rejected the formula or its variables
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Extension trait for Catalog to add evaluation methods
pub trait CatalogEvaluationExt {
    /// Resolve every variable with default options
    fn resolve(&self) -> FormulaResult<ResolvedValues>;

    /// Resolve every variable with custom options
    fn resolve_with_options(&self, options: &EngineOptions) -> FormulaResult<ResolvedValues>;

    /// Evaluate the formula named `formula_name` with default options
    fn evaluate(&self, formula_name: &str, context: &ContextValues) -> EvaluationResult<f64>;

    /// Evaluate the formula named `formula_name` with custom options
    fn evaluate_with_options(
        &self,
        formula_name: &str,
        context: &ContextValues,
        options: &EngineOptions,
    ) -> EvaluationResult<f64>;

    /// Evaluate an ad-hoc expression against the catalog's variables
    fn evaluate_expression(&self, expression: &str, context: &ContextValues)
        -> FormulaResult<f64>;

    /// Evaluate an ad-hoc expression with custom options
    fn evaluate_expression_with_options(
        &self,
        expression: &str,
        context: &ContextValues,
        options: &EngineOptions,
    ) -> FormulaResult<f64>;

    /// Names referenced by `expression` that no variable defines
    ///
    /// Placeholders are not references. Names are returned in order of first
    /// appearance.
    fn undefined_references(&self, expression: &str) -> FormulaResult<Vec<String>>;

    /// Names of the variables whose expressions reference `name`, sorted
    ///
    /// Variables whose expressions do not parse are skipped.
    fn dependent_variables(&self, name: &str) -> Vec<String>;
}

impl CatalogEvaluationExt for Catalog {
    fn resolve(&self) -> FormulaResult<ResolvedValues> {
        self.resolve_with_options(&EngineOptions::default())
    }

    fn resolve_with_options(&self, options: &EngineOptions) -> FormulaResult<ResolvedValues> {
        Engine::new(options.clone()).resolve(self.variables())
    }

    fn evaluate(&self, formula_name: &str, context: &ContextValues) -> EvaluationResult<f64> {
        self.evaluate_with_options(formula_name, context, &EngineOptions::default())
    }

    fn evaluate_with_options(
        &self,
        formula_name: &str,
        context: &ContextValues,
        options: &EngineOptions,
    ) -> EvaluationResult<f64> {
        let formula = self
            .formula_by_name(formula_name)
            .ok_or_else(|| Error::FormulaNotFound(formula_name.to_string()))?;

        debug!(formula = %formula.name, id = %formula.id, "evaluating stored formula");
        let engine = Engine::new(options.clone());
        Ok(engine.evaluate(&formula.expression, self.variables(), context)?)
    }

    fn evaluate_expression(
        &self,
        expression: &str,
        context: &ContextValues,
    ) -> FormulaResult<f64> {
        self.evaluate_expression_with_options(expression, context, &EngineOptions::default())
    }

    fn evaluate_expression_with_options(
        &self,
        expression: &str,
        context: &ContextValues,
        options: &EngineOptions,
    ) -> FormulaResult<f64> {
        Engine::new(options.clone()).evaluate(expression, self.variables(), context)
    }

    fn undefined_references(&self, expression: &str) -> FormulaResult<Vec<String>> {
        let ast = parse_expression(expression)?;
        Ok(ast
            .references()
            .into_iter()
            .filter(|name| !self.contains_variable(name))
            .map(str::to_string)
            .collect())
    }

    fn dependent_variables(&self, name: &str) -> Vec<String> {
        let mut graph = DependencyGraph::new();
        for variable in self.variables() {
            if let Ok(ast) = parse_expression(&variable.expression) {
                graph.add_variable(&variable.name, ast.references());
            }
        }

        let name = tally_core::canonical_name(name);
        let mut dependents: Vec<String> = graph.dependents(&name).map(str::to_string).collect();
        dependents.sort();
        dependents
    }
}
