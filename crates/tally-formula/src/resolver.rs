//! Variable resolution
//!
//! Computes the numeric value of every variable in a set. Variables are
//! walked depth-first in input order; each one is parsed when the walk first
//! reaches it and evaluated once all of its references are resolved, so the
//! first problem met along the walk is the one reported.

use ahash::{AHashMap, AHashSet};
use tally_core::Variable;
use tracing::{debug, trace};

use crate::ast::Expr;
use crate::dependency::DEFAULT_MAX_DEPTH;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, Environment};
use crate::parser::parse_expression;

/// Resolved value of every variable, keyed by canonical name
#[derive(Debug, Clone, Default)]
pub struct ResolvedValues {
    values: AHashMap<String, f64>,
}

impl ResolvedValues {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a variable
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Check if a variable was resolved
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of resolved variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }
}

impl Environment for ResolvedValues {
    fn variable(&self, name: &str) -> FormulaResult<f64> {
        self.get(name)
            .ok_or_else(|| FormulaError::UndefinedVariable(name.to_string()))
    }
}

/// Resolve every variable with the default depth limit
///
/// # Example
/// ```rust
/// use tally_core::Variable;
/// use tally_formula::resolve_variables;
///
/// let variables = vec![
///     Variable::constant("1", "BASIC", "10000"),
///     Variable::dynamic("2", "DA", "BASIC*0.2"),
/// ];
/// let values = resolve_variables(&variables).unwrap();
/// assert_eq!(values.get("BASIC"), Some(10000.0));
/// assert_eq!(values.get("DA"), Some(2000.0));
/// ```
pub fn resolve_variables(variables: &[Variable]) -> FormulaResult<ResolvedValues> {
    resolve_variables_with_depth(variables, DEFAULT_MAX_DEPTH)
}

/// Resolve every variable, failing on dependency chains deeper than `max_depth`
///
/// The whole set is resolved even if only a few values are needed; the first
/// error met aborts the pass and nothing partial is returned.
pub fn resolve_variables_with_depth(
    variables: &[Variable],
    max_depth: usize,
) -> FormulaResult<ResolvedValues> {
    debug!(count = variables.len(), max_depth, "resolving variables");

    let mut lookup: AHashMap<&str, &Variable> = AHashMap::with_capacity(variables.len());
    for variable in variables {
        if lookup.insert(variable.name.as_str(), variable).is_some() {
            return Err(FormulaError::DuplicateVariableName(variable.name.clone()));
        }
    }

    let mut values = ResolvedValues::new();
    for variable in variables {
        resolve_from(variable, &lookup, max_depth, &mut values)?;
    }

    debug!(count = values.len(), "variables resolved");
    Ok(values)
}

/// Variable on the walk path, waiting for its references
struct Frame<'a> {
    name: &'a str,
    expr: Expr,
    references: Vec<String>,
    next: usize,
}

impl<'a> Frame<'a> {
    fn open(variable: &'a Variable) -> FormulaResult<Self> {
        let name = variable.name.as_str();
        let expr = parse_expression(&variable.expression).map_err(|e| {
            debug!(variable = name, error = %e, "variable expression does not parse");
            e
        })?;
        if !expr.placeholders().is_empty() {
            return Err(FormulaError::PlaceholderInVariable(name.to_string()));
        }
        let references = expr.references().into_iter().map(str::to_string).collect();

        Ok(Self {
            name,
            expr,
            references,
            next: 0,
        })
    }
}

/// Resolve `root` and everything it depends on using an explicit stack
///
/// The stack doubles as the current walk path for cycle reporting; its
/// length is what `max_depth` bounds.
fn resolve_from<'a>(
    root: &'a Variable,
    lookup: &AHashMap<&'a str, &'a Variable>,
    max_depth: usize,
    values: &mut ResolvedValues,
) -> FormulaResult<()> {
    if values.contains(&root.name) {
        return Ok(());
    }

    let mut visiting: AHashSet<&'a str> = AHashSet::new();
    let mut stack = vec![Frame::open(root)?];
    visiting.insert(root.name.as_str());

    while let Some(frame) = stack.last_mut() {
        let Some(reference) = frame.references.get(frame.next) else {
            if let Some(done) = stack.pop() {
                let value = evaluate(&done.expr, &*values)?;
                trace!(variable = done.name, value, "resolved variable");
                visiting.remove(done.name);
                values.insert(done.name, value);
            }
            continue;
        };
        frame.next += 1;

        let Some(&variable) = lookup.get(reference.as_str()) else {
            return Err(FormulaError::UndefinedVariable(reference.clone()));
        };
        let name = variable.name.as_str();

        if values.contains(name) {
            continue;
        }
        if visiting.contains(name) {
            let start = stack.iter().position(|f| f.name == name).unwrap_or(0);
            let mut path: Vec<String> = stack[start..].iter().map(|f| f.name.to_string()).collect();
            path.push(name.to_string());
            return Err(FormulaError::CircularDependency {
                name: name.to_string(),
                path,
            });
        }
        if stack.len() >= max_depth {
            return Err(FormulaError::DependencyTooDeep {
                name: root.name.clone(),
                limit: max_depth,
            });
        }

        stack.push(Frame::open(variable)?);
        visiting.insert(name);
    }

    Ok(())
}
