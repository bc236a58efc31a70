//! Contextual placeholder substitution
//!
//! Formulas may contain placeholders such as `{{#num_of_days}}` whose values
//! are supplied by the caller for a single evaluation. Placeholder names match
//! `[a-zA-Z_][a-zA-Z0-9_]*`.

use std::collections::HashMap;

use ahash::AHashMap;
use lazy_regex::regex;
use regex::{Captures, Regex};

use crate::error::{FormulaError, FormulaResult};

fn placeholder_regex() -> &'static Regex {
    regex!(r"\{\{#([a-zA-Z_][a-zA-Z0-9_]*)\}\}")
}

/// Raw placeholder values supplied for one evaluation
///
/// Values are kept as entered; they are validated as numbers only when a
/// placeholder that uses them is substituted.
#[derive(Debug, Clone, Default)]
pub struct ContextValues {
    values: AHashMap<String, String>,
}

impl ContextValues {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw value of a placeholder
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw value of a placeholder, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Check if a placeholder has a value
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of supplied values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values were supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of a placeholder
    ///
    /// Absent, empty and whitespace-only values are missing; anything that is
    /// not a finite number is rejected.
    pub fn number(&self, name: &str) -> FormulaResult<f64> {
        let raw = self
            .get(name)
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| FormulaError::MissingContextValue(name.to_string()))?;

        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| FormulaError::NonNumericContextValue {
                name: name.to_string(),
                value: raw.to_string(),
            })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContextValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for ContextValues {
    fn from(values: HashMap<String, String>) -> Self {
        values.into_iter().collect()
    }
}

/// Distinct placeholder names in an expression, in order of first appearance
///
/// Hosts use this to ask for each value once before evaluating.
///
/// # Example
/// ```rust
/// use tally_formula::context_placeholders;
///
/// let names = context_placeholders("{{#days}} * RATE + {{#bonus}} / {{#days}}");
/// assert_eq!(names, vec!["days", "bonus"]);
/// ```
pub fn context_placeholders(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(expression) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace every `{{#name}}` placeholder with its numeric value
///
/// All placeholders are validated before anything is replaced, so the result
/// is either a placeholder-free expression or the first failing placeholder's
/// error.
///
/// # Example
/// ```rust
/// use tally_formula::{substitute_context, ContextValues};
///
/// let ctx = ContextValues::new().with("num_of_days", "20");
/// let expr = substitute_context("(GROSS/30)*{{#num_of_days}}", &ctx).unwrap();
/// assert_eq!(expr, "(GROSS/30)*20");
/// ```
pub fn substitute_context(expression: &str, context: &ContextValues) -> FormulaResult<String> {
    let mut replacements: AHashMap<String, String> = AHashMap::new();
    for name in context_placeholders(expression) {
        let value = context.number(&name)?;
        replacements.insert(name, value.to_string());
    }

    if replacements.is_empty() {
        return Ok(expression.to_string());
    }

    let substituted = placeholder_regex().replace_all(expression, |caps: &Captures| {
        // Every captured name was validated above
        replacements
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(substituted.into_owned())
}
