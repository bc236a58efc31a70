//! Variable and formula catalog
//!
//! The catalog is the host-side collection of [`Variable`]s and [`Formula`]s.
//! It enforces the rules the evaluation engine relies on:
//!
//! - variable names are canonical (uppercase) and unique, case-insensitively
//! - variable expressions never contain contextual placeholders
//! - records are edited in place by id, so identity survives a replace
//!
//! # Example
//!
//! ```rust
//! use tally_core::{Catalog, Error, VariableKind};
//!
//! let mut catalog = Catalog::new();
//! let id = catalog.add_variable("gross", VariableKind::Constant, "3000").unwrap();
//!
//! // Same name in another case is rejected
//! assert_eq!(
//!     catalog.add_variable("Gross", VariableKind::Constant, "1"),
//!     Err(Error::DuplicateVariableName("GROSS".into()))
//! );
//!
//! catalog.replace_variable(&id, "gross", VariableKind::Constant, "3500").unwrap();
//! assert_eq!(catalog.variable(&id).unwrap().expression, "3500");
//! ```

use ahash::AHashMap;
#[cfg(feature = "serde")]
use ahash::AHashSet;

use crate::error::{Error, Result};
use crate::model::{
    canonical_name, is_canonical_name, Formula, FormulaId, Variable, VariableId, VariableKind,
};
use crate::PLACEHOLDER_OPEN;

/// Collection of variables and formulas with name validation
///
/// Records keep their insertion order.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "CatalogDocument", into = "CatalogDocument")
)]
pub struct Catalog {
    variables: Vec<Variable>,
    formulas: Vec<Formula>,
    /// Canonical name → variable id
    names: AHashMap<String, VariableId>,
}

/// Serialized shape of a catalog: `{ "variables": [...], "formulas": [...] }`
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    variables: Vec<Variable>,
    #[serde(default)]
    formulas: Vec<Formula>,
}

#[cfg(feature = "serde")]
impl TryFrom<CatalogDocument> for Catalog {
    type Error = Error;

    fn try_from(doc: CatalogDocument) -> Result<Self> {
        let mut catalog = Catalog::new();
        // Variables and formulas draw ids from one counter
        let mut ids: AHashSet<String> = AHashSet::new();

        for variable in doc.variables {
            catalog.check_variable(&variable.name, &variable.expression, None)?;
            if !ids.insert(variable.id.to_string()) {
                return Err(Error::DuplicateId(variable.id.to_string()));
            }
            catalog
                .names
                .insert(variable.name.to_uppercase(), variable.id.clone());
            catalog.variables.push(variable);
        }

        for formula in doc.formulas {
            Self::check_formula(&formula.name, formula.expression.trim())?;
            if !ids.insert(formula.id.to_string()) {
                return Err(Error::DuplicateId(formula.id.to_string()));
            }
            catalog.formulas.push(formula);
        }

        Ok(catalog)
    }
}

#[cfg(feature = "serde")]
impl From<Catalog> for CatalogDocument {
    fn from(catalog: Catalog) -> Self {
        Self {
            variables: catalog.variables,
            formulas: catalog.formulas,
        }
    }
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// All variables, in insertion order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All formulas, in insertion order
    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    /// Check if the catalog holds no variables and no formulas
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.formulas.is_empty()
    }

    // === Variables ===

    /// Add a variable, returning its new id
    ///
    /// The name is trimmed and uppercased before validation.
    pub fn add_variable(
        &mut self,
        name: &str,
        kind: VariableKind,
        expression: &str,
    ) -> Result<VariableId> {
        let name = canonical_name(name);
        let expression = expression.trim();
        self.check_variable(&name, expression, None)?;

        let id = VariableId::new(self.next_id());
        self.names.insert(name.clone(), id.clone());
        self.variables
            .push(Variable::new(id.clone(), name, kind, expression));
        Ok(id)
    }

    /// Replace a variable's name, kind and expression, keeping its id
    pub fn replace_variable(
        &mut self,
        id: &VariableId,
        name: &str,
        kind: VariableKind,
        expression: &str,
    ) -> Result<()> {
        let index = self
            .variable_index(id)
            .ok_or_else(|| Error::VariableNotFound(id.to_string()))?;

        let name = canonical_name(name);
        let expression = expression.trim();
        self.check_variable(&name, expression, Some(id))?;

        let variable = &mut self.variables[index];
        self.names.remove(&variable.name.to_uppercase());
        self.names.insert(name.clone(), id.clone());
        variable.name = name;
        variable.kind = kind;
        variable.expression = expression.to_string();
        Ok(())
    }

    /// Remove a variable by id
    pub fn remove_variable(&mut self, id: &VariableId) -> Result<Variable> {
        let index = self
            .variable_index(id)
            .ok_or_else(|| Error::VariableNotFound(id.to_string()))?;
        let variable = self.variables.remove(index);
        self.names.remove(&variable.name.to_uppercase());
        Ok(variable)
    }

    /// Get a variable by id
    pub fn variable(&self, id: &VariableId) -> Option<&Variable> {
        self.variables.iter().find(|v| &v.id == id)
    }

    /// Get a variable by name (case-insensitive)
    pub fn variable_by_name(&self, name: &str) -> Option<&Variable> {
        let id = self.names.get(&canonical_name(name))?;
        self.variable(id)
    }

    /// Check if a variable name is taken (case-insensitive)
    pub fn contains_variable(&self, name: &str) -> bool {
        self.names.contains_key(&canonical_name(name))
    }

    fn variable_index(&self, id: &VariableId) -> Option<usize> {
        self.variables.iter().position(|v| &v.id == id)
    }

    /// Validate a variable about to be stored under `name`
    ///
    /// `editing` is the id of the record being replaced, which may keep its
    /// own name.
    fn check_variable(
        &self,
        name: &str,
        expression: &str,
        editing: Option<&VariableId>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyName("Variable"));
        }
        if !is_canonical_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        if expression.trim().is_empty() {
            return Err(Error::EmptyExpression(name.to_string()));
        }
        if expression.contains(PLACEHOLDER_OPEN) {
            return Err(Error::PlaceholderInVariable(name.to_string()));
        }
        match self.names.get(&name.to_uppercase()) {
            Some(existing) if Some(existing) != editing => {
                Err(Error::DuplicateVariableName(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    // === Formulas ===

    /// Add a formula, returning its new id
    ///
    /// Referenced variables are not checked here; see the evaluation layer
    /// for that.
    pub fn add_formula(&mut self, name: &str, expression: &str) -> Result<FormulaId> {
        let name = canonical_name(name);
        let expression = expression.trim();
        Self::check_formula(&name, expression)?;

        let id = FormulaId::new(self.next_id());
        self.formulas
            .push(Formula::new(id.clone(), name, expression));
        Ok(id)
    }

    /// Replace a formula's name and expression, keeping its id
    pub fn replace_formula(&mut self, id: &FormulaId, name: &str, expression: &str) -> Result<()> {
        let name = canonical_name(name);
        let expression = expression.trim();
        Self::check_formula(&name, expression)?;

        let formula = self
            .formulas
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| Error::FormulaNotFound(id.to_string()))?;
        formula.name = name;
        formula.expression = expression.to_string();
        Ok(())
    }

    /// Remove a formula by id
    pub fn remove_formula(&mut self, id: &FormulaId) -> Result<Formula> {
        let index = self
            .formulas
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| Error::FormulaNotFound(id.to_string()))?;
        Ok(self.formulas.remove(index))
    }

    /// Get a formula by id
    pub fn formula(&self, id: &FormulaId) -> Option<&Formula> {
        self.formulas.iter().find(|f| &f.id == id)
    }

    /// Get the first formula with the given name (case-insensitive)
    pub fn formula_by_name(&self, name: &str) -> Option<&Formula> {
        let name = canonical_name(name);
        self.formulas.iter().find(|f| f.name == name)
    }

    fn check_formula(name: &str, expression: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyName("Formula"));
        }
        if expression.is_empty() {
            return Err(Error::EmptyExpression(name.to_string()));
        }
        Ok(())
    }

    /// Next free numeric id, shared by variables and formulas
    fn next_id(&self) -> String {
        let max = self
            .variables
            .iter()
            .map(|v| v.id.as_str())
            .chain(self.formulas.iter().map(|f| f.id.as_str()))
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}
