//! Variable and formula records
//!
//! These are the plain records a host layer creates and edits. The evaluation
//! engine only ever reads them.

use std::fmt;

use lazy_regex::regex_is_match;

/// Opaque identifier of a [`Variable`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VariableId(String);

/// Opaque identifier of a [`Formula`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FormulaId(String);

macro_rules! impl_id {
    ($ty:ident) => {
        impl $ty {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $ty {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

impl_id!(VariableId);
impl_id!(FormulaId);

/// How a variable's expression is meant to be read
///
/// Both kinds are evaluated the same way; the kind only records intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum VariableKind {
    /// A literal number such as `10000`
    #[default]
    Constant,
    /// An expression over other variables such as `BASIC*0.2`
    Dynamic,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Constant => f.write_str("CONSTANT"),
            VariableKind::Dynamic => f.write_str("DYNAMIC"),
        }
    }
}

/// A named numeric variable
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub id: VariableId,
    /// Canonical (uppercase) name, unique across the catalog
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: VariableKind,
    pub expression: String,
}

impl Variable {
    /// Create a variable record
    ///
    /// No validation happens here; [`Catalog`](crate::Catalog) is the place
    /// that enforces naming rules.
    pub fn new(
        id: impl Into<VariableId>,
        name: impl Into<String>,
        kind: VariableKind,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            expression: expression.into(),
        }
    }

    /// Shorthand for a constant variable
    pub fn constant(
        id: impl Into<VariableId>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(id, name, VariableKind::Constant, value)
    }

    /// Shorthand for a dynamic variable
    pub fn dynamic(
        id: impl Into<VariableId>,
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self::new(id, name, VariableKind::Dynamic, expression)
    }
}

/// A named formula, evaluated on demand
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formula {
    pub id: FormulaId,
    /// Canonical (uppercase) name
    pub name: String,
    /// May reference variables and `{{#name}}` placeholders
    pub expression: String,
}

impl Formula {
    /// Create a formula record
    pub fn new(
        id: impl Into<FormulaId>,
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expression: expression.into(),
        }
    }
}

/// Canonical form of a user-entered name: trimmed and uppercased
pub fn canonical_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Check whether a name can be referenced from an expression
///
/// Only `[A-Z_][A-Z0-9_]*` is recognised as a reference, so lowercase names
/// would be unreachable.
pub fn is_canonical_name(name: &str) -> bool {
    regex_is_match!(r"^[A-Z_][A-Z0-9_]*$", name)
}
