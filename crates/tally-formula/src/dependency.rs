//! Dependency tracking between variables

use ahash::{AHashMap, AHashSet};

use crate::error::{FormulaError, FormulaResult};

/// Default limit on the length of a dependency chain
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Per-pass visit state of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    /// On the current walk path; meeting it again closes a cycle
    Visiting,
    Resolved,
}

/// Dependency graph for variables
///
/// Tracks which variables each variable references (precedents) and the
/// reverse relation (dependents), keyed by canonical name.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Variable names in insertion order
    names: Vec<String>,
    /// Variable → variables it references, in order of appearance
    precedents: AHashMap<String, Vec<String>>,
    /// Variable → variables that reference it
    dependents: AHashMap<String, AHashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable together with the names it references
    ///
    /// Adding a name twice replaces its references.
    pub fn add_variable<'a>(
        &mut self,
        name: &str,
        references: impl IntoIterator<Item = &'a str>,
    ) {
        self.clear_dependencies(name);
        if !self.precedents.contains_key(name) {
            self.names.push(name.to_string());
        }

        let mut refs = Vec::new();
        for reference in references {
            if refs.iter().any(|r| r == reference) {
                continue;
            }
            refs.push(reference.to_string());
            self.dependents
                .entry(reference.to_string())
                .or_default()
                .insert(name.to_string());
        }
        self.precedents.insert(name.to_string(), refs);
    }

    /// Remove the references a variable makes
    fn clear_dependencies(&mut self, name: &str) {
        if let Some(precedents) = self.precedents.get(name) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(precedent) {
                    deps.remove(name);
                }
            }
        }
    }

    /// Check if a variable has been added
    pub fn contains(&self, name: &str) -> bool {
        self.precedents.contains_key(name)
    }

    /// Variables that the given variable references
    pub fn precedents(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(name)
            .into_iter()
            .flat_map(|refs| refs.iter().map(String::as_str))
    }

    /// Variables that reference the given variable
    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.dependents
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Order in which every variable can be evaluated after its precedents
    ///
    /// Variables are walked in insertion order, references in order of
    /// appearance, and the first problem met is reported:
    /// - a reference to a name that was never added → `UndefinedVariable`
    /// - a variable met again while still on the walk path → `CircularDependency`
    /// - a chain longer than `max_depth` → `DependencyTooDeep`
    pub fn resolution_order(&self, max_depth: usize) -> FormulaResult<Vec<&str>> {
        let mut state: AHashMap<&str, VisitState> = AHashMap::new();
        let mut order = Vec::with_capacity(self.names.len());

        for name in &self.names {
            self.visit(name, max_depth, &mut state, &mut order)?;
        }

        Ok(order)
    }

    /// Detect circular references involving a variable
    pub fn has_circular_reference(&self, name: &str) -> bool {
        let mut state = AHashMap::new();
        let mut order = Vec::new();
        matches!(
            self.visit(name, usize::MAX, &mut state, &mut order),
            Err(FormulaError::CircularDependency { .. })
        )
    }

    /// Depth-first walk from `root` using an explicit stack
    ///
    /// Each stack frame is a variable and the index of its next precedent.
    /// The stack doubles as the current walk path for cycle reporting.
    fn visit<'a>(
        &'a self,
        root: &'a str,
        max_depth: usize,
        state: &mut AHashMap<&'a str, VisitState>,
        order: &mut Vec<&'a str>,
    ) -> FormulaResult<()> {
        let state_of = |state: &AHashMap<&'a str, VisitState>, name: &str| {
            state.get(name).copied().unwrap_or(VisitState::Unvisited)
        };

        if state_of(state, root) == VisitState::Resolved {
            return Ok(());
        }
        if !self.contains(root) {
            return Err(FormulaError::UndefinedVariable(root.to_string()));
        }

        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
        state.insert(root, VisitState::Visiting);

        while let Some(frame) = stack.last_mut() {
            let (name, next) = *frame;
            let dep = self
                .precedents
                .get(name)
                .and_then(|refs| refs.get(next))
                .map(String::as_str);
            let Some(dep) = dep else {
                state.insert(name, VisitState::Resolved);
                order.push(name);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match state_of(state, dep) {
                VisitState::Resolved => {}
                VisitState::Visiting => {
                    let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|(n, _)| n.to_string()).collect();
                    path.push(dep.to_string());
                    return Err(FormulaError::CircularDependency {
                        name: dep.to_string(),
                        path,
                    });
                }
                VisitState::Unvisited => {
                    if !self.contains(dep) {
                        return Err(FormulaError::UndefinedVariable(dep.to_string()));
                    }
                    if stack.len() >= max_depth {
                        return Err(FormulaError::DependencyTooDeep {
                            name: root.to_string(),
                            limit: max_depth,
                        });
                    }
                    state.insert(dep, VisitState::Visiting);
                    stack.push((dep, 0));
                }
            }
        }

        Ok(())
    }
}
