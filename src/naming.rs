//! Name resolution for relocated functions.
//!
//! Names are built from lexical context collected by the scanner (enclosing
//! call fragments, declarator names, the function's own name) and then made
//! unique against everything already assigned in this compilation and the
//! module's live root scope.

use regex::Regex;
use std::collections::HashSet;

use crate::identity::{function_id, trim_one};
use crate::scanner::{DirectiveCandidate, Placement};
use crate::scope::ModuleScope;

pub const ANONYMOUS: &str = "anonymous";

lazy_static::lazy_static! {
    static ref UNSAFE_IDENT_CHAR: Regex = Regex::new(r"[^a-zA-Z0-9_$]").unwrap();
    static ref UNDERSCORE_RUN: Regex = Regex::new(r"_{2,}").unwrap();
    static ref NUMERIC_SUFFIX: Regex = Regex::new(r"^(.*)_(\d+)$").unwrap();
}

/// Joins fragments outermost-first; `anonymous` when there are none.
pub fn base_name(fragments: &[String]) -> String {
    let name = fragments
        .iter()
        .filter(|f| !f.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("_");
    if name.is_empty() {
        ANONYMOUS.to_string()
    } else {
        name
    }
}

pub fn make_identifier_safe(identifier: &str) -> String {
    let mut safe = UNSAFE_IDENT_CHAR.replace_all(identifier, "_").into_owned();
    if safe.starts_with(|c: char| c.is_ascii_digit()) {
        safe.insert(0, '_');
    }
    if safe.starts_with('$') {
        safe.insert(0, '_');
    }
    let collapsed = UNDERSCORE_RUN.replace_all(&safe, "_");
    trim_one(&collapsed, '_').to_string()
}

/// `foo` → `foo_1`, `foo_1` → `foo_2`, `step_2` → `step_3`.
pub fn increment_suffix(name: &str) -> String {
    let split = NUMERIC_SUFFIX
        .captures(name)
        .and_then(|caps| {
            let count = caps.get(2)?.as_str().parse::<u64>().ok()?;
            Some((caps.get(1)?.as_str().to_string(), count))
        });
    let (base, count) = split.unwrap_or_else(|| (name.to_string(), 0));
    format!("{}_{}", make_identifier_safe(&base), count + 1)
}

/// A validated candidate with its final, unique name.
#[derive(Debug, Clone)]
pub struct PlannedFunction {
    pub candidate: DirectiveCandidate,
    pub function_name: String,
}

pub struct NameResolver {
    assigned: HashSet<String>,
    assigned_ids: HashSet<String>,
    scope: ModuleScope,
    base_filename: String,
    root: String,
}

impl NameResolver {
    pub fn new(scope: ModuleScope) -> Self {
        Self {
            assigned: HashSet::new(),
            assigned_ids: HashSet::new(),
            scope,
            base_filename: String::new(),
            root: String::new(),
        }
    }

    /// Ids are derived from names with `base_filename` and `root`; distinct
    /// names whose ids coincide (`$x` and `_x`) are treated as a collision.
    pub fn with_id_scheme(mut self, base_filename: &str, root: &str) -> Self {
        self.base_filename = base_filename.to_string();
        self.root = root.to_string();
        self
    }

    fn id_of(&self, name: &str) -> String {
        function_id(&self.base_filename, &self.root, name)
    }

    pub fn resolve(&mut self, base: &str, exempt: Option<&str>) -> String {
        let mut name = base.to_string();
        while self.is_taken(&name, exempt) {
            let next = increment_suffix(&name);
            tracing::trace!(from = %name, to = %next, "function name collision");
            name = next;
        }
        self.assigned_ids.insert(self.id_of(&name));
        self.assigned.insert(name.clone());
        self.scope.declare(&name);
        name
    }

    fn is_taken(&self, name: &str, exempt: Option<&str>) -> bool {
        if self.assigned.contains(name) || self.assigned_ids.contains(&self.id_of(name)) {
            return true;
        }
        exempt != Some(name) && self.scope.has_binding(name)
    }

    /// Resolves every candidate in discovery order.
    pub fn plan(&mut self, candidates: Vec<DirectiveCandidate>) -> Vec<PlannedFunction> {
        candidates
            .into_iter()
            .map(|candidate| {
                let base = base_name(&candidate.fragments);
                // A bare top-level declaration is replaced by its own binding.
                let exempt = match &candidate.placement {
                    Placement::Declaration { declared } => Some(declared.as_str()),
                    _ => None,
                };
                let function_name = self.resolve(&base, exempt);
                PlannedFunction {
                    candidate,
                    function_name,
                }
            })
            .collect()
    }
}
