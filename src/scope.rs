use oxc_ast::ast::Program;
use oxc_ast::AstKind;
use oxc_semantic::SemanticBuilder;
use oxc_span::GetSpan;
use std::collections::{HashMap, HashSet};

lazy_static::lazy_static! {
    /// Builtin globals that count as existing bindings when picking names.
    pub static ref BUILTIN_GLOBALS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for name in [
            "AggregateError", "Array", "ArrayBuffer", "Atomics", "BigInt",
            "BigInt64Array", "BigUint64Array", "Boolean", "DataView", "Date",
            "Error", "EvalError", "FinalizationRegistry", "Float32Array",
            "Float64Array", "Function", "Infinity", "Int16Array", "Int32Array",
            "Int8Array", "Intl", "JSON", "Map", "Math", "NaN", "Number", "Object",
            "Promise", "Proxy", "RangeError", "ReferenceError", "Reflect",
            "RegExp", "Set", "SharedArrayBuffer", "String", "Symbol",
            "SyntaxError", "TypeError", "URIError", "Uint16Array", "Uint32Array",
            "Uint8Array", "Uint8ClampedArray", "WeakMap", "WeakRef", "WeakSet",
            "arguments", "decodeURI", "decodeURIComponent", "encodeURI",
            "encodeURIComponent", "escape", "eval", "globalThis", "isFinite",
            "isNaN", "parseFloat", "parseInt", "undefined", "unescape",
        ] {
            s.insert(name);
        }
        s
    };
}

/// Module-scope view used while choosing names: root bindings, globals the
/// module refers to, and every name handed out so far.
#[derive(Debug, Default, Clone)]
pub struct ModuleScope {
    bindings: HashSet<String>,
}

impl ModuleScope {
    pub fn from_program(program: &Program<'_>) -> Self {
        let semantic = SemanticBuilder::new().build(program).semantic;
        let scoping = semantic.scoping();
        let root = scoping.root_scope_id();

        let mut bindings = HashSet::new();
        for symbol_id in scoping.symbol_ids() {
            if scoping.symbol_scope_id(symbol_id) == root {
                bindings.insert(scoping.symbol_name(symbol_id).to_string());
            }
        }
        // A hoisted binding named after an unresolved global would shadow it.
        for name in scoping.root_unresolved_references().keys() {
            bindings.insert(name.to_string());
        }

        Self { bindings }
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains(name) || BUILTIN_GLOBALS.contains(name)
    }

    pub fn declare(&mut self, name: &str) {
        self.bindings.insert(name.to_string());
    }
}

/// Resolved reference count of every module-scope symbol, keyed by name.
///
/// References to a function or class from inside its own declaration do not
/// count. Only references that resolve to the root symbol are considered, so a
/// shadowing parameter or local with the same name never affects the count.
pub fn root_reference_counts(program: &Program<'_>) -> HashMap<String, usize> {
    let semantic = SemanticBuilder::new().build(program).semantic;
    let scoping = semantic.scoping();
    let nodes = semantic.nodes();
    let root = scoping.root_scope_id();

    let mut counts = HashMap::new();
    for symbol_id in scoping.symbol_ids() {
        if scoping.symbol_scope_id(symbol_id) != root {
            continue;
        }
        let own_span = match nodes.get_node(scoping.symbol_declaration(symbol_id)).kind() {
            AstKind::Function(func) => Some(func.span),
            AstKind::Class(class) => Some(class.span),
            _ => None,
        };
        let references = scoping
            .get_resolved_reference_ids(symbol_id)
            .iter()
            .filter(|&&reference_id| {
                let node_id = scoping.get_reference(reference_id).node_id();
                let span = nodes.get_node(node_id).kind().span();
                !own_span.is_some_and(|own| own.start <= span.start && span.end <= own.end)
            })
            .count();
        *counts
            .entry(scoping.symbol_name(symbol_id).to_string())
            .or_insert(0) += references;
    }
    counts
}
