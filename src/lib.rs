//! # Directive Function Compiler
//!
//! Extracts functions marked with a directive (e.g. `'use server'`) out of a
//! module, hoists them to module scope under stable names and lets a
//! caller-supplied [`Replacer`] decide what each one becomes. The same source
//! file is compiled once per build target:
//!
//! - **Origin pass**: the module as imported by application code. Marked
//!   functions are usually replaced with remote-call stubs.
//! - **Target pass**: the module requested through its extracted filename
//!   (`file.ts?tsr-directive-use-server=`). The bodies are kept and the module
//!   exports exactly the relocated functions.
//!
//! ## Guarantees
//!
//! 1. **Stable ids**: a function's id depends only on the root-relative base
//!    filename and its resolved name, so both passes agree on it.
//! 2. **Unique names**: resolved names never collide with each other, with
//!    module-scope bindings, or with globals the module refers to.
//! 3. **Validate first**: every marked function is checked before the tree is
//!    mutated. Generators, class methods, object methods, nested functions and
//!    expression-bodied arrows are rejected with a code frame.
//! 4. **Order**: top-level statements keep their order; hoisted bindings are
//!    inserted directly before the statement they came from.

mod codegen;
mod compile;
mod dce;
mod error;
mod finalize;
mod identity;
mod naming;
mod options;
mod registry;
mod relocate;
mod rewrite;
mod scanner;
mod scope;
mod syntax;

#[cfg(feature = "napi")]
mod native;

#[cfg(test)]
mod rejection_tests;

pub use compile::{compile_directives, compile_directives_batch, CompileDirectivesResult};
pub use error::{CompilerError, ErrorKind, SourceLocation};
pub use identity::{base_filename, extracted_filename, function_id, is_target_pass, split_param};
pub use options::{CompileDirectivesOptions, DirectiveConfig, DEFAULT_SPLIT_PARAM_PREFIX};
pub use registry::{DirectiveFn, DirectiveRegistry};
pub use rewrite::{Replacer, ReplacerArgs, RuntimeCodeGenerator, FN_PLACEHOLDER};

#[cfg(feature = "napi")]
pub use native::compile_directives_native;
