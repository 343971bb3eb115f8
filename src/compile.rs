//! Directive compilation pipeline.
//!
//! parse → scan (all validation) → name → relocate + rewrite → runtime prelude
//! → (target pass) export finalization → dead-code elimination → codegen.
//!
//! Validation finishes before the tree is touched, so a rejected module never
//! produces partial output.

use oxc_allocator::Allocator;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

use crate::codegen::generate;
use crate::dce::eliminate_dead_code;
use crate::error::{line_column, CompilerError};
use crate::finalize::{append_export_list, prepend_statements, strip_exports};
use crate::identity::{
    base_filename, chunk_name, extracted_filename, function_id, is_target_pass, split_param,
};
use crate::naming::{NameResolver, PlannedFunction};
use crate::options::CompileDirectivesOptions;
use crate::registry::{DirectiveFn, DirectiveRegistry};
use crate::relocate::Relocator;
use crate::rewrite::{apply_template, Replacer, ReplacerArgs, RuntimeCodeGenerator, FN_PLACEHOLDER};
use crate::scanner::{scan_module, ScanOptions};
use crate::scope::ModuleScope;
use crate::syntax::{module_source_type, parse_module, parse_statement_snippet};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileDirectivesResult {
    pub code: String,
    pub map: Option<String>,
    #[serde(rename = "directiveFnsById")]
    pub directive_fns: DirectiveRegistry,
}

pub fn compile_directives(
    opts: &CompileDirectivesOptions,
    replacer: &dyn Replacer,
    runtime: Option<&dyn RuntimeCodeGenerator>,
) -> Result<CompileDirectivesResult, CompilerError> {
    let config = &opts.config;
    let split_param = split_param(config);
    let is_source_fn = is_target_pass(&opts.filename, &split_param);
    let _span = tracing::debug_span!(
        "compile_directives",
        filename = %opts.filename,
        is_source_fn
    )
    .entered();

    let allocator = Allocator::default();
    let source_type = module_source_type();
    let mut program = parse_module(&allocator, &opts.code, &opts.filename, source_type)?;

    let candidates = scan_module(
        &program,
        ScanOptions {
            directive: &config.directive,
            directive_label: &config.directive_label,
            source: &opts.code,
            filename: &opts.filename,
        },
    )?;

    let base = base_filename(&opts.filename);
    let planned = NameResolver::new(ModuleScope::from_program(&program))
        .with_id_scheme(base, &opts.root)
        .plan(candidates);

    let extracted = extracted_filename(&opts.filename, &split_param);
    let mut registry = DirectiveRegistry::default();

    let relocator = Relocator::new(&allocator, source_type, &config.directive, &opts.filename);
    relocator.relocate(&mut program, &planned, |target: &PlannedFunction, function| {
        let function_id = function_id(base, &opts.root, &target.function_name);
        let args = ReplacerArgs {
            fn_placeholder: FN_PLACEHOLDER.to_string(),
            extracted_filename: extracted.clone(),
            filename: opts.filename.clone(),
            function_id: function_id.clone(),
            is_source_fn,
        };
        let template = replacer.replace(&args);
        let replacement = apply_template(
            &allocator,
            source_type,
            &opts.filename,
            &template,
            function,
        )?;

        tracing::debug!(
            function_name = %target.function_name,
            function_id = %function_id,
            "relocated directive function"
        );
        registry.insert(DirectiveFn {
            function_name: target.function_name.clone(),
            function_id,
            extracted_filename: extracted.clone(),
            filename: opts.filename.clone(),
            chunk_name: chunk_name(&extracted, &opts.root),
            location: line_column(&opts.code, target.candidate.span.start),
        })?;
        Ok(replacement)
    })?;

    if let Some(runtime) = runtime.filter(|_| !registry.is_empty()) {
        let text = runtime.runtime_code(&registry);
        let statements = parse_statement_snippet(&allocator, &text, &opts.filename, source_type)?;
        prepend_statements(&allocator, &mut program, statements);
    }

    if is_source_fn {
        let stripped = strip_exports(&allocator, &mut program);
        let names = registry.function_names();
        append_export_list(&allocator, &mut program, &names, &opts.filename, source_type)?;
        tracing::debug!(stripped, exported = names.len(), "finalized target exports");
    }

    let hoisted: HashSet<String> = planned.iter().map(|p| p.function_name.clone()).collect();
    eliminate_dead_code(&allocator, &mut program, &hoisted);

    let generated = generate(&program, &opts.filename, config.minify);
    Ok(CompileDirectivesResult {
        code: generated.code,
        map: generated.map,
        directive_fns: registry,
    })
}

/// Compiles independent modules in parallel. Results keep input order.
pub fn compile_directives_batch(
    inputs: &[CompileDirectivesOptions],
    replacer: &(dyn Replacer + Sync),
    runtime: Option<&(dyn RuntimeCodeGenerator + Sync)>,
) -> Vec<Result<CompileDirectivesResult, CompilerError>> {
    inputs
        .par_iter()
        .map(|opts| {
            compile_directives(
                opts,
                replacer,
                runtime.map(|r| r as &dyn RuntimeCodeGenerator),
            )
        })
        .collect()
}
