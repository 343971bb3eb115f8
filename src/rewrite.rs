//! Replacement hooks.
//!
//! A [`Replacer`] turns each relocated function into template text. The text
//! is parsed as an expression; every `$$fn$$` identifier in it is swapped for
//! the original function. Without the placeholder the body is dropped.

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::ast::Expression;
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;
use crate::registry::DirectiveRegistry;
use crate::syntax::parse_expression_snippet;

pub const FN_PLACEHOLDER: &str = "$$fn$$";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplacerArgs {
    /// Placeholder to embed where the original function should go.
    #[serde(rename = "fn")]
    pub fn_placeholder: String,
    pub extracted_filename: String,
    pub filename: String,
    pub function_id: String,
    /// True when compiling the extraction target itself.
    pub is_source_fn: bool,
}

pub trait Replacer {
    fn replace(&self, args: &ReplacerArgs) -> String;
}

impl<F> Replacer for F
where
    F: Fn(&ReplacerArgs) -> String,
{
    fn replace(&self, args: &ReplacerArgs) -> String {
        self(args)
    }
}

/// Produces statements prepended to every module that registered a function.
pub trait RuntimeCodeGenerator {
    fn runtime_code(&self, registry: &DirectiveRegistry) -> String;
}

impl<F> RuntimeCodeGenerator for F
where
    F: Fn(&DirectiveRegistry) -> String,
{
    fn runtime_code(&self, registry: &DirectiveRegistry) -> String {
        self(registry)
    }
}

/// Parses `template` and substitutes `function` for each placeholder.
pub fn apply_template<'a>(
    allocator: &'a Allocator,
    source_type: SourceType,
    filename: &str,
    template: &str,
    function: Expression<'a>,
) -> Result<Expression<'a>, CompilerError> {
    let mut expr = parse_expression_snippet(allocator, template, filename, source_type)?;
    if template.contains(FN_PLACEHOLDER) {
        let mut substitution = PlaceholderSubstitution {
            allocator,
            function: Some(function),
            first: None,
        };
        substitution.visit_expression(&mut expr);
    }
    Ok(expr)
}

struct PlaceholderSubstitution<'a> {
    allocator: &'a Allocator,
    function: Option<Expression<'a>>,
    /// Copy kept for occurrences after the first.
    first: Option<Expression<'a>>,
}

impl<'a> PlaceholderSubstitution<'a> {
    fn next_function(&mut self) -> Option<Expression<'a>> {
        match self.function.take() {
            Some(function) => {
                self.first = Some(function.clone_in(self.allocator));
                Some(function)
            }
            None => self.first.as_ref().map(|f| f.clone_in(self.allocator)),
        }
    }
}

impl<'a> VisitMut<'a> for PlaceholderSubstitution<'a> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        if let Expression::Identifier(id) = expr {
            if id.name.as_str() == FN_PLACEHOLDER {
                if let Some(function) = self.next_function() {
                    *expr = function;
                }
                return;
            }
        }
        walk_mut::walk_expression(self, expr);
    }
}
