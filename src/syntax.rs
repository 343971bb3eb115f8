//! Parsing helpers shared by the passes.
//!
//! Hook output (replacement templates, runtime snippets) is parsed into the
//! same arena as the module. Its spans point into the snippet text rather than
//! the module source, so they are reset before the nodes are spliced in.

use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::{Expression, Program, Statement};
use oxc_ast_visit::VisitMut;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{SourceType, Span, SPAN};

use crate::error::{CompilerError, ErrorKind};

pub fn module_source_type() -> SourceType {
    SourceType::default()
        .with_typescript(true)
        .with_module(true)
        .with_jsx(true)
}

fn parse_options() -> ParseOptions {
    ParseOptions {
        preserve_parens: false,
        ..ParseOptions::default()
    }
}

pub fn parse_module<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    filename: &str,
    source_type: SourceType,
) -> Result<Program<'a>, CompilerError> {
    let ret = Parser::new(allocator, source, source_type)
        .with_options(parse_options())
        .parse();

    if let Some(error) = ret.errors.first() {
        return Err(CompilerError::unlocated(
            ErrorKind::Syntax,
            &format!("Failed to parse module: {}", error),
            filename,
        ));
    }
    if ret.panicked {
        return Err(CompilerError::unlocated(
            ErrorKind::Syntax,
            "Failed to parse module",
            filename,
        ));
    }
    Ok(ret.program)
}

/// Parses hook output as a single expression.
pub fn parse_expression_snippet<'a>(
    allocator: &'a Allocator,
    text: &str,
    filename: &str,
    source_type: SourceType,
) -> Result<Expression<'a>, CompilerError> {
    let text = allocator.alloc_str(text);
    let mut expr = Parser::new(allocator, text, source_type)
        .with_options(parse_options())
        .parse_expression()
        .map_err(|errors| {
            let reason = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_default();
            CompilerError::unlocated(
                ErrorKind::InvalidTemplate,
                &format!("Replacement `{}` is not a valid expression: {}", text, reason),
                filename,
            )
        })?;
    SpanEraser.visit_expression(&mut expr);
    Ok(expr)
}

/// Parses hook output (or an internal snippet) as module statements.
pub fn parse_statement_snippet<'a>(
    allocator: &'a Allocator,
    text: &str,
    filename: &str,
    source_type: SourceType,
) -> Result<ArenaVec<'a, Statement<'a>>, CompilerError> {
    let text = allocator.alloc_str(text);
    let ret = Parser::new(allocator, text, source_type)
        .with_options(parse_options())
        .parse();

    if let Some(error) = ret.errors.first() {
        return Err(CompilerError::unlocated(
            ErrorKind::InvalidTemplate,
            &format!("Snippet `{}` does not parse: {}", text, error),
            filename,
        ));
    }

    let mut program = ret.program;
    SpanEraser.visit_program(&mut program);
    Ok(program.body)
}

struct SpanEraser;

impl<'a> VisitMut<'a> for SpanEraser {
    fn visit_span(&mut self, span: &mut Span) {
        *span = SPAN;
    }
}
