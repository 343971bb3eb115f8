//! Finalize Module
//!
//! Runtime prelude for every pass, and export rewriting for the extraction
//! target: the target module exposes exactly the relocated functions.

use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_span::SourceType;

use crate::error::CompilerError;
use crate::syntax::parse_statement_snippet;

pub fn prepend_statements<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    statements: ArenaVec<'a, Statement<'a>>,
) {
    let ast = AstBuilder::new(allocator);
    let body = std::mem::replace(&mut program.body, ast.vec());
    let mut out = ast.vec();
    for stmt in statements {
        out.push(stmt);
    }
    for stmt in body {
        out.push(stmt);
    }
    program.body = out;
}

/// Demotes every export to a plain statement. Named declarations stay in
/// place; anonymous defaults, re-exports and specifier lists are dropped.
pub fn strip_exports<'a>(allocator: &'a Allocator, program: &mut Program<'a>) -> usize {
    let ast = AstBuilder::new(allocator);
    let body = std::mem::replace(&mut program.body, ast.vec());
    let mut out = ast.vec();
    let mut stripped = 0;

    for stmt in body {
        let kept = match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                stripped += 1;
                decl.unbox().declaration.and_then(named_declaration)
            }
            Statement::ExportDefaultDeclaration(decl) => {
                stripped += 1;
                default_declaration(decl.unbox().declaration)
            }
            Statement::ExportAllDeclaration(_)
            | Statement::TSExportAssignment(_)
            | Statement::TSNamespaceExportDeclaration(_) => {
                stripped += 1;
                None
            }
            other => Some(other),
        };
        if let Some(stmt) = kept {
            out.push(stmt);
        }
    }

    program.body = out;
    stripped
}

fn named_declaration(declaration: Declaration<'_>) -> Option<Statement<'_>> {
    match declaration {
        Declaration::FunctionDeclaration(func) if func.id.is_none() => None,
        Declaration::ClassDeclaration(class) if class.id.is_none() => None,
        other => Some(Statement::from(other)),
    }
}

fn default_declaration(kind: ExportDefaultDeclarationKind<'_>) -> Option<Statement<'_>> {
    match kind {
        ExportDefaultDeclarationKind::FunctionDeclaration(func) if func.id.is_some() => {
            Some(Statement::FunctionDeclaration(func))
        }
        ExportDefaultDeclarationKind::ClassDeclaration(class) if class.id.is_some() => {
            Some(Statement::ClassDeclaration(class))
        }
        ExportDefaultDeclarationKind::TSInterfaceDeclaration(decl) => {
            Some(Statement::TSInterfaceDeclaration(decl))
        }
        _ => None,
    }
}

/// Appends `export { a, b, ... };`.
pub fn append_export_list<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    names: &[&str],
    filename: &str,
    source_type: SourceType,
) -> Result<(), CompilerError> {
    let text = format!("export {{ {} }};", names.join(", "));
    for stmt in parse_statement_snippet(allocator, &text, filename, source_type)? {
        program.body.push(stmt);
    }
    Ok(())
}
