//! Relocation of marked functions to module scope.
//!
//! Each top-level statement holding marked functions is rebuilt as:
//!
//! ```text
//! const <name> = <rewritten function>;   // one per function, discovery order
//! export const <exported> = <name>;      // named export declarations only
//! <the statement, with each function replaced by a reference to <name>>
//! ```
//!
//! Functions are moved out of the tree, never copied.

use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_span::{SourceType, Span, SPAN};
use std::collections::HashMap;

use crate::error::CompilerError;
use crate::naming::PlannedFunction;
use crate::scanner::Placement;
use crate::syntax::parse_statement_snippet;

pub struct Relocator<'a, 'c> {
    ast: AstBuilder<'a>,
    source_type: SourceType,
    directive: &'c str,
    filename: &'c str,
}

impl<'a, 'c> Relocator<'a, 'c> {
    pub fn new(
        allocator: &'a Allocator,
        source_type: SourceType,
        directive: &'c str,
        filename: &'c str,
    ) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            source_type,
            directive,
            filename,
        }
    }

    /// Hoists every planned function. `finish` receives each function (as an
    /// expression, directive stripped) and returns the hoisted initializer.
    pub fn relocate<F>(
        &self,
        program: &mut Program<'a>,
        planned: &[PlannedFunction],
        mut finish: F,
    ) -> Result<(), CompilerError>
    where
        F: FnMut(&PlannedFunction, Expression<'a>) -> Result<Expression<'a>, CompilerError>,
    {
        let body = std::mem::replace(&mut program.body, self.ast.vec());
        let mut out = self.ast.vec();

        for (index, stmt) in body.into_iter().enumerate() {
            let targets: Vec<&PlannedFunction> = planned
                .iter()
                .filter(|p| p.candidate.statement_index == index)
                .collect();
            if targets.is_empty() {
                out.push(stmt);
                continue;
            }

            let mut extractor = FunctionExtractor::new(self.ast, &targets);
            let remaining = extractor.take_from_statement(stmt);

            for target in &targets {
                let span = target.candidate.span;
                let mut function = extractor.taken.remove(&span).ok_or_else(|| {
                    CompilerError::internal(
                        &format!(
                            "\"{}\" function `{}` was not found during relocation",
                            self.directive, target.function_name
                        ),
                        self.filename,
                    )
                })?;
                strip_directive(&mut function, self.directive);

                let init = finish(target, function)?;
                out.push(self.hoisted_binding(&target.function_name, init)?);

                let alias = match &target.candidate.placement {
                    Placement::NamedExport { exported } => {
                        Some(format!("export const {} = {};", exported, target.function_name))
                    }
                    Placement::Declaration { declared } if *declared != target.function_name => {
                        Some(format!("const {} = {};", declared, target.function_name))
                    }
                    _ => None,
                };
                if let Some(alias) = alias {
                    for stmt in self.snippet(&alias)? {
                        out.push(stmt);
                    }
                }
            }

            if let Some(stmt) = remaining {
                out.push(stmt);
            }
        }

        program.body = out;
        Ok(())
    }

    /// `const <name> = <init>;`
    fn hoisted_binding(&self, name: &str, init: Expression<'a>) -> Result<Statement<'a>, CompilerError> {
        let mut statements = self.snippet(&format!("const {} = 0;", name))?;
        let mut stmt = statements
            .pop()
            .ok_or_else(|| CompilerError::internal("empty binding snippet", self.filename))?;
        if let Statement::VariableDeclaration(decl) = &mut stmt {
            if let Some(declarator) = decl.declarations.first_mut() {
                declarator.init = Some(init);
            }
        }
        Ok(stmt)
    }

    fn snippet(&self, text: &str) -> Result<ArenaVec<'a, Statement<'a>>, CompilerError> {
        parse_statement_snippet(self.ast.allocator, text, self.filename, self.source_type)
    }
}

fn strip_directive(function: &mut Expression<'_>, directive: &str) {
    let body = match function {
        Expression::FunctionExpression(func) => func.body.as_mut(),
        Expression::ArrowFunctionExpression(arrow) => Some(&mut arrow.body),
        _ => None,
    };
    if let Some(body) = body {
        body.directives.retain(|d| d.directive.as_str() != directive);
    }
}

fn into_expression<'a>(mut func: oxc_allocator::Box<'a, Function<'a>>) -> Expression<'a> {
    func.r#type = FunctionType::FunctionExpression;
    Expression::FunctionExpression(func)
}

/// Pulls target functions out of one top-level statement, leaving a reference
/// to each function's hoisted name behind.
struct FunctionExtractor<'a, 't> {
    ast: AstBuilder<'a>,
    targets: &'t [&'t PlannedFunction],
    taken: HashMap<Span, Expression<'a>>,
}

impl<'a, 't> FunctionExtractor<'a, 't> {
    fn new(ast: AstBuilder<'a>, targets: &'t [&'t PlannedFunction]) -> Self {
        Self {
            ast,
            targets,
            taken: HashMap::new(),
        }
    }

    fn target_name(&self, span: Span) -> Option<&'t str> {
        self.targets
            .iter()
            .find(|t| t.candidate.span == span)
            .map(|t| t.function_name.as_str())
    }

    fn reference(&self, name: &str) -> Expression<'a> {
        self.ast
            .expression_identifier(SPAN, self.ast.allocator.alloc_str(name))
    }

    /// Returns what is left of the statement, if anything.
    fn take_from_statement(&mut self, stmt: Statement<'a>) -> Option<Statement<'a>> {
        match stmt {
            Statement::FunctionDeclaration(func) if self.target_name(func.span).is_some() => {
                self.taken.insert(func.span, into_expression(func));
                None
            }
            Statement::ExportNamedDeclaration(decl)
                if matches!(
                    &decl.declaration,
                    Some(Declaration::FunctionDeclaration(func)) if self.target_name(func.span).is_some()
                ) =>
            {
                if let Some(Declaration::FunctionDeclaration(func)) = decl.unbox().declaration {
                    self.taken.insert(func.span, into_expression(func));
                }
                None
            }
            mut stmt => {
                self.visit_statement(&mut stmt);
                Some(stmt)
            }
        }
    }
}

impl<'a> VisitMut<'a> for FunctionExtractor<'a, '_> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        let span = match expr {
            Expression::FunctionExpression(func) => Some(func.span),
            Expression::ArrowFunctionExpression(arrow) => Some(arrow.span),
            _ => None,
        };
        if let Some((span, name)) = span.and_then(|s| Some((s, self.target_name(s)?))) {
            let function = std::mem::replace(expr, self.reference(name));
            self.taken.insert(span, function);
            return;
        }
        walk_mut::walk_expression(self, expr);
    }

    fn visit_export_default_declaration(&mut self, decl: &mut ExportDefaultDeclaration<'a>) {
        if let ExportDefaultDeclarationKind::FunctionDeclaration(func) = &decl.declaration {
            let span = func.span;
            if let Some(name) = self.target_name(span) {
                let reference = ExportDefaultDeclarationKind::Identifier(
                    self.ast
                        .alloc_identifier_reference(SPAN, self.ast.allocator.alloc_str(name)),
                );
                if let ExportDefaultDeclarationKind::FunctionDeclaration(func) =
                    std::mem::replace(&mut decl.declaration, reference)
                {
                    self.taken.insert(span, into_expression(func));
                }
                return;
            }
        }
        walk_mut::walk_export_default_declaration(self, decl);
    }
}
