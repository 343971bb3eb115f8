//! Directive scanner.
//!
//! Walks the module once, read-only, and returns every function carrying the
//! directive in discovery order, or the first structural rejection. Nothing is
//! mutated here: relocation runs only after the whole module has been
//! validated.
//!
//! Two discovery modes:
//!
//! - **Whole-module**: the directive sits in the module prologue. Every function
//!   that is the declaration value of a named or default export is a candidate.
//! - **Per-function**: each function whose own prologue carries the directive.
//!
//! Each candidate remembers the lexical fragments its name is built from, the
//! index of its top-level statement and how that statement holds it.

use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;

use crate::error::{CompilerError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionShape {
    Declaration,
    Expression,
    BlockArrow,
    ExpressionArrow,
    ClassMethod,
    ObjectMethod,
    Generator,
}

/// How the top-level statement holds the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// `function f() {}` at module level.
    Declaration { declared: String },
    /// `export function g() {}`
    NamedExport { exported: String },
    /// `export default function h() {}`
    DefaultExport,
    /// Anywhere an expression can sit: arguments, initializers, elements.
    Expression,
}

#[derive(Debug, Clone)]
pub struct DirectiveCandidate {
    pub span: Span,
    pub shape: FunctionShape,
    pub placement: Placement,
    pub statement_index: usize,
    /// Name fragments, outermost first.
    pub fragments: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions<'s> {
    pub directive: &'s str,
    pub directive_label: &'s str,
    pub source: &'s str,
    pub filename: &'s str,
}

pub fn scan_module(
    program: &Program<'_>,
    options: ScanOptions<'_>,
) -> Result<Vec<DirectiveCandidate>, CompilerError> {
    let whole_module = program
        .directives
        .iter()
        .any(|d| d.directive.as_str() == options.directive);

    if whole_module {
        scan_module_exports(program, options)
    } else {
        let mut scanner = DirectiveScanner::new(options);
        scanner.visit_program(program);
        match scanner.error {
            Some(error) => Err(error),
            None => Ok(scanner.candidates),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WHOLE-MODULE MODE
// ═══════════════════════════════════════════════════════════════════════════════

fn scan_module_exports(
    program: &Program<'_>,
    options: ScanOptions<'_>,
) -> Result<Vec<DirectiveCandidate>, CompilerError> {
    let mut candidates = Vec::new();

    for (index, stmt) in program.body.iter().enumerate() {
        let found = match stmt {
            Statement::ExportNamedDeclaration(decl) => match &decl.declaration {
                Some(Declaration::FunctionDeclaration(func)) => {
                    let exported = function_name(func);
                    Some((
                        func.span,
                        function_shape(func, None),
                        Placement::NamedExport {
                            exported: exported.clone().unwrap_or_default(),
                        },
                        exported,
                    ))
                }
                _ => None,
            },
            Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => Some((
                    func.span,
                    function_shape(func, None),
                    Placement::DefaultExport,
                    function_name(func),
                )),
                ExportDefaultDeclarationKind::FunctionExpression(func) => Some((
                    func.span,
                    function_shape(func, None),
                    Placement::Expression,
                    function_name(func),
                )),
                ExportDefaultDeclarationKind::ArrowFunctionExpression(arrow) => Some((
                    arrow.span,
                    arrow_shape(arrow),
                    Placement::Expression,
                    None,
                )),
                _ => None,
            },
            _ => None,
        };

        let Some((span, shape, placement, own_name)) = found else {
            continue;
        };
        check_shape(shape, span, options)?;
        candidates.push(DirectiveCandidate {
            span,
            shape,
            placement,
            statement_index: index,
            fragments: own_name.into_iter().collect(),
        });
    }

    Ok(candidates)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-FUNCTION MODE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodOwner {
    Class,
    Object,
}

#[derive(Debug)]
enum Frame {
    Function {
        span: Span,
        shape: FunctionShape,
        name: Option<String>,
    },
    /// Block-like construct that opens a lexical scope.
    Scope { span: Span },
    Call { fragment: Option<String> },
    Declarator { name: Option<String> },
}

impl Frame {
    fn scope_span(&self) -> Option<Span> {
        match self {
            Frame::Function { span, .. } | Frame::Scope { span } => Some(*span),
            Frame::Call { .. } | Frame::Declarator { .. } => None,
        }
    }
}

struct DirectiveScanner<'s> {
    options: ScanOptions<'s>,
    frames: Vec<Frame>,
    statement_index: usize,
    /// Function directly held by the current top-level statement.
    top_level_function: Option<(Span, Placement)>,
    /// Function value of the method being visited.
    pending_method: Option<(Span, MethodOwner)>,
    candidates: Vec<DirectiveCandidate>,
    error: Option<CompilerError>,
}

impl<'s> DirectiveScanner<'s> {
    fn new(options: ScanOptions<'s>) -> Self {
        Self {
            options,
            frames: Vec::new(),
            statement_index: 0,
            top_level_function: None,
            pending_method: None,
            candidates: Vec::new(),
            error: None,
        }
    }

    fn with_frame(&mut self, frame: Frame, visit: impl FnOnce(&mut Self)) {
        if self.error.is_some() {
            return;
        }
        self.frames.push(frame);
        visit(self);
        self.frames.pop();
    }

    fn take_method_owner(&mut self, span: Span) -> Option<MethodOwner> {
        match self.pending_method {
            Some((pending, owner)) if pending == span => {
                self.pending_method = None;
                Some(owner)
            }
            _ => None,
        }
    }

    fn record(&mut self) {
        let Some(owner) = self
            .frames
            .iter()
            .rposition(|f| matches!(f, Frame::Function { .. }))
        else {
            return;
        };
        let Frame::Function { span, shape, name } = &self.frames[owner] else {
            return;
        };
        let (span, shape, name) = (*span, *shape, name.clone());

        if self.candidates.iter().any(|c| c.span == span) {
            return;
        }

        if let Err(error) = self.validate(owner, span, shape) {
            self.error = Some(error);
            return;
        }

        let mut fragments: Vec<String> = self.frames[..owner]
            .iter()
            .filter_map(|frame| match frame {
                Frame::Call { fragment } => fragment.clone(),
                Frame::Declarator { name } => name.clone(),
                Frame::Function { .. } | Frame::Scope { .. } => None,
            })
            .collect();
        fragments.extend(name);

        let placement = match &self.top_level_function {
            Some((top_span, placement)) if *top_span == span => placement.clone(),
            _ => Placement::Expression,
        };

        self.candidates.push(DirectiveCandidate {
            span,
            shape,
            placement,
            statement_index: self.statement_index,
            fragments,
        });
    }

    fn validate(&self, owner: usize, span: Span, shape: FunctionShape) -> Result<(), CompilerError> {
        check_owner(shape, span, self.options)?;

        if let Some(scope) = self.frames[..owner].iter().rev().find_map(Frame::scope_span) {
            return Err(CompilerError::at_span(
                ErrorKind::IllegalNesting,
                &format!(
                    "{}s cannot be nested in other blocks or functions",
                    self.options.directive_label
                ),
                self.options.filename,
                self.options.source,
                scope,
            )
            .with_hint("Move the function to the top level of the module."));
        }

        check_form(shape, span, self.options)
    }
}

impl<'a> Visit<'a> for DirectiveScanner<'_> {
    fn visit_program(&mut self, program: &Program<'a>) {
        for (index, stmt) in program.body.iter().enumerate() {
            if self.error.is_some() {
                return;
            }
            self.statement_index = index;
            self.top_level_function = top_level_function(stmt);
            self.visit_statement(stmt);
        }
    }

    fn visit_directive(&mut self, directive: &Directive<'a>) {
        if self.error.is_none() && directive.directive.as_str() == self.options.directive {
            self.record();
        }
    }

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        let owner = self.take_method_owner(func.span);
        let frame = Frame::Function {
            span: func.span,
            shape: function_shape(func, owner),
            name: function_name(func),
        };
        self.with_frame(frame, |v| walk::walk_function(v, func, flags));
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        let frame = Frame::Function {
            span: arrow.span,
            shape: arrow_shape(arrow),
            name: None,
        };
        self.with_frame(frame, |v| walk::walk_arrow_function_expression(v, arrow));
    }

    fn visit_method_definition(&mut self, method: &MethodDefinition<'a>) {
        self.pending_method = Some((method.value.span, MethodOwner::Class));
        walk::walk_method_definition(self, method);
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if prop.method || matches!(prop.kind, PropertyKind::Get | PropertyKind::Set) {
            if let Expression::FunctionExpression(func) = &prop.value {
                self.pending_method = Some((func.span, MethodOwner::Object));
            }
        }
        walk::walk_object_property(self, prop);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        let frame = Frame::Call {
            fragment: call_fragment(&call.callee),
        };
        self.with_frame(frame, |v| walk::walk_call_expression(v, call));
    }

    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        let name = match &decl.id {
            BindingPattern::BindingIdentifier(id) => Some(id.name.to_string()),
            _ => None,
        };
        self.with_frame(Frame::Declarator { name }, |v| {
            walk::walk_variable_declarator(v, decl)
        });
    }

    fn visit_block_statement(&mut self, it: &BlockStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_block_statement(v, it));
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_for_statement(v, it));
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_for_in_statement(v, it));
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_for_of_statement(v, it));
    }

    fn visit_while_statement(&mut self, it: &WhileStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_while_statement(v, it));
    }

    fn visit_do_while_statement(&mut self, it: &DoWhileStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| {
            walk::walk_do_while_statement(v, it)
        });
    }

    fn visit_switch_statement(&mut self, it: &SwitchStatement<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_switch_statement(v, it));
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_catch_clause(v, it));
    }

    fn visit_static_block(&mut self, it: &StaticBlock<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_static_block(v, it));
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_class(v, it));
    }

    fn visit_ts_module_block(&mut self, it: &TSModuleBlock<'a>) {
        self.with_frame(Frame::Scope { span: it.span }, |v| walk::walk_ts_module_block(v, it));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHAPES & CHECKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Class beats object method, object method beats generator.
fn function_shape(func: &Function<'_>, owner: Option<MethodOwner>) -> FunctionShape {
    match owner {
        Some(MethodOwner::Class) => FunctionShape::ClassMethod,
        Some(MethodOwner::Object) => FunctionShape::ObjectMethod,
        None if func.generator => FunctionShape::Generator,
        None => match func.r#type {
            FunctionType::FunctionDeclaration | FunctionType::TSDeclareFunction => {
                FunctionShape::Declaration
            }
            FunctionType::FunctionExpression | FunctionType::TSEmptyBodyFunctionExpression => {
                FunctionShape::Expression
            }
        },
    }
}

fn arrow_shape(arrow: &ArrowFunctionExpression<'_>) -> FunctionShape {
    if arrow.expression {
        FunctionShape::ExpressionArrow
    } else {
        FunctionShape::BlockArrow
    }
}

fn function_name(func: &Function<'_>) -> Option<String> {
    func.id.as_ref().map(|id| id.name.to_string())
}

fn check_owner(shape: FunctionShape, span: Span, options: ScanOptions<'_>) -> Result<(), CompilerError> {
    let owner = match shape {
        FunctionShape::ClassMethod => "class",
        FunctionShape::ObjectMethod => "object method",
        FunctionShape::Generator => "generator function",
        FunctionShape::Declaration
        | FunctionShape::Expression
        | FunctionShape::BlockArrow
        | FunctionShape::ExpressionArrow => return Ok(()),
    };
    Err(CompilerError::at_span(
        ErrorKind::UnsupportedOwner,
        &format!("\"{}\" in {} not supported", options.directive, owner),
        options.filename,
        options.source,
        span,
    ))
}

fn check_form(shape: FunctionShape, span: Span, options: ScanOptions<'_>) -> Result<(), CompilerError> {
    match shape {
        FunctionShape::Declaration | FunctionShape::Expression | FunctionShape::BlockArrow => Ok(()),
        FunctionShape::ExpressionArrow
        | FunctionShape::ClassMethod
        | FunctionShape::ObjectMethod
        | FunctionShape::Generator => Err(CompilerError::at_span(
            ErrorKind::UnsupportedForm,
            &format!(
                "{}s must be function declarations or function expressions",
                options.directive_label
            ),
            options.filename,
            options.source,
            span,
        )
        .with_hint("Give arrow functions a block body.")),
    }
}

fn check_shape(shape: FunctionShape, span: Span, options: ScanOptions<'_>) -> Result<(), CompilerError> {
    check_owner(shape, span, options)?;
    check_form(shape, span, options)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn top_level_function(stmt: &Statement<'_>) -> Option<(Span, Placement)> {
    match stmt {
        Statement::FunctionDeclaration(func) => {
            let declared = function_name(func)?;
            Some((func.span, Placement::Declaration { declared }))
        }
        Statement::ExportNamedDeclaration(decl) => match &decl.declaration {
            Some(Declaration::FunctionDeclaration(func)) => {
                let exported = function_name(func)?;
                Some((func.span, Placement::NamedExport { exported }))
            }
            _ => None,
        },
        Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                Some((func.span, Placement::DefaultExport))
            }
            _ => None,
        },
        _ => None,
    }
}

/// `a.b.c(...)` → `a_c`, `createServerFn().handler(...)` → `createServerFn_handler`,
/// `outer(...)` → `outer`.
fn call_fragment(callee: &Expression<'_>) -> Option<String> {
    match callee {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::StaticMemberExpression(member) => Some(member_fragment(
            &member.object,
            Some(member.property.name.to_string()),
        )),
        Expression::ComputedMemberExpression(member) => {
            let property = match &member.expression {
                Expression::Identifier(id) => Some(id.name.to_string()),
                _ => None,
            };
            Some(member_fragment(&member.object, property))
        }
        _ => None,
    }
}

fn member_fragment(object: &Expression<'_>, property: Option<String>) -> String {
    let base = chain_base_identifier(object);
    [base, property]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("_")
}

fn chain_base_identifier(expr: &Expression<'_>) -> Option<String> {
    let mut current = expr;
    loop {
        current = match current {
            Expression::Identifier(id) => return Some(id.name.to_string()),
            Expression::CallExpression(call) => &call.callee,
            Expression::StaticMemberExpression(member) => &member.object,
            Expression::ComputedMemberExpression(member) => &member.object,
            Expression::PrivateFieldExpression(member) => &member.object,
            _ => return None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{module_source_type, parse_module};
    use oxc_allocator::Allocator;

    fn scan(source: &str) -> Result<Vec<DirectiveCandidate>, CompilerError> {
        let allocator = Allocator::default();
        let program = parse_module(&allocator, source, "test.ts", module_source_type()).unwrap();
        scan_module(
            &program,
            ScanOptions {
                directive: "use server",
                directive_label: "Server function",
                source,
                filename: "test.ts",
            },
        )
    }

    #[test]
    fn test_collects_fragments_outermost_first() {
        let found = scan(
            r#"
            export const myServerFn = createServerFn().handler(opts => {
              'use server'
              return opts
            })
            "#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fragments, vec!["myServerFn", "createServerFn_handler"]);
        assert_eq!(found[0].shape, FunctionShape::BlockArrow);
        assert_eq!(found[0].placement, Placement::Expression);
    }

    #[test]
    fn test_records_top_level_placements() {
        let found = scan(
            r#"
            function plain() { 'use server' }
            export function named() { 'use server' }
            export default function fallback() { 'use server' }
            "#,
        )
        .unwrap();
        let placements: Vec<_> = found.iter().map(|c| c.placement.clone()).collect();
        assert_eq!(
            placements,
            vec![
                Placement::Declaration { declared: "plain".to_string() },
                Placement::NamedExport { exported: "named".to_string() },
                Placement::DefaultExport,
            ]
        );
        assert_eq!(
            found.iter().map(|c| c.statement_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_ignores_other_directives() {
        let found = scan("const a = function () { 'use strict'; return 1 }").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_class_precedence_over_generator() {
        let err = scan("class A { *gen() { 'use server' } }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert!(err.message.contains("in class not supported"), "{}", err.message);
    }

    #[test]
    fn test_whole_module_mode_takes_exported_functions() {
        let found = scan(
            r#"
            'use server'
            export function a() { return 1 }
            export default async () => { return 2 }
            function notExported() {}
            export const c = 3
            "#,
        )
        .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].placement, Placement::NamedExport { exported: "a".to_string() });
        assert_eq!(found[1].placement, Placement::Expression);
        assert!(found[1].fragments.is_empty());
    }

    #[test]
    fn test_whole_module_rejects_expression_arrow() {
        let err = scan("'use server'\nexport default () => 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedForm);
    }
}
