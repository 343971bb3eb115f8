//! Module-scope dead-code elimination.
//!
//! Removes top-level bindings nothing refers to, repeating until a pass removes
//! nothing: variable declarators with identifier patterns, function and class
//! declarations, and import specifiers. Exported declarations always survive,
//! as do the names in `retain`. A function or class referring to itself does
//! not keep itself alive.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use std::collections::{HashMap, HashSet};

use crate::scope::root_reference_counts;

pub fn eliminate_dead_code<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    retain: &HashSet<String>,
) -> usize {
    let mut removed = 0;
    loop {
        let usage = ModuleUsage::collect(program, retain);
        let swept = sweep(allocator, program, &usage);
        if swept == 0 {
            break;
        }
        tracing::debug!(swept, "removed unreferenced bindings");
        removed += swept;
    }
    removed
}

struct ModuleUsage<'r> {
    references: HashMap<String, usize>,
    retain: &'r HashSet<String>,
}

impl<'r> ModuleUsage<'r> {
    fn collect(program: &Program<'_>, retain: &'r HashSet<String>) -> Self {
        Self {
            references: root_reference_counts(program),
            retain,
        }
    }

    /// Unknown names count as used.
    fn is_dead(&self, name: &str) -> bool {
        !self.retain.contains(name) && self.references.get(name).is_some_and(|count| *count == 0)
    }

    fn is_dead_binding(&self, id: Option<&BindingIdentifier<'_>>) -> bool {
        id.is_some_and(|id| self.is_dead(id.name.as_str()))
    }
}

fn sweep<'a>(allocator: &'a Allocator, program: &mut Program<'a>, usage: &ModuleUsage<'_>) -> usize {
    let body = std::mem::replace(&mut program.body, AstBuilder::new(allocator).vec());
    let mut removed = 0;

    for mut stmt in body {
        let keep = match &mut stmt {
            Statement::VariableDeclaration(decl) => {
                let before = decl.declarations.len();
                decl.declarations.retain(|d| match &d.id {
                    BindingPattern::BindingIdentifier(id) => !usage.is_dead(id.name.as_str()),
                    _ => true,
                });
                removed += before - decl.declarations.len();
                !decl.declarations.is_empty()
            }
            Statement::FunctionDeclaration(func) => !usage.is_dead_binding(func.id.as_ref()),
            Statement::ClassDeclaration(class) => !usage.is_dead_binding(class.id.as_ref()),
            // `import {} from "x"` and side-effect imports have nothing to lose.
            Statement::ImportDeclaration(decl) => match &mut decl.specifiers {
                Some(specifiers) if !specifiers.is_empty() => {
                    let before = specifiers.len();
                    specifiers.retain(|s| !usage.is_dead(import_local_name(s)));
                    removed += before - specifiers.len();
                    !specifiers.is_empty()
                }
                _ => true,
            },
            _ => true,
        };

        if keep {
            program.body.push(stmt);
        } else if matches!(
            stmt,
            Statement::FunctionDeclaration(_) | Statement::ClassDeclaration(_)
        ) {
            removed += 1;
        }
    }

    removed
}

fn import_local_name<'s>(specifier: &'s ImportDeclarationSpecifier<'_>) -> &'s str {
    match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => s.local.name.as_str(),
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => s.local.name.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{module_source_type, parse_module};
    use oxc_codegen::Codegen;

    fn eliminate(source: &str, retain: &[&str]) -> String {
        let allocator = Allocator::default();
        let mut program = parse_module(&allocator, source, "t.ts", module_source_type()).unwrap();
        let retain: HashSet<String> = retain.iter().map(|s| s.to_string()).collect();
        eliminate_dead_code(&allocator, &mut program, &retain);
        Codegen::new()
            .build(&program)
            .code
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_removes_unreferenced_bindings_until_stable() {
        let code = eliminate(
            r#"
            import { helper, unused } from "lib";
            const inner = () => helper();
            const outer = () => inner();
            export const kept = 1;
            "#,
            &[],
        );
        assert_eq!(code, "export const kept = 1;");
    }

    #[test]
    fn test_self_recursion_does_not_keep_function_alive() {
        let code = eliminate("function loop(n) { return n ? loop(n - 1) : 0 }\nexport {}", &[]);
        assert!(!code.contains("loop"), "{}", code);
    }

    #[test]
    fn test_exported_and_retained_bindings_survive() {
        let code = eliminate(
            r#"
            const hoisted = register("id");
            function used() { return 1 }
            export function api() { return used() }
            "#,
            &["hoisted"],
        );
        assert!(code.contains("const hoisted = register(\"id\");"), "{}", code);
        assert!(code.contains("function used()"));
        assert!(code.contains("export function api()"));
    }

    #[test]
    fn test_side_effect_imports_are_kept() {
        let code = eliminate("import \"./polyfill\";\nimport {} from \"./empty\";", &[]);
        assert!(code.contains("import \"./polyfill\";"), "{}", code);
        assert!(code.contains("./empty"), "{}", code);
    }

    #[test]
    fn test_shadowed_name_inside_body_keeps_declaration_alive() {
        let code = eliminate("function a() { return [1].map((a) => a) }\nexport const x = a;", &[]);
        assert!(code.contains("function a()"), "declaration of `a` removed while referenced:\n{}", code);
        assert!(code.ends_with("export const x = a;"), "{}", code);

        let code = eliminate("class C { m(C) { return C } }\nexport default C;", &[]);
        assert!(code.contains("class C"), "{}", code);
    }
}
