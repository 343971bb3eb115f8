//! Rejection tests for unsupported directive placements.
//!
//! Every rejection must fire in both passes, before any output is produced,
//! and point at the offending construct with a code frame.

#[cfg(test)]
mod tests {
    use crate::{
        compile_directives, CompileDirectivesOptions, CompilerError, DirectiveConfig, ErrorKind,
        ReplacerArgs,
    };

    const PASSES: [&str; 2] = ["test.ts", "test.ts?tsr-directive-use-server="];

    fn replacer(args: &ReplacerArgs) -> String {
        format!("createServerRpc({:?}, {})", args.function_id, args.fn_placeholder)
    }

    fn reject_in(code: &str, filename: &str) -> CompilerError {
        let config = DirectiveConfig::new("use server", "Server Function").with_minify(false);
        let opts = CompileDirectivesOptions::new(code, filename, "", config);
        match compile_directives(&opts, &replacer, None) {
            Ok(result) => panic!("expected rejection for {}, got:\n{}", filename, result.code),
            Err(err) => err,
        }
    }

    /// Rejects identically in both passes.
    fn reject(code: &str) -> CompilerError {
        let origin = reject_in(code, PASSES[0]);
        let target = reject_in(code, PASSES[1]);
        assert_eq!(origin.kind, target.kind);
        assert_eq!(origin.message, target.message);
        assert_eq!((origin.line, origin.column), (target.line, target.column));
        origin
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // UNSUPPORTED OWNER
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_class_method_rejected() {
        let err = reject(
            r#"
class TestClass {
  method() {
    'use server'
    return 'hello'
  }

  static staticMethod() {
    'use server'
    return 'hello'
  }
}
"#,
        );
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert_eq!(err.message, "\"use server\" in class not supported");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_object_method_rejected() {
        let err = reject(
            r#"
const obj = {
  method() {
    'use server'
    return 'hello'
  },
}
"#,
        );
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert_eq!(err.message, "\"use server\" in object method not supported");
    }

    #[test]
    fn test_object_getter_rejected() {
        let err = reject("const obj = {\n  get value() {\n    'use server'\n    return 1\n  },\n}");
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert!(err.message.contains("object method"));
    }

    #[test]
    fn test_generator_rejected() {
        let err = reject(
            r#"
export const generator = function* () {
  'use server'
  yield 'hello'
}
"#,
        );
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert_eq!(err.message, "\"use server\" in generator function not supported");
    }

    #[test]
    fn test_async_generator_rejected() {
        let err = reject(
            r#"
export async function* asyncGenerator() {
  'use server'
  yield 'hello'
}
"#,
        );
        assert_eq!(err.kind, ErrorKind::UnsupportedOwner);
        assert!(err.message.contains("generator function"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ILLEGAL NESTING
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_in_function_argument_rejected() {
        let err = reject(
            r#"
export const outer = createServerFn(function () {
  'use server'
  return inner(function () {
    'use server'
    return 'hello'
  })
})
"#,
        );
        assert_eq!(err.kind, ErrorKind::IllegalNesting);
        assert_eq!(err.message, "Server Functions cannot be nested in other blocks or functions");
        // Points at the enclosing function, not the nested one.
        assert_eq!((err.line, err.column), (2, 37));
        assert!(!err.hints.is_empty());
    }

    #[test]
    fn test_nested_in_block_rejected() {
        let err = reject(
            r#"
if (enabled) {
  register(function () {
    'use server'
  })
}
"#,
        );
        assert_eq!(err.kind, ErrorKind::IllegalNesting);
        assert_eq!((err.line, err.column), (2, 14));
    }

    #[test]
    fn test_nested_in_loop_rejected() {
        let err = reject("for (const id of ids) register(() => {\n  'use server'\n})");
        assert_eq!(err.kind, ErrorKind::IllegalNesting);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn test_class_field_arrow_rejected_as_nesting() {
        let err = reject("class A {\n  handler = () => {\n    'use server'\n  }\n}");
        assert_eq!(err.kind, ErrorKind::IllegalNesting);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // UNSUPPORTED FORM & OTHER FAILURES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_module_directive_rejects_expression_arrow_export() {
        let err = reject("'use server'\nexport default (id) => lookup(id)");
        assert_eq!(err.kind, ErrorKind::UnsupportedForm);
        assert_eq!(
            err.message,
            "Server Functions must be function declarations or function expressions"
        );
    }

    #[test]
    fn test_rejection_has_code_frame() {
        let err = reject("const obj = {\n  method() {\n    'use server'\n  },\n}");
        let frame = err.context.clone().unwrap_or_default();
        assert!(frame.contains("> 2 |   method() {"), "{}", frame);
        assert!(frame.contains("^"), "{}", frame);
        assert!(err.to_string().starts_with("test.ts"), "{}", err);
        assert_eq!(err.code, "DIR-ERR-OWNER");
    }

    #[test]
    fn test_syntax_error_rejected() {
        let err = reject("export const = ;");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.to_string().ends_with("at unknown location"), "{}", err);
    }

    #[test]
    fn test_invalid_replacement_rejected() {
        let config = DirectiveConfig::new("use server", "Server Function").with_minify(false);
        let opts = CompileDirectivesOptions::new(
            "export const a = run(function () {\n  'use server'\n})",
            "test.ts",
            "",
            config,
        );
        let broken = |_: &ReplacerArgs| "createRpc(".to_string();
        let err = compile_directives(&opts, &broken, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTemplate);
    }

    #[test]
    fn test_unmarked_methods_are_fine() {
        let config = DirectiveConfig::new("use server", "Server Function").with_minify(false);
        let source = "export class A { m() { 'use strict'; return 1 } }\nexport function* g() {}";
        let opts = CompileDirectivesOptions::new(source, "test.ts", "", config);
        let result = compile_directives(&opts, &replacer, None).unwrap();
        assert!(result.directive_fns.is_empty());
        assert!(result.code.contains("class A"));
    }
}
