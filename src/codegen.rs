//! Codegen module
//!
//! Prints the transformed module back to text with a JSON source map.

use oxc_ast::ast::Program;
use oxc_codegen::{Codegen, CodegenOptions};
use std::path::PathBuf;

pub struct GeneratedModule {
    pub code: String,
    pub map: Option<String>,
}

pub fn generate(program: &Program<'_>, filename: &str, minify: bool) -> GeneratedModule {
    let options = CodegenOptions {
        minify,
        source_map_path: Some(PathBuf::from(filename)),
        ..CodegenOptions::default()
    };
    let ret = Codegen::new().with_options(options).build(program);
    GeneratedModule {
        code: ret.code,
        map: ret.map.map(|map| map.to_json_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{module_source_type, parse_module};
    use oxc_allocator::Allocator;

    #[test]
    fn test_generate_emits_source_map() {
        let allocator = Allocator::default();
        let program =
            parse_module(&allocator, "const a = 1;\nexport { a };", "src/a.ts", module_source_type())
                .unwrap();
        let out = generate(&program, "src/a.ts", false);

        assert!(out.code.contains("const a = 1;"));
        let map = out.map.expect("source map requested");
        let json: serde_json::Value = serde_json::from_str(&map).unwrap();
        assert_eq!(json["version"], 3);
        assert!(json["sources"][0].as_str().unwrap_or_default().contains("a.ts"));
    }

    #[test]
    fn test_generate_minified() {
        let allocator = Allocator::default();
        let source = "const a = 1;\n\nfunction f() {\n  return a;\n}\nexport { f };";
        let program = parse_module(&allocator, source, "a.ts", module_source_type()).unwrap();
        let pretty = generate(&program, "a.ts", false);
        let minified = generate(&program, "a.ts", true);
        assert!(minified.code.len() < pretty.code.len(), "{}", minified.code);
    }
}
