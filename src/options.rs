//! Compile options for directive extraction.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPLIT_PARAM_PREFIX: &str = "tsr-directive-";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct DirectiveConfig {
    /// Sentinel literal, e.g. `use server`.
    pub directive: String,
    /// Human label used in error messages, e.g. `Server function`.
    pub directive_label: String,
    #[serde(default = "default_split_param_prefix")]
    pub split_param_prefix: String,
    #[serde(default = "minify_from_env")]
    pub minify: bool,
}

fn default_split_param_prefix() -> String {
    DEFAULT_SPLIT_PARAM_PREFIX.to_string()
}

/// Production builds minify unless told otherwise. Read once, when the
/// configuration is built.
pub fn minify_from_env() -> bool {
    std::env::var("NODE_ENV").map_or(false, |env| env == "production")
}

impl DirectiveConfig {
    pub fn new(directive: &str, directive_label: &str) -> Self {
        DirectiveConfig {
            directive: directive.to_string(),
            directive_label: directive_label.to_string(),
            split_param_prefix: default_split_param_prefix(),
            minify: minify_from_env(),
        }
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileDirectivesOptions {
    pub code: String,
    pub filename: String,
    #[serde(default)]
    pub root: String,
    #[serde(flatten)]
    pub config: DirectiveConfig,
}

impl CompileDirectivesOptions {
    pub fn new(code: &str, filename: &str, root: &str, config: DirectiveConfig) -> Self {
        CompileDirectivesOptions {
            code: code.to_string(),
            filename: filename.to_string(),
            root: root.to_string(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_deserialize_camel_case_with_defaults() {
        let json = serde_json::json!({
            "code": "const a = 1",
            "filename": "src/a.ts",
            "directive": "use server",
            "directiveLabel": "Server function",
            "minify": false
        });
        let opts: CompileDirectivesOptions = serde_json::from_value(json).unwrap();
        assert_eq!(opts.root, "");
        assert_eq!(opts.config.directive, "use server");
        assert_eq!(opts.config.directive_label, "Server function");
        assert_eq!(opts.config.split_param_prefix, DEFAULT_SPLIT_PARAM_PREFIX);
        assert!(!opts.config.minify);
    }
}
