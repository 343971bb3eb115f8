//! Cross-pass identity: function ids, extracted virtual paths and chunk names.
//!
//! The origin pass and the target pass see different filenames (the target
//! carries the split query key), so everything here is computed from the base
//! path with its query stripped.

use regex::Regex;

use crate::options::DirectiveConfig;

lazy_static::lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-zA-Z0-9]").unwrap();
    static ref NON_ID_CHAR: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    static ref NON_CHUNK_CHAR: Regex = Regex::new(r"[^a-zA-Z0-9_]").unwrap();
    static ref UNDERSCORE_RUN: Regex = Regex::new(r"_{2,}").unwrap();
}

/// Query key marking the extraction target, e.g. `tsr-directive-use-server`.
pub fn split_param(config: &DirectiveConfig) -> String {
    format!(
        "{}{}",
        config.split_param_prefix,
        NON_ALPHANUMERIC.replace_all(&config.directive, "-")
    )
}

pub fn is_target_pass(filename: &str, split_param: &str) -> bool {
    filename.contains(split_param)
}

pub fn base_filename(filename: &str) -> &str {
    filename.split('?').next().unwrap_or(filename)
}

/// `base?<existing pairs>&<key>=`. Existing pairs keep their order; a previous
/// value for `key` is cleared in place.
pub fn extracted_filename(filename: &str, split_param: &str) -> String {
    let mut parts = filename.split('?');
    let base = parts.next().unwrap_or(filename);
    let query = parts.collect::<Vec<_>>().join("&");

    let mut pairs: Vec<(String, String)> = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        pairs.push((key.to_string(), value.to_string()));
    }

    match pairs.iter().position(|(key, _)| key == split_param) {
        Some(first) => {
            pairs[first].1.clear();
            let mut index = 0;
            pairs.retain(|(key, _)| {
                let keep = index <= first || key != split_param;
                index += 1;
                keep
            });
        }
        None => pairs.push((split_param.to_string(), String::new())),
    }

    let query = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, query)
}

/// Stable id shared by both passes: `<root-relative base>--<function name>`,
/// made URL safe.
pub fn function_id(base_filename: &str, root: &str, function_name: &str) -> String {
    let raw = format!("{}--{}", base_filename, function_name).replacen(root, "", 1);
    make_file_location_url_safe(&raw)
}

pub fn chunk_name(extracted_filename: &str, root: &str) -> String {
    let relative = extracted_filename.replacen(root, "", 1);
    NON_CHUNK_CHAR.replace_all(&relative, "_").into_owned()
}

fn make_file_location_url_safe(location: &str) -> String {
    let safe = NON_ID_CHAR.replace_all(location, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&safe, "_");
    let trimmed = trim_one(&collapsed, '_');
    trimmed.replace("_--", "--")
}

/// Drops at most one leading and one trailing `ch`.
pub(crate) fn trim_one(text: &str, ch: char) -> &str {
    let text = text.strip_prefix(ch).unwrap_or(text);
    text.strip_suffix(ch).unwrap_or(text)
}
