//! Compiler errors for directive extraction.
//!
//! Every rejection carries a stable code, the file it came from, a 1-based
//! line/column and, when the offending construct has a location, a rendered
//! code frame with a caret span under it.

use oxc_span::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNSUPPORTED_OWNER: &str = "DIR-ERR-OWNER";
pub const ERR_ILLEGAL_NESTING: &str = "DIR-ERR-NESTING";
pub const ERR_UNSUPPORTED_FORM: &str = "DIR-ERR-FORM";
pub const ERR_SYNTAX: &str = "DIR-ERR-SYNTAX";
pub const ERR_INVALID_TEMPLATE: &str = "DIR-ERR-TEMPLATE";
pub const ERR_INTERNAL: &str = "DIR-ERR-INTERNAL";

const LINES_ABOVE: usize = 2;
const LINES_BELOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Marker inside a generator, class method or object method.
    UnsupportedOwner,
    /// Marked function is not at module top level.
    IllegalNesting,
    /// Marked function is not a declaration, expression or block-bodied arrow.
    UnsupportedForm,
    /// The module itself does not parse.
    Syntax,
    /// Replacement or runtime text produced by a hook does not parse.
    InvalidTemplate,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedOwner => ERR_UNSUPPORTED_OWNER,
            ErrorKind::IllegalNesting => ERR_ILLEGAL_NESTING,
            ErrorKind::UnsupportedForm => ERR_UNSUPPORTED_FORM,
            ErrorKind::Syntax => ERR_SYNTAX,
            ErrorKind::InvalidTemplate => ERR_INVALID_TEMPLATE,
            ErrorKind::Internal => ERR_INTERNAL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{rendered}")]
pub struct CompilerError {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Code frame around the offending construct.
    pub context: Option<String>,
    pub hints: Vec<String>,
    rendered: String,
}

impl CompilerError {
    /// An error pointing at `span` inside `source`.
    pub fn at_span(kind: ErrorKind, message: &str, file: &str, source: &str, span: Span) -> Self {
        if span.is_empty() && span.start == 0 {
            return Self::unlocated(kind, message, file);
        }
        let location = line_column(source, span.start);
        let frame = code_frame(source, span, message);
        CompilerError {
            code: kind.code().to_string(),
            kind,
            message: message.to_string(),
            file: file.to_string(),
            line: location.line,
            column: location.column,
            rendered: format!("{}\n{}", file, frame),
            context: Some(frame),
            hints: vec![],
        }
    }

    pub fn unlocated(kind: ErrorKind, message: &str, file: &str) -> Self {
        CompilerError {
            code: kind.code().to_string(),
            kind,
            message: message.to_string(),
            file: file.to_string(),
            line: 0,
            column: 0,
            context: None,
            hints: vec![],
            rendered: format!("{} at unknown location", message),
        }
    }

    pub fn internal(message: &str, file: &str) -> Self {
        Self::unlocated(ErrorKind::Internal, message, file)
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hints.push(hint.to_string());
        self
    }

    pub fn has_location(&self) -> bool {
        self.context.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS & CODE FRAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// 1-based line and column (in characters) of a byte offset.
pub fn line_column(source: &str, offset: u32) -> SourceLocation {
    let before = prefix_at(source, offset);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    SourceLocation {
        line: line as u32,
        column: column as u32,
    }
}

fn prefix_at(source: &str, offset: u32) -> &str {
    let mut end = (offset as usize).min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    &source[..end]
}

/// Renders the lines around `span` with a `>` gutter on the marked lines and
/// carets under the marked columns. The message follows the first caret run.
pub fn code_frame(source: &str, span: Span, message: &str) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let start = line_column(source, span.start);
    let end = line_column(source, span.end.max(span.start));

    let start_line = start.line as usize;
    let end_line = (end.line as usize).max(start_line);
    let first = start_line.saturating_sub(LINES_ABOVE).max(1);
    let last = (end_line + LINES_BELOW).min(lines.len());
    let gutter_width = last.to_string().len();

    let mut frame = Vec::new();
    for number in first..=last {
        let text = lines[number - 1].trim_end_matches('\r');
        let gutter = format!("{:>width$}", number, width = gutter_width);
        if number < start_line || number > end_line {
            frame.push(format!("  {} | {}", gutter, text).trim_end().to_string());
            continue;
        }

        frame.push(format!("> {} | {}", gutter, text).trim_end().to_string());

        let line_len = text.chars().count();
        let from = if number == start_line {
            start.column as usize - 1
        } else {
            0
        };
        let to = if number == end_line {
            end.column as usize - 1
        } else {
            line_len
        };
        let indent: String = text
            .chars()
            .take(from)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let mut marker = format!(
            "  {} | {}{}",
            " ".repeat(gutter_width),
            indent,
            "^".repeat(to.saturating_sub(from).max(1))
        );
        if number == start_line && !message.is_empty() {
            marker.push(' ');
            marker.push_str(message);
        }
        frame.push(marker);
    }

    frame.join("\n")
}
