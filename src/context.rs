//! Classifying the syntactic context at the cursor
//!
//! Classification only looks at the text preceding the cursor on the current
//! line. Several patterns overlap (an empty line is both "start of statement"
//! and a potential pipe continuation), so the checks run in a fixed order and
//! the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static START_OF_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\s*|\s*//.*|[A-Za-z_]\w*)$").expect("valid regex"));

static ORDER_BY_EXPECTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:sort|order)\s+\w*$").expect("valid regex"));

static AFTER_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\s*[\w-]*$").expect("valid regex"));

static RESOURCE_TYPE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btype\s*(?:==|=~)\s*['"]?([\w./-]*)$"#).expect("valid regex")
});

static PROPERTY_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:project|project-keep|project-away|project-rename|project-reorder|extend|summarize|distinct|by)\s+(?:[\w.]+\s*,\s*)*[\w.]*$|[,\s]\s*[\w.]*$)",
    )
    .expect("valid regex")
});

static FUNCTION_ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\w\s*\(\s*[\w.]*|=\s*[\w.]*)$").expect("valid regex"));

static TRAILING_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w-]*$").expect("valid regex"));

/// What kind of token is expected at the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ContextKind {
    /// Empty line, comment, or a bare identifier at column 0
    StartOfStatement,
    /// After `sort`/`order`, where `by` is the natural continuation
    OrderByExpected,
    /// Right after a `|`
    AfterPipe,
    /// Inside `type == '...'`
    ResourceTypeLiteral,
    /// A projection/grouping list or a comma/space separated position
    PropertyList,
    /// Inside a call or after an assignment
    FunctionArgument,
    /// Nothing more specific applies
    #[default]
    Default,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StartOfStatement => "StartOfStatement",
            Self::OrderByExpected => "OrderByExpected",
            Self::AfterPipe => "AfterPipe",
            Self::ResourceTypeLiteral => "ResourceTypeLiteral",
            Self::PropertyList => "PropertyList",
            Self::FunctionArgument => "FunctionArgument",
            Self::Default => "Default",
        };
        f.write_str(name)
    }
}

/// Classify the text preceding the cursor on its line
#[must_use]
pub fn classify(line_prefix: &str) -> ContextKind {
    let kind = if START_OF_STATEMENT.is_match(line_prefix) {
        ContextKind::StartOfStatement
    } else if ORDER_BY_EXPECTED.is_match(line_prefix) {
        ContextKind::OrderByExpected
    } else if AFTER_PIPE.is_match(line_prefix) {
        ContextKind::AfterPipe
    } else if RESOURCE_TYPE_LITERAL.is_match(line_prefix) {
        ContextKind::ResourceTypeLiteral
    } else if PROPERTY_LIST.is_match(line_prefix) {
        ContextKind::PropertyList
    } else if FUNCTION_ARGUMENT.is_match(line_prefix) {
        ContextKind::FunctionArgument
    } else {
        ContextKind::Default
    };
    log::trace!("Classified {line_prefix:?} as {kind}");
    kind
}

/// The partially typed word the completion should filter on
///
/// Inside a resource type literal this is the literal's content so far
/// (which may contain `.` and `/`); elsewhere it is the trailing identifier.
#[must_use]
pub fn partial_word(line_prefix: &str, kind: ContextKind) -> &str {
    if kind == ContextKind::ResourceTypeLiteral {
        if let Some(m) = RESOURCE_TYPE_LITERAL
            .captures(line_prefix)
            .and_then(|c| c.get(1))
        {
            return m.as_str();
        }
    }
    TRAILING_WORD
        .find(line_prefix)
        .map_or("", |m| m.as_str())
}

/// Whether the cursor is inside an open string literal
///
/// Tracks the quote character that opened the current literal, so an
/// apostrophe inside a double-quoted string does not count.
#[must_use]
pub fn inside_quotes(line_prefix: &str) -> bool {
    let mut open: Option<char> = None;
    let mut escaped = false;
    for c in line_prefix.chars() {
        match open {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => open = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => open = Some(c),
            None => {}
        }
    }
    open.is_some()
}
