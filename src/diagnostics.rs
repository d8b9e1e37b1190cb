//! Whole-document diagnostics
//!
//! Each scan recomputes every diagnostic from scratch:
//!
//! - a bare identifier starting a statement must name a known table
//! - the word after every `|` must be a known operator or keyword
//! - a pipe in the middle of a line gets an informational style hint
//!
//! Unknown names come with spelling suggestions. A catalog segment that is
//! empty (for example because the schema failed to load) accepts everything.

use crate::config::ServiceConfig;
use crate::schema::Schema;
use crate::store::SchemaStore;
use crate::suggest::suggest;
use crate::token::mask_literals;
use crate::types::{Diagnostic, DiagnosticSeverity, Range};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

static STATEMENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)(?:\s|\||$)").expect("valid regex"));

static PIPED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*([A-Za-z_][\w-]*)").expect("valid regex"));

/// Diagnostic code for unknown tables
pub const UNKNOWN_TABLE: &str = "unknown-table";
/// Diagnostic code for unknown operators
pub const UNKNOWN_OPERATOR: &str = "unknown-operator";
/// Diagnostic code for the one-pipe-per-line hint
pub const PIPE_STYLE: &str = "pipe-style";

/// Scans documents for unknown names and style issues
#[derive(Debug, Clone)]
pub struct DiagnosticsEngine {
    store: Arc<SchemaStore>,
    max_suggestions: usize,
    similarity_threshold: f64,
    pipe_style_hints: bool,
}

impl DiagnosticsEngine {
    /// Create an engine reading from `store`
    #[must_use]
    pub fn new(store: Arc<SchemaStore>, config: &ServiceConfig) -> Self {
        Self {
            store,
            max_suggestions: config.max_suggestions,
            similarity_threshold: config.similarity_threshold,
            pipe_style_hints: config.pipe_style_hints,
        }
    }

    /// Scan `text` and return its diagnostics in document order
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<Diagnostic> {
        self.scan_cancellable(text, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// Scan `text`, giving up with `None` as soon as `cancel` fires
    #[must_use]
    pub fn scan_cancellable(&self, text: &str, cancel: &CancellationToken) -> Option<Vec<Diagnostic>> {
        let schema = self.store.snapshot();
        let operator_names: Vec<&str> = schema
            .operators
            .iter()
            .map(|o| o.name.as_str())
            .chain(schema.keywords.iter().map(|k| k.name.as_str()))
            .collect();

        let mut diagnostics = Vec::new();
        for (line_no, raw_line) in text.lines().enumerate() {
            if cancel.is_cancelled() {
                log::debug!("Diagnostics scan cancelled at line {line_no}");
                return None;
            }

            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let line = mask_literals(raw_line);

            if !schema.tables.is_empty() {
                if let Some(d) = self.check_statement_start(&schema, &line, line_no) {
                    diagnostics.push(d);
                }
            }

            if !operator_names.is_empty() {
                for caps in PIPED_WORD.captures_iter(&line) {
                    let Some(word) = caps.get(1) else { continue };
                    if operator_names
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(word.as_str()))
                    {
                        continue;
                    }
                    diagnostics.push(self.unknown_name(
                        "operator",
                        UNKNOWN_OPERATOR,
                        word.as_str(),
                        range_of(&line, line_no, word.start(), word.end()),
                        operator_names.iter().copied(),
                    ));
                }
            }

            if self.pipe_style_hints && !trimmed.starts_with('|') {
                if let Some(idx) = line.find('|') {
                    diagnostics.push(Diagnostic {
                        range: range_of(&line, line_no, idx, idx + 1),
                        message: "Consider starting each piped operator on its own line"
                            .to_string(),
                        severity: DiagnosticSeverity::Information,
                        code: Some(PIPE_STYLE.to_string()),
                        suggestions: Vec::new(),
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            log::debug!("Diagnostics scan cancelled after the last line");
            return None;
        }
        diagnostics.sort_by_key(|d| d.range.start);
        Some(diagnostics)
    }

    fn check_statement_start(&self, schema: &Schema, line: &str, line_no: usize) -> Option<Diagnostic> {
        let ident = STATEMENT_START.captures(line)?.get(1)?;
        let name = ident.as_str();

        // Statement keywords such as `let` or `print` are not table references
        if schema.find_table(name).is_some()
            || schema.find_keyword(name).is_some()
            || schema.find_operator(name).is_some()
            || schema.find_function(name).is_some()
        {
            return None;
        }

        Some(self.unknown_name(
            "table",
            UNKNOWN_TABLE,
            name,
            range_of(line, line_no, ident.start(), ident.end()),
            schema.tables.values().map(|t| t.name.as_str()),
        ))
    }

    fn unknown_name<'a>(
        &self,
        what: &str,
        code: &str,
        name: &str,
        range: Range,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Diagnostic {
        let suggestions = suggest(
            name,
            candidates,
            self.max_suggestions,
            self.similarity_threshold,
        );
        let message = if suggestions.is_empty() {
            format!("Unknown {what} '{name}'")
        } else {
            let quoted: Vec<String> = suggestions.iter().map(|s| format!("'{s}'")).collect();
            format!("Unknown {what} '{name}'. Did you mean {}?", quoted.join(", "))
        };
        Diagnostic {
            range,
            message,
            severity: DiagnosticSeverity::Warning,
            code: Some(code.to_string()),
            suggestions,
        }
    }
}

fn range_of(line: &str, line_no: usize, start_byte: usize, end_byte: usize) -> Range {
    let start = line[..start_byte].chars().count();
    let end = start + line[start_byte..end_byte].chars().count();
    Range::on_line(line_no, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Entry, Keyword, Table};
    use crate::types::Position;

    fn engine(schema: Schema) -> DiagnosticsEngine {
        DiagnosticsEngine::new(Arc::new(SchemaStore::new(schema)), &ServiceConfig::default())
    }

    fn schema() -> Schema {
        Schema::new()
            .table(Table::new("Resources").example("Resources | limit 1"))
            .table(Table::new("ResourceContainers"))
            .operator(Entry::new("where", "Filter"))
            .operator(Entry::new("project", "Projection"))
            .operator(Entry::new("mv-expand", "Expansion"))
            .keyword(Keyword::new("let", "Statement"))
    }

    #[test]
    fn test_misspelled_operator() {
        let diagnostics = engine(schema()).scan("Resources\n| wher x == 1");

        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.severity, DiagnosticSeverity::Warning);
        assert_eq!(d.range, Range::on_line(1, 2, 6));
        assert_eq!(d.suggestions, vec!["where".to_string()]);
        assert_eq!(d.code.as_deref(), Some(UNKNOWN_OPERATOR));
    }

    #[test]
    fn test_unknown_table_with_suggestions() {
        let diagnostics = engine(schema()).scan("Resourcess\n| project name");

        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.range, Range::on_line(0, 0, 10));
        assert_eq!(d.suggestions[0], "Resources");
        assert!(d.suggestions.len() <= 3);
        assert!(d.message.contains("'Resourcess'"));
    }

    #[test]
    fn test_known_names_and_hyphenated_operators() {
        let text = "// comment\n\nresources\n| mv-expand tags\n| where name == 'a|b'";
        assert!(engine(schema()).scan(text).is_empty());
    }

    #[test]
    fn test_statement_keywords_are_not_tables() {
        assert!(engine(schema()).scan("let x = 1;").is_empty());
    }

    #[test]
    fn test_inline_pipe_style_hint() {
        let diagnostics = engine(schema()).scan("Resources | where name == 'x'");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Information);
        assert_eq!(diagnostics[0].range.start, Position::new(0, 10));
    }

    #[test]
    fn test_pipe_style_hint_can_be_disabled() {
        let engine = DiagnosticsEngine::new(
            Arc::new(SchemaStore::new(schema())),
            &ServiceConfig::default().pipe_style_hints(false),
        );
        assert!(engine.scan("Resources | where name == 'x'").is_empty());
    }

    #[test]
    fn test_diagnostics_in_document_order() {
        let diagnostics = engine(schema()).scan("Foo | wher x");
        let starts: Vec<_> = diagnostics.iter().map(|d| d.range.start.column).collect();
        assert_eq!(starts, vec![0, 4, 6]);
    }

    #[test]
    fn test_empty_schema_accepts_everything() {
        let diagnostics = engine(Schema::new()).scan("Anything\n| whatever");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cancelled_scan_returns_none() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(engine(schema())
            .scan_cancellable("Resources", &cancel)
            .is_none());
    }
}
