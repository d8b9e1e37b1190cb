//! The language service façade
//!
//! [`KqlLanguageService`] wires every component to one shared
//! [`SchemaStore`] and exposes editor-facing requests over document text and
//! a cursor [`Position`]. Requests never fail: cancellation and internal
//! panics both yield an empty result for that request only.

use crate::completion::{CompletionEngine, CompletionQuery, CompletionResult};
use crate::config::ServiceConfig;
use crate::context::{self, ContextKind};
use crate::diagnostics::DiagnosticsEngine;
use crate::documents::DocumentDiagnostics;
use crate::error::Error;
use crate::format;
use crate::hover::HoverRenderer;
use crate::schema::Schema;
use crate::scope::TableScopeResolver;
use crate::signature::{self, SignatureHelp};
use crate::store::SchemaStore;
use crate::token::extract_token;
use crate::types::{Diagnostic, DiagnosticSet, Position};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Document text split around a cursor
struct Cursor<'a> {
    /// Everything before the cursor, across lines
    before: &'a str,
    /// The full cursor line
    line: &'a str,
    /// The cursor line up to the cursor
    prefix: &'a str,
    /// Cursor column, clamped to the line length
    column: usize,
}

fn locate(text: &str, position: Position) -> Cursor<'_> {
    let mut line_start = 0;
    for _ in 0..position.line {
        match text[line_start..].find('\n') {
            Some(idx) => line_start += idx + 1,
            None => {
                line_start = text.len();
                break;
            }
        }
    }

    let rest = &text[line_start..];
    let line = rest.split('\n').next().unwrap_or_default();
    let line = line.strip_suffix('\r').unwrap_or(line);

    let (prefix_len, column) = match line.char_indices().nth(position.column) {
        Some((byte, _)) => (byte, position.column),
        None => (line.len(), line.chars().count()),
    };

    Cursor {
        before: &text[..line_start + prefix_len],
        line,
        prefix: &line[..prefix_len],
        column,
    }
}

/// Run one request phase, yielding the empty result if `cancel` fires
/// before it starts or while it runs
fn checked<T: Default>(cancel: &CancellationToken, phase: impl FnOnce() -> T) -> T {
    if cancel.is_cancelled() {
        return T::default();
    }
    let value = phase();
    if cancel.is_cancelled() {
        log::debug!("Request cancelled after schema lookup");
        return T::default();
    }
    value
}

/// Schema-driven KQL language service
#[derive(Debug)]
pub struct KqlLanguageService {
    store: Arc<SchemaStore>,
    config: ServiceConfig,
    scope: TableScopeResolver,
    completion: CompletionEngine,
    hover: HoverRenderer,
    diagnostics: DiagnosticsEngine,
    documents: DocumentDiagnostics,
}

impl KqlLanguageService {
    /// Create a service over `store`
    #[must_use]
    pub fn new(store: Arc<SchemaStore>, config: ServiceConfig) -> Self {
        let hover = HoverRenderer::new(Arc::clone(&store), config.hover_example_count);
        Self::with_hover(store, config, hover)
    }

    /// Create a service whose hover example sampling is reproducible
    #[must_use]
    pub fn with_seed(store: Arc<SchemaStore>, config: ServiceConfig, seed: u64) -> Self {
        let hover = HoverRenderer::with_seed(Arc::clone(&store), config.hover_example_count, seed);
        Self::with_hover(store, config, hover)
    }

    /// Create a service over an in-memory schema with default configuration
    #[must_use]
    pub fn with_schema(schema: Schema) -> Self {
        Self::new(Arc::new(SchemaStore::new(schema)), ServiceConfig::default())
    }

    fn with_hover(store: Arc<SchemaStore>, config: ServiceConfig, hover: HoverRenderer) -> Self {
        Self {
            scope: TableScopeResolver::new(Arc::clone(&store)),
            completion: CompletionEngine::new(Arc::clone(&store), config.properties.clone()),
            diagnostics: DiagnosticsEngine::new(Arc::clone(&store), &config),
            documents: DocumentDiagnostics::new(),
            hover,
            store,
            config,
        }
    }

    /// The schema store shared by all components
    #[must_use]
    pub fn store(&self) -> &Arc<SchemaStore> {
        &self.store
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Re-read the schema from its source file
    pub fn reload_schema(&self) {
        self.store.reload();
    }

    /// Classify the cursor context
    #[must_use]
    pub fn context_at(&self, text: &str, position: Position) -> ContextKind {
        self.guarded("context", || context::classify(locate(text, position).prefix))
    }

    /// Completion candidates at `position`
    #[must_use]
    pub fn completions(&self, text: &str, position: Position, cancel: &CancellationToken) -> CompletionResult {
        self.guarded("completion", || {
            checked(cancel, || {
                let cursor = locate(text, position);
                let kind = context::classify(cursor.prefix);
                let scope = if kind == ContextKind::ResourceTypeLiteral {
                    self.scope.resolve(cursor.before)
                } else {
                    None
                };
                log::trace!("Completing in {kind} context (scope {scope:?})");

                let query = CompletionQuery::new(kind)
                    .table_scope(scope)
                    .partial_word(context::partial_word(cursor.prefix, kind))
                    .inside_quotes(context::inside_quotes(cursor.prefix));
                CompletionResult {
                    items: self.completion.complete(query).collect(),
                }
            })
        })
    }

    /// Markdown documentation for the token under `position`
    ///
    /// The name is treated as a call only when `(` follows it directly.
    #[must_use]
    pub fn hover(&self, text: &str, position: Position, cancel: &CancellationToken) -> Option<String> {
        self.guarded("hover", || {
            checked(cancel, || {
                let cursor = locate(text, position);
                let token = extract_token(cursor.line, cursor.column)?;
                let after: String = cursor.line.chars().skip(token.end).collect();
                self.hover.hover(&token.text, &after)
            })
        })
    }

    /// Signature of the call enclosing `position`
    #[must_use]
    pub fn signature_help(&self, text: &str, position: Position, cancel: &CancellationToken) -> Option<SignatureHelp> {
        self.guarded("signature help", || {
            checked(cancel, || {
                let cursor = locate(text, position);
                signature::signature_help(&self.store.snapshot(), cursor.before)
            })
        })
    }

    /// Scan `text` for diagnostics
    #[must_use]
    pub fn diagnostics(&self, text: &str, cancel: &CancellationToken) -> Vec<Diagnostic> {
        self.guarded("diagnostics", || {
            checked(cancel, || {
                self.diagnostics
                    .scan_cancellable(text, cancel)
                    .unwrap_or_default()
            })
        })
    }

    /// Recompute diagnostics for an opened or changed document
    ///
    /// Returns the published set, or `None` when this version was superseded
    /// by a newer one before the scan finished.
    pub fn update_document(&self, uri: &str, version: i32, text: &str) -> Option<DiagnosticSet> {
        self.guarded("document diagnostics", || {
            let ticket = self.documents.begin(uri, version)?;
            let diagnostics = self
                .diagnostics
                .scan_cancellable(text, ticket.cancellation())?;
            if !self.documents.publish(&ticket, diagnostics) {
                return None;
            }
            self.documents.get(uri)
        })
    }

    /// The last published diagnostic set of `uri`
    #[must_use]
    pub fn document_diagnostics(&self, uri: &str) -> Option<DiagnosticSet> {
        self.documents.get(uri)
    }

    /// Forget a closed document
    pub fn close_document(&self, uri: &str) {
        self.documents.close(uri);
    }

    /// Put each top-level pipe of `text` on its own line
    #[must_use]
    pub fn align_pipes(&self, text: &str) -> String {
        let fallback = text.to_string();
        let formatted = self.guarded("format", || Some(format::align_pipes(text)));
        formatted.unwrap_or(fallback)
    }

    fn guarded<T: Default>(&self, request: &str, f: impl FnOnce() -> T) -> T {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => value,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                let err = Error::Internal {
                    message: format!("{request} request panicked: {message}"),
                };
                log::error!("{err}");
                T::default()
            }
        }
    }
}
