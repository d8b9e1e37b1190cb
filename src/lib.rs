//! KQL Language Service
//!
//! Schema-driven editor intelligence for KQL / Azure Resource Graph queries.
//! Everything is derived from a static JSON catalog of tables, operators,
//! functions, resource types and keywords; there is no parser, only
//! line-oriented heuristics over the text before the cursor.
//!
//! ## Features
//!
//! - **Completions**: context-aware candidates, resource types scoped to the
//!   governing table
//! - **Hover**: markdown documentation with session-stable table examples
//! - **Diagnostics**: unknown tables and operators with spelling suggestions
//! - **Signature help**: the call enclosing the cursor and its active argument
//! - **Formatting**: one pipe per line
//!
//! ## Usage
//!
//! ```no_run
//! use kql_language_service::{KqlLanguageService, Position, SchemaStore, ServiceConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(SchemaStore::discover());
//! let service = KqlLanguageService::new(store, ServiceConfig::default());
//! let cancel = CancellationToken::new();
//!
//! let text = "Resources\n| wh";
//! for item in service.completions(text, Position::new(1, 4), &cancel).items {
//!     println!("{} ({})", item.label, item.detail);
//! }
//! for diagnostic in service.diagnostics(text, &cancel) {
//!     println!("{}: {}", diagnostic.range.start, diagnostic.message);
//! }
//! ```
//!
//! ## Schema catalog
//!
//! The catalog is looked up in this order:
//!
//! 1. The path in the `KQL_SCHEMA_PATH` environment variable
//! 2. `resources/schema.json` next to the executable
//! 3. `resources/schema.json` in the crate directory
//! 4. `schema.json` in the current directory
//!
//! A missing or corrupt catalog is logged and replaced by an empty one, which
//! turns every request into a harmless no-op.

mod completion;
mod config;
mod context;
mod diagnostics;
mod documents;
mod error;
mod format;
mod hover;
mod loader;
mod schema;
mod scope;
mod service;
mod signature;
mod store;
mod suggest;
mod token;
mod types;

pub use completion::{
    CompletionEngine, CompletionItem, CompletionKind, CompletionQuery, CompletionResult, Completions,
    SortTier,
};
pub use config::{ServiceConfig, DEFAULT_PROPERTIES};
pub use context::{classify, inside_quotes, partial_word, ContextKind};
pub use diagnostics::{DiagnosticsEngine, PIPE_STYLE, UNKNOWN_OPERATOR, UNKNOWN_TABLE};
pub use documents::{DocumentDiagnostics, ScanTicket};
pub use error::Error;
pub use format::align_pipes;
pub use hover::HoverRenderer;
pub use loader::{find_schema_path, load_default_schema, load_schema, searched_paths, SCHEMA_PATH_ENV};
pub use schema::{Entry, Example, Keyword, ResourceType, Schema, Table};
pub use scope::{resolve_table_scope, TableScopeResolver};
pub use service::KqlLanguageService;
pub use signature::{signature_help, SignatureHelp};
pub use store::SchemaStore;
pub use suggest::{levenshtein_distance, similarity, suggest};
pub use token::{base_name, extract_token, Token};
pub use types::{Diagnostic, DiagnosticSet, DiagnosticSeverity, Position, Range};

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
