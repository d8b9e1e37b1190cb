//! Diagnostics with spelling suggestions
//!
//! Demonstrates scanning a document, tracking versions of an open document
//! and aligning pipes.
//!
//! Run: `cargo run --example diagnostics`

use kql_language_service::{KqlLanguageService, SchemaStore, ServiceConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() {
    env_logger::init();

    let store = Arc::new(SchemaStore::discover());
    let service = KqlLanguageService::new(store, ServiceConfig::default());

    let text = "Resourcess | wher location == 'westeurope'\n| projct name, type";
    println!("Document:\n{text}\n");

    for diag in service.diagnostics(text, &CancellationToken::new()) {
        println!(
            "  [{}] {}..{} {}",
            diag.severity, diag.range.start, diag.range.end, diag.message
        );
    }

    // Successive edits of an open document replace the published set
    let uri = "untitled:query.kql";
    for (version, text) in [(1, "Resources\n| wher x"), (2, "Resources\n| where x == 1")] {
        if let Some(set) = service.update_document(uri, version, text) {
            println!("\n{uri} v{}: {} diagnostics", set.version, set.diagnostics.len());
        }
    }
    service.close_document(uri);

    println!("\nAligned:\n{}", service.align_pipes(text));
}
