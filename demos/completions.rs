//! Context-aware completions
//!
//! Demonstrates completion candidates at a few cursor positions, including
//! resource types scoped to the governing table.
//!
//! Run: `cargo run --example completions`

use kql_language_service::{KqlLanguageService, Position, SchemaStore, ServiceConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn show(service: &KqlLanguageService, text: &str) {
    // Cursor at the very end of the text
    let line = text.lines().count().saturating_sub(1);
    let column = text.lines().last().map_or(0, |l| l.chars().count());
    let position = Position::new(line, column);

    println!("Query: {text:?}");
    println!("  context: {}", service.context_at(text, position));

    let result = service.completions(text, position, &CancellationToken::new());
    println!("  {} candidates", result.items.len());
    for item in result.items.iter().take(8) {
        println!("    {:40} {:?} {}", item.label, item.kind, item.detail);
    }
    println!();
}

fn main() {
    env_logger::init();

    let store = Arc::new(SchemaStore::discover());
    let service = KqlLanguageService::new(store, ServiceConfig::default());

    show(&service, "");
    show(&service, "Resources\n| ");
    show(&service, "Resources\n| su");
    show(&service, "Resources\n| where type == '");
    show(&service, "ResourceContainers\n| where type == 'microsoft.res");
    show(&service, "Resources\n| summarize count() by ");
    show(&service, "Resources\n| order ");
}
