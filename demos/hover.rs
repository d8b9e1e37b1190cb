//! Hover documentation
//!
//! Demonstrates hover markdown for tables, operators and functions. Hovering
//! the same table twice shows the same examples until another symbol is
//! hovered.
//!
//! Run: `cargo run --example hover`

use kql_language_service::{KqlLanguageService, Position, SchemaStore, ServiceConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() {
    env_logger::init();

    let store = Arc::new(SchemaStore::discover());
    let service = KqlLanguageService::new(store, ServiceConfig::default());
    let cancel = CancellationToken::new();

    let text = "Resources\n| where name !contains~ 'test'\n| summarize count() by type";
    let targets = [
        ("table", Position::new(0, 3)),
        ("table again", Position::new(0, 3)),
        ("negated operator", Position::new(1, 16)),
        ("function call", Position::new(2, 13)),
        ("table after other symbol", Position::new(0, 3)),
    ];

    for (label, position) in targets {
        println!("==== {label} at {position}");
        match service.hover(text, position, &cancel) {
            Some(markdown) => println!("{markdown}"),
            None => println!("(nothing)"),
        }
        println!();
    }

    let text = "Resources\n| extend x = strcat(name, '-', ";
    if let Some(help) = service.signature_help(text, Position::new(1, 31), &cancel) {
        println!("Signature: {} (argument {})", help.label, help.active_parameter);
    }
}
