//! Resolving the table that governs the statement at the cursor
//!
//! There is no parser, so the governing table is inferred from line-oriented
//! proximity: lines are scanned backward from the cursor until one names a
//! table the schema knows about.

use crate::schema::Schema;
use crate::store::SchemaStore;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static JOIN_SUBQUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bjoin\s+(?:kind\s*=\s*\w+\s*)?(\()\s*([A-Za-z_]\w*)").expect("valid regex")
});

static LEADING_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)").expect("valid regex"));

/// Backward line scanner resolving the table scope
#[derive(Debug, Clone)]
pub struct TableScopeResolver {
    store: Arc<SchemaStore>,
}

impl TableScopeResolver {
    /// Create a resolver reading from `store`
    #[must_use]
    pub fn new(store: Arc<SchemaStore>) -> Self {
        Self { store }
    }

    /// Resolve the table for a cursor at the end of `text_before_cursor`
    ///
    /// Returns the catalog name of the table, or `None` when no line names a
    /// known table (callers then treat the statement as unscoped).
    #[must_use]
    pub fn resolve(&self, text_before_cursor: &str) -> Option<String> {
        let schema = self.store.snapshot();
        resolve_table_scope(&schema, text_before_cursor)
    }
}

/// Resolve the table scope against an explicit schema
#[must_use]
pub fn resolve_table_scope(schema: &Schema, text_before_cursor: &str) -> Option<String> {
    let known = |name: &str| schema.find_table(name).map(|t| t.name.clone());

    let mut line_end = text_before_cursor.len();
    for raw_line in text_before_cursor.rsplit('\n') {
        let line_start = line_end - raw_line.len();
        line_end = line_start.saturating_sub(1);

        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        // A join whose parenthesis is still open at the cursor scopes to the
        // joined table, not the outer pipe chain.
        let joins: Vec<_> = JOIN_SUBQUERY.captures_iter(line).collect();
        for caps in joins.iter().rev() {
            let (Some(paren), Some(ident)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let rest = &text_before_cursor[line_start + paren.start()..];
            if paren_depth(rest) > 0 {
                if let Some(table) = known(ident.as_str()) {
                    log::debug!("Table scope {table} from open join sub-expression");
                    return Some(table);
                }
            }
        }

        if trimmed.starts_with('|') {
            continue;
        }

        if let Some(idx) = line.find('|') {
            if let Some(table) = known(line[..idx].trim()) {
                log::debug!("Table scope {table} from pipe chain head");
                return Some(table);
            }
        }

        if let Some(ident) = LEADING_IDENTIFIER.captures(line).and_then(|c| c.get(1)) {
            if let Some(table) = known(ident.as_str()) {
                log::debug!("Table scope {table} from statement start");
                return Some(table);
            }
        }
    }

    log::debug!("No table scope found");
    None
}

fn paren_depth(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;

    fn schema() -> Schema {
        Schema::new()
            .table(Table::new("Resources"))
            .table(Table::new("ResourceContainers"))
            .table(Table::new("AdvisorResources"))
    }

    #[test]
    fn test_single_line_chain() {
        let scope = resolve_table_scope(&schema(), "Resources | where type == '");
        assert_eq!(scope.as_deref(), Some("Resources"));
    }

    #[test]
    fn test_multi_line_chain_with_blank_and_comment_lines() {
        let text = "resources\n\n// filter first\n| where location == 'westus'\n| where type == '";
        assert_eq!(resolve_table_scope(&schema(), text).as_deref(), Some("Resources"));
    }

    #[test]
    fn test_nearest_statement_wins() {
        let text = "Resources\n| take 1;\nResourceContainers\n| where ";
        assert_eq!(
            resolve_table_scope(&schema(), text).as_deref(),
            Some("ResourceContainers")
        );
    }

    #[test]
    fn test_open_join_scopes_to_joined_table() {
        let text = "Resources\n| join kind=leftouter (ResourceContainers\n    | where type == '";
        assert_eq!(
            resolve_table_scope(&schema(), text).as_deref(),
            Some("ResourceContainers")
        );
    }

    #[test]
    fn test_closed_join_scopes_to_outer_table() {
        let text = "Resources\n| join (AdvisorResources | project id) on id\n| where type == '";
        assert_eq!(resolve_table_scope(&schema(), text).as_deref(), Some("Resources"));
    }

    #[test]
    fn test_unknown_tables_are_unscoped() {
        assert_eq!(resolve_table_scope(&schema(), "Nope\n| where "), None);
        assert_eq!(resolve_table_scope(&schema(), ""), None);
        assert_eq!(resolve_table_scope(&Schema::new(), "Resources | "), None);
    }

    #[test]
    fn test_indented_identifier_is_not_a_statement_start() {
        assert_eq!(resolve_table_scope(&schema(), "  Resources\n| where "), None);
    }
}
