//! Completion types and the completion engine
//!
//! Candidates are sourced from the schema according to the [`ContextKind`]
//! at the cursor, filtered by the partially typed word, de-duplicated and
//! ordered by [`SortTier`].

use crate::context::ContextKind;
use crate::schema::Schema;
use crate::store::SchemaStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A completion item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    /// Display label
    pub label: String,
    /// Kind of completion
    pub kind: CompletionKind,
    /// Detail text (category, description or display name)
    pub detail: String,
    /// Text to insert
    pub insert_text: String,
    /// Ordering bucket (lower = higher priority)
    pub sort_tier: SortTier,
}

/// Kind of completion item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CompletionKind {
    /// A keyword
    Keyword,
    /// A scalar function
    Function,
    /// An aggregate function
    AggregateFunction,
    /// A table
    Table,
    /// A well-known property (column)
    Property,
    /// A tabular operator
    Operator,
    /// A resource type identifier
    ResourceType,
}

/// Ordering bucket of a completion item
///
/// Items sort by tier first, then alphabetically by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SortTier {
    /// The expected continuation keyword (`by` after `sort`/`order`)
    Continuation,
    /// Tables
    Table,
    /// Tabular operators
    Operator,
    /// Scalar and aggregate functions
    Function,
    /// Well-known properties
    Property,
    /// Resource type identifiers
    ResourceType,
    /// Keywords
    Keyword,
}

/// Inputs of a completion request
#[derive(Debug, Clone)]
pub struct CompletionQuery {
    /// Context at the cursor
    pub context: ContextKind,
    /// Governing table, if one was resolved
    pub table_scope: Option<String>,
    /// Partially typed word (may be empty)
    pub partial_word: String,
    /// Whether the cursor is already inside an open string literal
    pub inside_quotes: bool,
}

impl CompletionQuery {
    /// A query with no scope, no partial word and no open quote
    #[must_use]
    pub fn new(context: ContextKind) -> Self {
        Self {
            context,
            table_scope: None,
            partial_word: String::new(),
            inside_quotes: false,
        }
    }

    /// Set the table scope
    #[must_use]
    pub fn table_scope(mut self, table: Option<impl Into<String>>) -> Self {
        self.table_scope = table.map(Into::into);
        self
    }

    /// Set the partial word
    #[must_use]
    pub fn partial_word(mut self, word: impl Into<String>) -> Self {
        self.partial_word = word.into();
        self
    }

    /// Set whether the cursor is inside quotes
    #[must_use]
    pub fn inside_quotes(mut self, inside: bool) -> Self {
        self.inside_quotes = inside;
        self
    }
}

/// Result of a completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Completion items
    pub items: Vec<CompletionItem>,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Continuation,
    Tables,
    Operators,
    Functions,
    Properties,
    ResourceTypes,
    Keywords,
}

fn sources(context: ContextKind) -> &'static [Source] {
    match context {
        ContextKind::StartOfStatement => &[Source::Tables, Source::Operators],
        ContextKind::AfterPipe => &[Source::Operators],
        ContextKind::OrderByExpected => &[Source::Continuation, Source::Properties],
        ContextKind::ResourceTypeLiteral => &[Source::ResourceTypes],
        ContextKind::PropertyList => &[Source::Properties, Source::Functions, Source::ResourceTypes],
        ContextKind::FunctionArgument => &[Source::Keywords, Source::Properties, Source::Functions],
        ContextKind::Default => &[
            Source::Keywords,
            Source::Operators,
            Source::Functions,
            Source::Properties,
        ],
    }
}

/// Produces completion candidates from the schema
#[derive(Debug, Clone)]
pub struct CompletionEngine {
    store: Arc<SchemaStore>,
    properties: Arc<[String]>,
}

impl CompletionEngine {
    /// Create an engine offering `properties` as property completions
    #[must_use]
    pub fn new(store: Arc<SchemaStore>, properties: Vec<String>) -> Self {
        Self {
            store,
            properties: properties.into(),
        }
    }

    /// Start a completion request
    ///
    /// Nothing is computed until the returned iterator is first polled. The
    /// iterator cannot be restarted; issue a new request instead.
    #[must_use]
    pub fn complete(&self, query: CompletionQuery) -> Completions {
        Completions {
            schema: self.store.snapshot(),
            properties: Arc::clone(&self.properties),
            query,
            items: None,
        }
    }
}

/// Lazily computed, ordered completion candidates
#[derive(Debug)]
pub struct Completions {
    schema: Arc<Schema>,
    properties: Arc<[String]>,
    query: CompletionQuery,
    items: Option<std::vec::IntoIter<CompletionItem>>,
}

impl Iterator for Completions {
    type Item = CompletionItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.items.is_none() {
            self.items = Some(self.collect_candidates().into_iter());
        }
        self.items.as_mut().and_then(Iterator::next)
    }
}

impl Completions {
    fn collect_candidates(&self) -> Vec<CompletionItem> {
        let needle = self.query.partial_word.to_lowercase();
        let mut items: Vec<CompletionItem> = sources(self.query.context)
            .iter()
            .flat_map(|source| self.source_items(*source))
            .filter(|item| {
                needle.is_empty()
                    || item.label.to_lowercase().contains(&needle)
                    || item.detail.to_lowercase().contains(&needle)
            })
            .collect();

        items.sort_by(|a, b| {
            a.sort_tier
                .cmp(&b.sort_tier)
                .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
        });

        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.label.to_lowercase()));
        log::debug!(
            "{} completion candidates for {} (scope {:?})",
            items.len(),
            self.query.context,
            self.query.table_scope
        );
        items
    }

    fn source_items(&self, source: Source) -> Vec<CompletionItem> {
        let schema = &self.schema;
        match source {
            Source::Continuation => {
                let detail = schema
                    .find_keyword("by")
                    .map_or_else(|| "Keyword".to_string(), |k| k.category.clone());
                vec![item("by", CompletionKind::Keyword, detail, SortTier::Continuation)]
            }
            Source::Tables => schema
                .tables
                .values()
                .map(|t| {
                    let detail = if t.description.is_empty() {
                        "Table".to_string()
                    } else {
                        t.description.clone()
                    };
                    item(&t.name, CompletionKind::Table, detail, SortTier::Table)
                })
                .collect(),
            Source::Operators => schema
                .operators
                .iter()
                .map(|o| item(&o.name, CompletionKind::Operator, o.category.clone(), SortTier::Operator))
                .collect(),
            Source::Functions => schema
                .functions
                .iter()
                .map(|f| {
                    let kind = if f.is_aggregate() {
                        CompletionKind::AggregateFunction
                    } else {
                        CompletionKind::Function
                    };
                    item(&f.name, kind, f.category.clone(), SortTier::Function)
                })
                .collect(),
            Source::Properties => self
                .properties
                .iter()
                .map(|p| item(p, CompletionKind::Property, "Property".to_string(), SortTier::Property))
                .collect(),
            Source::ResourceTypes => {
                let quote = !self.query.inside_quotes;
                let resource_item = |id: &str, name: &str| {
                    let mut candidate = item(
                        id,
                        CompletionKind::ResourceType,
                        name.to_string(),
                        SortTier::ResourceType,
                    );
                    if quote {
                        candidate.insert_text = format!("'{id}'");
                    }
                    candidate
                };
                match &self.query.table_scope {
                    Some(table) => schema
                        .resource_types_for_table(table)
                        .map(|(id, rt)| resource_item(id, &rt.name))
                        .collect(),
                    None => schema
                        .resource_types
                        .iter()
                        .map(|(id, rt)| resource_item(id, &rt.name))
                        .collect(),
                }
            }
            Source::Keywords => schema
                .keywords
                .iter()
                .map(|k| item(&k.name, CompletionKind::Keyword, k.category.clone(), SortTier::Keyword))
                .collect(),
        }
    }
}

fn item(label: &str, kind: CompletionKind, detail: String, sort_tier: SortTier) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind,
        detail,
        insert_text: label.to_string(),
        sort_tier,
    }
}
