//! Hover documentation
//!
//! A hovered name is resolved through an ordered list of typed lookups (see
//! [`HoverRenderer::hover`]) and rendered as markdown with headed sections.
//!
//! Table examples are sampled at random when a table has more examples than
//! fit on a hover card. The sample is cached per symbol so that repeated
//! hovers over the same table show the same examples; hovering any other
//! symbol ends the session and the next hover draws a fresh sample.

use crate::schema::{Entry, Example, Keyword, ResourceType, Schema, Table};
use crate::store::SchemaStore;
use crate::token::base_name;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt::Write as _;
use std::sync::Arc;

/// Maximum resource types listed on a table hover card
const MAX_LISTED_RESOURCE_TYPES: usize = 10;

/// A typed catalog lookup tried while resolving a hovered name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Function,
    Operator,
    Keyword,
    Table,
    ResourceType,
}

/// Lookup order when the name is immediately followed by `(`
const CALL_LOOKUPS: &[Lookup] = &[Lookup::Function, Lookup::Operator, Lookup::Keyword];

/// Lookup order for bare names
const NAME_LOOKUPS: &[Lookup] = &[
    Lookup::Operator,
    Lookup::Keyword,
    Lookup::Function,
    Lookup::Table,
    Lookup::ResourceType,
];

enum Resolved<'a> {
    Function(&'a Entry),
    Operator(&'a Entry),
    Keyword(&'a Keyword),
    Table(&'a Table),
    ResourceType(&'a str, &'a ResourceType),
}

impl Resolved<'_> {
    fn symbol(&self) -> &str {
        match self {
            Self::Function(e) | Self::Operator(e) => e.name.as_str(),
            Self::Keyword(k) => k.name.as_str(),
            Self::Table(t) => t.name.as_str(),
            Self::ResourceType(id, _) => *id,
        }
    }
}

impl Lookup {
    fn find<'a>(self, schema: &'a Schema, name: &str) -> Option<Resolved<'a>> {
        match self {
            Self::Function => schema.find_function(name).map(Resolved::Function),
            Self::Operator => schema.find_operator(name).map(Resolved::Operator),
            Self::Keyword => schema.find_keyword(name).map(Resolved::Keyword),
            Self::Table => schema.find_table(name).map(Resolved::Table),
            Self::ResourceType => schema
                .find_resource_type(name)
                .map(|(id, rt)| Resolved::ResourceType(id, rt)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionKey {
    symbol: String,
    example_count: usize,
}

impl SessionKey {
    fn new(symbol: &str, example_count: usize) -> Self {
        Self {
            symbol: symbol.to_lowercase(),
            example_count,
        }
    }
}

#[derive(Debug)]
struct HoverSession {
    key: Option<SessionKey>,
    examples: Vec<String>,
    rng: StdRng,
}

/// Renders hover documentation for catalog symbols
#[derive(Debug)]
pub struct HoverRenderer {
    store: Arc<SchemaStore>,
    example_count: usize,
    session: Mutex<HoverSession>,
}

impl HoverRenderer {
    /// Create a renderer showing up to `example_count` table examples
    #[must_use]
    pub fn new(store: Arc<SchemaStore>, example_count: usize) -> Self {
        Self::with_rng(store, example_count, StdRng::from_entropy())
    }

    /// Create a renderer with a deterministic example sampler
    #[must_use]
    pub fn with_seed(store: Arc<SchemaStore>, example_count: usize, seed: u64) -> Self {
        Self::with_rng(store, example_count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<SchemaStore>, example_count: usize, rng: StdRng) -> Self {
        Self {
            store,
            example_count,
            session: Mutex::new(HoverSession {
                key: None,
                examples: Vec::new(),
                rng,
            }),
        }
    }

    /// Render documentation for `token`
    ///
    /// `text_after` is the line text following the token. When it starts with
    /// `(` the name is looked up as a function first, then as an operator and
    /// a keyword; otherwise as an operator, keyword, function, table and
    /// resource type, in that order. An exact match anywhere in the list wins
    /// over a match on the name stripped of `!` and `~`.
    #[must_use]
    pub fn hover(&self, token: &str, text_after: &str) -> Option<String> {
        let schema = self.store.snapshot();
        let lookups = if text_after.starts_with('(') {
            CALL_LOOKUPS
        } else {
            NAME_LOOKUPS
        };

        let Some(resolved) = resolve(&schema, token, lookups).or_else(|| {
            let base = base_name(token);
            (base != token)
                .then(|| resolve(&schema, base, lookups))
                .flatten()
        }) else {
            self.end_session_unless(base_name(token));
            return None;
        };

        // Table hovers manage the session themselves while sampling examples
        if !matches!(resolved, Resolved::Table(_)) {
            self.end_session_unless(resolved.symbol());
        }

        Some(match resolved {
            Resolved::Function(entry) => render_entry(entry, "Function"),
            Resolved::Operator(entry) => render_entry(entry, "Operator"),
            Resolved::Keyword(keyword) => render_keyword(keyword),
            Resolved::Table(table) => self.render_table(&schema, table),
            Resolved::ResourceType(id, rt) => render_resource_type(id, rt),
        })
    }

    fn end_session_unless(&self, symbol: &str) {
        let mut session = self.session.lock();
        if session
            .key
            .as_ref()
            .is_some_and(|key| key.symbol != symbol.to_lowercase())
        {
            session.key = None;
            session.examples.clear();
        }
    }

    /// Pick the examples shown for `table`, reusing this session's sample
    fn table_examples(&self, table: &Table) -> Vec<String> {
        let pool: Vec<&str> = table.examples.iter().map(|e| e.code.as_str()).collect();
        let count = self.example_count;

        if pool.len() <= count {
            self.end_session_unless(&table.name);
            let mut all: Vec<String> = pool.into_iter().map(str::to_string).collect();
            all.sort_by_key(String::len);
            return all;
        }

        let key = SessionKey::new(&table.name, count);
        let mut session = self.session.lock();
        if session.key.as_ref() == Some(&key) {
            return session.examples.clone();
        }

        let mut chosen: Vec<String> = pool
            .choose_multiple(&mut session.rng, count)
            .map(|s| (*s).to_string())
            .collect();
        chosen.sort_by_key(String::len);
        log::debug!("New hover session for {}", table.name);

        session.key = Some(key);
        session.examples.clone_from(&chosen);
        chosen
    }

    fn render_table(&self, schema: &Schema, table: &Table) -> String {
        let mut sections = vec![format!("### {}\n\n*Table*", table.name)];
        if !table.description.is_empty() {
            sections.push(table.description.clone());
        }

        let mut resource_types: Vec<&str> =
            table.resource_type_names.iter().map(String::as_str).collect();
        if resource_types.is_empty() {
            resource_types = schema
                .resource_types_for_table(&table.name)
                .map(|(id, _)| id)
                .collect();
        }
        if !resource_types.is_empty() {
            let mut list = String::from("**Resource types**\n");
            for id in resource_types.iter().take(MAX_LISTED_RESOURCE_TYPES) {
                let _ = write!(list, "\n- `{id}`");
            }
            if resource_types.len() > MAX_LISTED_RESOURCE_TYPES {
                let _ = write!(
                    list,
                    "\n- ...and {} more",
                    resource_types.len() - MAX_LISTED_RESOURCE_TYPES
                );
            }
            sections.push(list);
        }

        let examples = self.table_examples(table);
        if !examples.is_empty() {
            sections.push(render_code_blocks(examples.iter().map(String::as_str)));
        }
        sections.join("\n\n")
    }
}

fn resolve<'a>(schema: &'a Schema, name: &str, lookups: &[Lookup]) -> Option<Resolved<'a>> {
    lookups.iter().find_map(|lookup| lookup.find(schema, name))
}

fn heading(name: &str, kind: &str, category: &str) -> String {
    if category.is_empty() {
        format!("### {name}\n\n*{kind}*")
    } else {
        format!("### {name}\n\n*{kind} · {category}*")
    }
}

fn render_entry(entry: &Entry, kind: &str) -> String {
    let mut sections = vec![heading(&entry.name, kind, &entry.category)];
    if let Some(description) = &entry.description {
        sections.push(description.clone());
    }
    if let Some(syntax) = &entry.syntax {
        sections.push(format!("**Syntax**\n\n```kusto\n{syntax}\n```"));
    }
    if let Some(parameters) = &entry.parameters_doc {
        sections.push(format!("**Parameters**\n\n{parameters}"));
    }
    if let Some(returns) = &entry.returns_doc {
        sections.push(format!("**Returns**\n\n{returns}"));
    }
    if !entry.examples.is_empty() {
        sections.push(render_examples(&entry.examples));
    }
    if let Some(url) = &entry.reference_url {
        sections.push(format!("[Reference]({url})"));
    }
    sections.join("\n\n")
}

fn render_keyword(keyword: &Keyword) -> String {
    heading(&keyword.name, "Keyword", &keyword.category)
}

fn render_resource_type(id: &str, resource_type: &ResourceType) -> String {
    let mut doc = format!("### {}\n\n*Resource type*\n\n`{id}`", resource_type.name);
    if !resource_type.tables.is_empty() {
        let _ = write!(doc, "\n\n**Tables**: {}", resource_type.tables.join(", "));
    }
    doc
}

fn render_examples(examples: &[Example]) -> String {
    let mut out = String::from("**Examples**");
    for example in examples {
        if let Some(description) = &example.description {
            let _ = write!(out, "\n\n{description}");
        }
        let _ = write!(out, "\n\n```kusto\n{}\n```", example.code);
    }
    out
}

fn render_code_blocks<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::from("**Examples**");
    for code in codes {
        let _ = write!(out, "\n\n```kusto\n{code}\n```");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<SchemaStore> {
        let schema = Schema::new()
            .table(
                Table::new("Resources")
                    .description("Azure resources")
                    .with_resource_type("microsoft.web/sites")
                    .example("Resources | take 1")
                    .example("Resources | summarize count() by type")
                    .example("Resources | where location == 'westus' | project name")
                    .example("Resources | count"),
            )
            .table(
                Table::new("ResourceContainers")
                    .example("ResourceContainers | take 10")
                    .example("ResourceContainers"),
            )
            .operator(
                Entry::new("contains", "String operator")
                    .description("Substring match")
                    .syntax("T | where col contains 'x'")
                    .example("Resources | where name contains 'sql'")
                    .reference_url("https://learn.microsoft.com/kusto/contains"),
            )
            .operator(
                Entry::new("in~", "Set operator").description("Case-insensitive set membership"),
            )
            .operator(Entry::new("in", "Set operator").description("Set membership"))
            .operator(Entry::new("count", "Aggregation operator"))
            .function(
                Entry::new("count", "Aggregation")
                    .syntax("count()")
                    .returns("Number of rows"),
            )
            .keyword(Keyword::new("by", "Grouping"))
            .resource_type(
                "microsoft.web/sites",
                ResourceType::new("App Service").in_table("Resources"),
            );
        Arc::new(SchemaStore::new(schema))
    }

    #[test]
    fn test_operator_sections() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        let doc = renderer.hover("contains", " 'sql'").unwrap();

        assert!(doc.starts_with("### contains"));
        assert!(doc.contains("Substring match"));
        assert!(doc.contains("**Syntax**"));
        assert!(doc.contains("**Examples**"));
        assert!(doc.contains("[Reference](https://learn.microsoft.com/kusto/contains)"));
    }

    #[test]
    fn test_negated_case_insensitive_falls_back_to_base() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        let doc = renderer.hover("!contains~", " 'sql'").unwrap();
        assert!(doc.starts_with("### contains"));
    }

    #[test]
    fn test_exact_decorated_entry_wins() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        let doc = renderer.hover("in~", " ('a')").unwrap();
        assert!(doc.contains("Case-insensitive set membership"));
    }

    #[test]
    fn test_call_prefers_function() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        assert!(renderer.hover("count", "()").unwrap().contains("*Function"));
        assert!(renderer.hover("count", "").unwrap().contains("*Operator"));
        // Only an immediately following parenthesis makes a call
        assert!(renderer.hover("count", " (x)").unwrap().contains("*Operator"));
    }

    #[test]
    fn test_tables_not_resolved_as_calls() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        assert!(renderer.hover("Resources", "(").is_none());
        assert!(renderer.hover("resources", " | take 1").is_some());
    }

    #[test]
    fn test_keyword_and_resource_type() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        assert_eq!(renderer.hover("by", " type").unwrap(), "### by\n\n*Keyword · Grouping*");
        let doc = renderer.hover("App Service", "").unwrap();
        assert!(doc.contains("`microsoft.web/sites`"));
        assert!(doc.contains("**Tables**: Resources"));
    }

    #[test]
    fn test_unknown_symbol() {
        let renderer = HoverRenderer::with_seed(store(), 2, 7);
        assert!(renderer.hover("nothing", "").is_none());
    }

    #[test]
    fn test_table_examples_stable_within_session() {
        let renderer = HoverRenderer::with_seed(store(), 2, 42);
        let first = renderer.hover("Resources", "").unwrap();
        let second = renderer.hover("RESOURCES", "").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.matches("```kusto").count(), 2);
    }

    #[test]
    fn test_new_session_draws_valid_sample() {
        let renderer = HoverRenderer::with_seed(store(), 2, 42);
        let _ = renderer.hover("Resources", "").unwrap();
        let _ = renderer.hover("contains", "").unwrap();
        let doc = renderer.hover("Resources", "").unwrap();
        assert_eq!(doc.matches("```kusto").count(), 2);
    }

    #[test]
    fn test_unknown_hover_ends_session() {
        let renderer = HoverRenderer::with_seed(store(), 2, 42);
        let _ = renderer.hover("Resources", "").unwrap();
        assert!(renderer.session.lock().key.is_some());

        assert!(renderer.hover("nothing", "").is_none());
        assert!(renderer.session.lock().key.is_none());
    }

    #[test]
    fn test_interleaved_hovers_keep_cache_consistent() {
        let renderer = Arc::new(HoverRenderer::with_seed(store(), 1, 9));
        let pools: Vec<(&str, Vec<String>)> = ["Resources", "ResourceContainers"]
            .iter()
            .map(|name| {
                let schema = renderer.store.snapshot();
                let table = schema.find_table(name).unwrap();
                let codes = table.examples.iter().map(|e| e.code.clone()).collect();
                (*name, codes)
            })
            .collect();

        std::thread::scope(|scope| {
            for (name, pool) in &pools {
                let renderer = Arc::clone(&renderer);
                scope.spawn(move || {
                    for _ in 0..50 {
                        let doc = renderer.hover(name, "").unwrap();
                        let shown: Vec<&str> = doc
                            .split("```kusto\n")
                            .skip(1)
                            .filter_map(|block| block.split("\n```").next())
                            .collect();
                        assert_eq!(shown.len(), 1);
                        assert!(pool.iter().any(|code| code == shown[0]), "{name}: {shown:?}");
                    }
                });
            }
        });

        // The cache belongs to whichever table was hovered last
        let last = renderer.hover("Resources", "").unwrap();
        assert_eq!(renderer.hover("Resources", "").unwrap(), last);
    }

    #[test]
    fn test_small_pool_shows_all_shortest_first() {
        let renderer = HoverRenderer::with_seed(store(), 2, 1);
        let doc = renderer.hover("ResourceContainers", "").unwrap();
        let short = doc.find("```kusto\nResourceContainers\n```").unwrap();
        let long = doc.find("ResourceContainers | take 10").unwrap();
        assert!(short < long);
    }

    #[test]
    fn test_table_lists_resource_types() {
        let renderer = HoverRenderer::with_seed(store(), 2, 1);
        let doc = renderer.hover("Resources", "").unwrap();
        assert!(doc.contains("**Resource types**\n\n- `microsoft.web/sites`"));
        assert!(doc.contains("Azure resources"));
    }
}
