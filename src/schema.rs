//! Schema catalog types
//!
//! The catalog describes everything the language service knows about the
//! query language: tables, tabular operators, scalar/aggregate functions,
//! resource types and keywords, together with their documentation.
//!
//! The JSON shape is `{tables, operators, functions, resourceTypes, keywords}`
//! where `tables` and `resourceTypes` are objects keyed by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Symbol catalog for the query language
///
/// Immutable once loaded; see [`crate::SchemaStore`] for the load/reload
/// lifecycle. Table keys are case-folded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Tables keyed by lower-cased name
    #[serde(default)]
    pub tables: BTreeMap<String, Table>,

    /// Tabular operators (`where`, `project`, `mv-expand`, ...)
    #[serde(default)]
    pub operators: Vec<Entry>,

    /// Scalar and aggregate functions
    #[serde(default)]
    pub functions: Vec<Entry>,

    /// Resource types keyed by identifier (e.g. `microsoft.compute/virtualmachines`)
    #[serde(default)]
    pub resource_types: BTreeMap<String, ResourceType>,

    /// Language keywords
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

impl Schema {
    /// Create a new empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON and normalize its keys
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let schema: Self = serde_json::from_str(json)?;
        Ok(schema.normalized())
    }

    /// Case-fold table keys and fill in names omitted from the JSON
    ///
    /// A table or resource type without an explicit `name` takes its map key.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let tables = std::mem::take(&mut self.tables);
        for (key, mut table) in tables {
            if table.name.is_empty() {
                table.name.clone_from(&key);
            }
            self.tables.insert(key.to_lowercase(), table);
        }
        for (key, resource_type) in &mut self.resource_types {
            if resource_type.name.is_empty() {
                resource_type.name.clone_from(key);
            }
        }
        self
    }

    /// Builder method to add a table
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.to_lowercase(), table);
        self
    }

    /// Builder method to add an operator
    #[must_use]
    pub fn operator(mut self, operator: Entry) -> Self {
        self.operators.push(operator);
        self
    }

    /// Builder method to add a function
    #[must_use]
    pub fn function(mut self, function: Entry) -> Self {
        self.functions.push(function);
        self
    }

    /// Builder method to add a resource type under its identifier
    #[must_use]
    pub fn resource_type(mut self, id: impl Into<String>, resource_type: ResourceType) -> Self {
        self.resource_types.insert(id.into(), resource_type);
        self
    }

    /// Builder method to add a keyword
    #[must_use]
    pub fn keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    /// Check if the schema is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.operators.is_empty()
            && self.functions.is_empty()
            && self.resource_types.is_empty()
            && self.keywords.is_empty()
    }

    /// Get a table by name
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    /// Get an operator by name
    #[must_use]
    pub fn find_operator(&self, name: &str) -> Option<&Entry> {
        self.operators
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
    }

    /// Get a function by name
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<&Entry> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Get a resource type by identifier, falling back to its display name
    #[must_use]
    pub fn find_resource_type(&self, name: &str) -> Option<(&str, &ResourceType)> {
        self.resource_types
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.resource_types
                    .iter()
                    .find(|(_, rt)| rt.name.eq_ignore_ascii_case(name))
            })
            .map(|(id, rt)| (id.as_str(), rt))
    }

    /// Get a keyword by name
    #[must_use]
    pub fn find_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
    }

    /// Resource types that can be queried from `table`
    ///
    /// Unknown tables yield an empty iterator.
    pub fn resource_types_for_table<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ResourceType)> + 'a {
        self.resource_types
            .iter()
            .filter(move |(_, rt)| rt.applies_to(table))
            .map(|(id, rt)| (id.as_str(), rt))
    }
}

/// Table definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Display name (keeps the catalog's casing)
    #[serde(default)]
    pub name: String,

    /// Optional table description
    #[serde(default)]
    pub description: String,

    /// Resource types stored in this table
    #[serde(default, rename = "resourceTypes", alias = "resourceTypeNames")]
    pub resource_type_names: Vec<String>,

    /// Example queries
    #[serde(default)]
    pub examples: Vec<Example>,
}

impl Table {
    /// Create a new table with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder method to add an example query
    #[must_use]
    pub fn example(mut self, code: impl Into<String>) -> Self {
        self.examples.push(Example::new(code));
        self
    }

    /// Builder method to record a resource type stored in this table
    #[must_use]
    pub fn with_resource_type(mut self, name: impl Into<String>) -> Self {
        self.resource_type_names.push(name.into());
        self
    }
}

/// Documentation entry shared by operators and functions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Name as written in queries
    pub name: String,

    /// Category (e.g. "Filter", "Aggregation", "String")
    #[serde(default)]
    pub category: String,

    /// Prose description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Syntax line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,

    /// Parameter documentation
    #[serde(
        default,
        alias = "parameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameters_doc: Option<String>,

    /// Return value documentation
    #[serde(default, alias = "returns", skip_serializing_if = "Option::is_none")]
    pub returns_doc: Option<String>,

    /// Example queries
    #[serde(default)]
    pub examples: Vec<Example>,

    /// Link to the external reference page
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl Entry {
    /// Create a new entry
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the syntax line
    #[must_use]
    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// Set the parameter documentation
    #[must_use]
    pub fn parameters(mut self, doc: impl Into<String>) -> Self {
        self.parameters_doc = Some(doc.into());
        self
    }

    /// Set the return value documentation
    #[must_use]
    pub fn returns(mut self, doc: impl Into<String>) -> Self {
        self.returns_doc = Some(doc.into());
        self
    }

    /// Builder method to add an example query
    #[must_use]
    pub fn example(mut self, code: impl Into<String>) -> Self {
        self.examples.push(Example::new(code));
        self
    }

    /// Set the reference link
    #[must_use]
    pub fn reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }

    /// Whether this is an aggregation function (`count()`, `dcount()`, ...)
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.category.to_lowercase().starts_with("aggregat")
    }
}

/// Resource type definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceType {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Tables holding this resource type
    #[serde(default)]
    pub tables: Vec<String>,
}

impl ResourceType {
    /// Create a new resource type
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Builder method to add a table
    #[must_use]
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    /// Whether the resource type is stored in `table`
    #[must_use]
    pub fn applies_to(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }
}

/// Keyword definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyword {
    /// Keyword text
    pub name: String,

    /// Category (e.g. "Logical", "Join")
    #[serde(default)]
    pub category: String,
}

impl Keyword {
    /// Create a new keyword
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// An example query attached to a catalog entry
///
/// Examples are either plain strings or objects with a `code` string and an
/// optional `description`. Any other JSON value is kept as its string
/// rendering rather than rejecting the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Example {
    /// Query text
    pub code: String,

    /// Optional explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Example {
    /// Create an example from query text
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: None,
        }
    }
}

impl From<Value> for Example {
    fn from(value: Value) -> Self {
        match value {
            Value::String(code) => Self::new(code),
            Value::Object(ref map) => match map.get("code") {
                Some(Value::String(code)) => Self {
                    code: code.clone(),
                    description: map
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                _ => {
                    log::debug!("Example without a `code` string, using raw JSON: {value}");
                    Self::new(value.to_string())
                }
            },
            other => {
                log::debug!("Unexpected example format, using raw JSON: {other}");
                Self::new(other.to_string())
            }
        }
    }
}
