//! Tunables for the language service

use serde::{Deserialize, Serialize};

/// Well-known Azure Resource Graph columns offered as property completions
pub const DEFAULT_PROPERTIES: &[&str] = &[
    "id",
    "name",
    "type",
    "tenantId",
    "kind",
    "location",
    "resourceGroup",
    "subscriptionId",
    "managedBy",
    "sku",
    "plan",
    "properties",
    "tags",
    "identity",
    "zones",
    "extendedLocation",
];

/// Language service configuration
///
/// Every field has a default, so a partial JSON object (or `{}`) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Number of table examples shown on hover
    pub hover_example_count: usize,
    /// Maximum spelling suggestions per diagnostic
    pub max_suggestions: usize,
    /// Minimum normalized similarity for a suggestion that does not share the
    /// first letter. Heuristic; tune freely.
    pub similarity_threshold: f64,
    /// Property names offered in projection/argument positions
    pub properties: Vec<String>,
    /// Emit the "one pipe per line" style hint
    pub pipe_style_hints: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hover_example_count: 2,
            max_suggestions: 3,
            similarity_threshold: 0.6,
            properties: DEFAULT_PROPERTIES.iter().map(|p| (*p).to_string()).collect(),
            pipe_style_hints: true,
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the number of table examples shown on hover
    #[must_use]
    pub fn hover_example_count(mut self, count: usize) -> Self {
        self.hover_example_count = count;
        self
    }

    /// Set the suggestion cap
    #[must_use]
    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Set the similarity threshold
    #[must_use]
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Enable or disable the pipe style hint
    #[must_use]
    pub fn pipe_style_hints(mut self, enabled: bool) -> Self {
        self.pipe_style_hints = enabled;
        self
    }
}
