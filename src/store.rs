//! Shared, explicitly owned schema store
//!
//! The store is created once by the host and handed to every component as an
//! `Arc<SchemaStore>`. Requests take a [`snapshot`](SchemaStore::snapshot) of
//! the current catalog and never observe a half-reloaded schema.

use crate::loader;
use crate::schema::Schema;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owner of the current [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaStore {
    schema: RwLock<Arc<Schema>>,
    source: Option<PathBuf>,
}

impl SchemaStore {
    /// Wrap an already built schema
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: RwLock::new(Arc::new(schema)),
            source: None,
        }
    }

    /// An empty store; every lookup misses
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from `path`
    ///
    /// A missing or corrupt file is logged and replaced by an empty schema so
    /// that callers degrade to "no suggestions" instead of failing.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let schema = load_or_empty(Some(&path));
        Self {
            schema: RwLock::new(Arc::new(schema)),
            source: Some(path),
        }
    }

    /// Locate the catalog using the default search order and load it
    #[must_use]
    pub fn discover() -> Self {
        match loader::find_schema_path() {
            Some(path) => Self::open(path),
            None => {
                log::warn!(
                    "No schema catalog found (searched {:?}); continuing with an empty schema",
                    loader::searched_paths()
                );
                Self::empty()
            }
        }
    }

    /// Path the catalog was loaded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The current catalog
    #[must_use]
    pub fn snapshot(&self) -> Arc<Schema> {
        Arc::clone(&self.schema.read())
    }

    /// Re-read the catalog from its source path
    ///
    /// Stores without a source path keep their schema.
    pub fn reload(&self) {
        if let Some(path) = &self.source {
            let schema = load_or_empty(Some(path));
            *self.schema.write() = Arc::new(schema);
        }
    }

    /// Replace the catalog
    pub fn replace(&self, schema: Schema) {
        *self.schema.write() = Arc::new(schema);
    }
}

fn load_or_empty(path: Option<&Path>) -> Schema {
    let Some(path) = path else {
        return Schema::default();
    };
    match loader::load_schema(path) {
        Ok(schema) => schema,
        Err(e) => {
            log::warn!("{e}; continuing with an empty schema");
            Schema::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;
    use std::io::Write;

    #[test]
    fn test_open_missing_file_falls_back_to_empty() {
        let store = SchemaStore::open("/no/such/catalog.json");
        assert!(store.snapshot().is_empty());
        assert_eq!(store.source(), Some(Path::new("/no/such/catalog.json")));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tables": {{"Resources": {{}}}}}}"#).unwrap();
        let store = SchemaStore::open(file.path());
        let before = store.snapshot();
        assert!(before.find_table("resources").is_some());

        std::fs::write(
            file.path(),
            r#"{"tables": {"ResourceContainers": {}}}"#,
        )
        .unwrap();
        store.reload();

        let after = store.snapshot();
        assert!(after.find_table("resourcecontainers").is_some());
        assert!(after.find_table("resources").is_none());
        // Snapshots taken before the reload are unaffected
        assert!(before.find_table("resources").is_some());
    }

    #[test]
    fn test_replace() {
        let store = SchemaStore::empty();
        store.replace(Schema::new().table(Table::new("Resources")));
        assert!(store.snapshot().find_table("Resources").is_some());
    }
}
