//! Locating and reading the schema catalog
//!
//! This module handles finding the JSON catalog on disk and turning it into
//! a [`Schema`].

use crate::error::Error;
use crate::schema::Schema;
use std::path::{Path, PathBuf};

/// Environment variable for specifying the catalog path
pub const SCHEMA_PATH_ENV: &str = "KQL_SCHEMA_PATH";

/// File name of the bundled catalog
pub const SCHEMA_FILE_NAME: &str = "schema.json";

/// Directory the catalog is shipped in
const RESOURCES_DIR: &str = "resources";

/// Candidate catalog locations, in search order
///
/// 1. `KQL_SCHEMA_PATH` environment variable (file, or directory containing `schema.json`)
/// 2. `resources/schema.json` next to the current executable
/// 3. `resources/schema.json` relative to the crate root
/// 4. `schema.json` in the current working directory
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(path) = std::env::var_os(SCHEMA_PATH_ENV) {
        let path = PathBuf::from(path);
        paths.push(path.join(SCHEMA_FILE_NAME));
        paths.insert(0, path);
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(exe_dir.join(RESOURCES_DIR).join(SCHEMA_FILE_NAME));
    }

    paths.push(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join(RESOURCES_DIR)
            .join(SCHEMA_FILE_NAME),
    );
    paths.push(PathBuf::from(SCHEMA_FILE_NAME));
    paths
}

/// Find the schema catalog path
///
/// Returns the first existing file among [`searched_paths`].
pub fn find_schema_path() -> Option<PathBuf> {
    let found = candidate_paths().into_iter().find(|path| path.is_file());
    match &found {
        Some(path) => log::debug!("Found schema catalog: {}", path.display()),
        None => log::debug!("Schema catalog not found"),
    }
    found
}

/// Paths checked by [`find_schema_path`], in order
pub fn searched_paths() -> Vec<PathBuf> {
    candidate_paths()
}

/// Read and parse the catalog at `path`
pub fn load_schema(path: &Path) -> Result<Schema, Error> {
    log::info!("Loading schema catalog from {}", path.display());

    let json = std::fs::read_to_string(path).map_err(|e| Error::schema_load_failed(path, e))?;
    let schema = Schema::from_json(&json).map_err(|e| Error::schema_load_failed(path, e))?;

    log::info!(
        "Loaded {} tables, {} operators, {} functions, {} resource types, {} keywords",
        schema.tables.len(),
        schema.operators.len(),
        schema.functions.len(),
        schema.resource_types.len(),
        schema.keywords.len()
    );
    Ok(schema)
}

/// Locate the catalog via [`find_schema_path`] and load it
pub fn load_default_schema() -> Result<Schema, Error> {
    let path = find_schema_path().ok_or_else(|| Error::SchemaNotFound {
        searched_paths: searched_paths(),
    })?;
    load_schema(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_schema_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tables": {{"Resources": {{}}}}, "operators": [{{"name": "where"}}]}}"#
        )
        .unwrap();

        let schema = load_schema(file.path()).unwrap();
        assert!(schema.find_table("resources").is_some());
        assert!(schema.find_operator("where").is_some());
    }

    #[test]
    fn test_load_schema_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_schema(file.path()).unwrap_err();
        assert!(matches!(err, Error::SchemaLoadFailed { .. }));
    }

    #[test]
    fn test_search_order_ends_with_bundled_and_cwd() {
        let paths = searched_paths();
        let n = paths.len();
        assert!(n >= 2);
        assert_eq!(paths[n - 1], PathBuf::from(SCHEMA_FILE_NAME));
        assert!(paths[n - 2].ends_with("resources/schema.json"));
        assert!(paths[n - 2].starts_with(env!("CARGO_MANIFEST_DIR")));
    }

    #[test]
    fn test_load_schema_missing_file() {
        let err = load_schema(Path::new("/definitely/not/here/schema.json")).unwrap_err();
        assert!(matches!(err, Error::SchemaLoadFailed { .. }));
    }
}
