//! Document Loading
//!
//! Reads an OpenAPI JSON document, or a directory of standalone JSON schema
//! files, into a `SchemaDocument`. This is the only place that touches the
//! filesystem; the engine itself never does I/O.

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{DocumentInfo, OperationDef, SchemaDocument};
use crate::schema::{Schema, SchemaName, EXTENSION_PREFIX};

/// HTTP methods recognised under a path item
const HTTP_METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Configuration for directory loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files matching these path prefixes
    pub skip_prefixes: Vec<String>,
    /// Only load files matching these path prefixes
    pub include_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
            include_prefixes: Vec::new(),
        }
    }
}

/// Operation object fields the engine consumes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    deprecated: bool,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Load a document from a file or a directory of schema files
pub fn load_document(path: &Path, config: &LoadConfig) -> anyhow::Result<SchemaDocument> {
    if path.is_dir() {
        return load_from_directory(path, config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON in {}: {}", path.display(), e))?;

    let document = if is_api_document(&json) {
        parse_document(&json)?
    } else {
        let name = standalone_name(&json, path);
        let schema = Schema::deserialize(&json)
            .with_context(|| format!("Invalid schema in {}", path.display()))?;
        let mut schemas = IndexMap::new();
        schemas.insert(name, schema);
        SchemaDocument::new(schemas)
    };

    Ok(document.with_source_bytes(content.as_bytes()))
}

/// Parse an OpenAPI 3 (`components.schemas`) or Swagger 2 (`definitions`)
/// document, including its operations
pub fn parse_document(json: &Value) -> anyhow::Result<SchemaDocument> {
    let schema_table = json
        .pointer("/components/schemas")
        .or_else(|| json.get("definitions"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let schemas: IndexMap<SchemaName, Schema> =
        serde_json::from_value(schema_table).context("Invalid schema table")?;

    let info = match json.get("info") {
        Some(info) => DocumentInfo::deserialize(info).context("Invalid info object")?,
        None => DocumentInfo::default(),
    };

    let operations = parse_operations(json)?;

    Ok(SchemaDocument::new(schemas)
        .with_info(info)
        .with_operations(operations))
}

/// Load every `*.json` file under a directory as one named schema
pub fn load_from_directory(schema_dir: &Path, config: &LoadConfig) -> anyhow::Result<SchemaDocument> {
    let mut entries: Vec<_> = WalkDir::new(schema_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut schemas: IndexMap<SchemaName, Schema> = IndexMap::with_capacity(entries.len());
    let mut hasher = Sha256::new();

    for entry in entries {
        let path = entry.path();
        let relative_path = path.strip_prefix(schema_dir)?;
        let relative_str = relative_path.to_string_lossy();

        if !config.include_prefixes.is_empty()
            && !config.include_prefixes.iter().any(|p| relative_str.starts_with(p))
        {
            continue;
        }
        if config.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            continue;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        hasher.update(content.as_bytes());

        let json: Value = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON in {}: {}", path.display(), e))?;
        let schema = Schema::deserialize(&json)
            .with_context(|| format!("Invalid schema in {}", path.display()))?;

        let name = standalone_name(&json, path);
        if schemas.contains_key(&name) {
            tracing::warn!(schema = %name, path = %path.display(), "Duplicate schema name, keeping the first");
            continue;
        }
        schemas.insert(name, schema);
    }

    tracing::debug!(count = schemas.len(), dir = %schema_dir.display(), "Loaded schema directory");

    let digest = hasher.finalize();
    Ok(SchemaDocument::new(schemas).with_source_bytes(digest.as_slice()))
}

fn is_api_document(json: &Value) -> bool {
    json.get("openapi").is_some() || json.get("swagger").is_some()
}

/// Title if present, else the file stem without `.schema`
fn standalone_name(json: &Value, path: &Path) -> SchemaName {
    json.get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .replace(".schema", "")
        })
}

fn parse_operations(json: &Value) -> anyhow::Result<Vec<OperationDef>> {
    let Some(paths) = json.get("paths").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut operations = Vec::new();
    for (path, item) in paths {
        for method in HTTP_METHODS {
            let Some(op) = item.get(method) else {
                continue;
            };
            let raw = RawOperation::deserialize(op)
                .with_context(|| format!("Invalid operation {} {}", method.to_uppercase(), path))?;

            operations.push(OperationDef {
                path: path.clone(),
                method: method.to_uppercase(),
                operation_id: raw.operation_id,
                tags: raw.tags,
                summary: raw.summary,
                description: raw.description,
                deprecated: raw.deprecated,
                extensions: raw
                    .extra
                    .into_iter()
                    .filter(|(k, _)| k.starts_with(EXTENSION_PREFIX))
                    .collect(),
            });
        }
    }

    Ok(operations)
}
