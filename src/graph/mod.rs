//! Schema Document
//!
//! The full table of named schemas plus the operations of an API document.
//! Every `$ref` resolves through this table by its simple name.
//!
//! Submodules:
//! - `loader`: reads OpenAPI documents and schema directories
//! - `patterns`: structural predicates over a single schema
//! - `analysis`: the allOf inheritance graph and its cycles
//! - `diagnostics`: per-run diagnostic collection

pub mod loader;
pub mod analysis;
pub mod patterns;
pub mod diagnostics;

pub use analysis::{InheritanceAnalysis, compute_inheritance_analysis};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use loader::{LoadConfig, load_document, load_from_directory, parse_document};
pub use patterns::{SchemaKind, detect_kind};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::schema::{ref_name, Schema, SchemaName};

/// Document-level metadata from `info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One HTTP operation as declared under `paths`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationDef {
    pub path: String,
    /// Upper-case HTTP method
    pub method: String,
    pub operation_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
}

/// Why a `$ref` chain could not be followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefIssue {
    /// The named schema is not in the document
    Missing(SchemaName),
    /// The chain of pure references loops back on itself
    Cycle(Vec<SchemaName>),
}

/// The named schemas and operations of one input document
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    info: DocumentInfo,
    schemas: IndexMap<SchemaName, Schema>,
    operations: Vec<OperationDef>,
    fingerprint: String,
}

impl SchemaDocument {
    /// Build a document from named schemas, in the given order
    pub fn new(schemas: IndexMap<SchemaName, Schema>) -> Self {
        let fingerprint = fingerprint_of(&serde_json::to_vec(&schemas).unwrap_or_default());
        Self {
            info: DocumentInfo::default(),
            schemas,
            operations: Vec::new(),
            fingerprint,
        }
    }

    /// Build a document from a JSON object of `name -> schema`
    pub fn from_schema_map(value: Value) -> crate::Result<Self> {
        let schemas: IndexMap<SchemaName, Schema> = serde_json::from_value(value)?;
        Ok(Self::new(schemas))
    }

    pub fn with_operations(mut self, operations: Vec<OperationDef>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Replace the fingerprint with one computed over the raw input bytes
    pub fn with_source_bytes(mut self, bytes: &[u8]) -> Self {
        self.fingerprint = fingerprint_of(bytes);
        self
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SchemaName, &Schema)> {
        self.schemas.iter()
    }

    /// Position of a schema in document order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.schemas.get_index_of(name)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn operations(&self) -> &[OperationDef] {
        &self.operations
    }

    /// SHA-256 of the input, hex encoded
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Follow `$ref` links until reaching a schema that carries structure.
    ///
    /// References to enums, named objects and composed schemas are kept as
    /// they are, since those become models of their own. References to bare
    /// primitives, arrays, maps and free-form objects are replaced by the
    /// target schema.
    pub fn unalias<'a>(&'a self, schema: &'a Schema) -> Result<&'a Schema, RefIssue> {
        let mut current = schema;
        let mut chain: Vec<SchemaName> = Vec::new();

        while let Some(reference) = current.reference.as_deref() {
            let name = ref_name(reference);
            if chain.iter().any(|seen| seen == name) {
                chain.push(name.to_string());
                return Err(RefIssue::Cycle(chain));
            }
            chain.push(name.to_string());

            let target = self
                .schemas
                .get(name)
                .ok_or_else(|| RefIssue::Missing(name.to_string()))?;

            if target.has_enum()
                || patterns::is_composed_schema(target)
                || !target.properties.is_empty()
            {
                return Ok(current);
            }
            current = target;
        }

        Ok(current)
    }
}

fn fingerprint_of(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
