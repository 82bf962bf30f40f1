//! Schema Definitions
//!
//! The read-only input of a generation run. One `Schema` per named entry of
//! the document, deserialized straight from OpenAPI / JSON Schema JSON.
//! Nothing in the engine mutates a `Schema` after it is loaded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical schema name (the key under `components/schemas`)
pub type SchemaName = String;

/// Prefix marking opaque extension keys
pub const EXTENSION_PREFIX: &str = "x-";

// =============================================================================
// Type Declarations
// =============================================================================

/// The `type` keyword: a single name, or an OpenAPI 3.1 list such as
/// `["string", "null"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeDecl {
    /// First declared type that is not `"null"`
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(t) if t == "null" => None,
            Self::Single(t) => Some(t.as_str()),
            Self::Multiple(types) => types.iter().map(String::as_str).find(|t| *t != "null"),
        }
    }

    /// Whether `"null"` is one of the declared types
    pub fn includes_null(&self) -> bool {
        match self {
            Self::Single(t) => t == "null",
            Self::Multiple(types) => types.iter().any(|t| t == "null"),
        }
    }

    /// Whether the declaration allows nothing but `null`
    pub fn is_null_only(&self) -> bool {
        match self {
            Self::Single(t) => t == "null",
            Self::Multiple(types) => !types.is_empty() && types.iter().all(|t| t == "null"),
        }
    }
}

/// `additionalProperties`: either a flag or a value schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// XML serialization hints, carried through to the model unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<bool>,
}

// =============================================================================
// Schema
// =============================================================================

/// A schema node of the input document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Declared properties, in document order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<XmlObject>,

    /// Every other keyword, including `x-*` extensions
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Schema {
    /// Deserialize a schema from a JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// A schema that only points at another named schema
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Self::default()
        }
    }

    /// Simple name of the `$ref` target, if this is a reference
    pub fn ref_name(&self) -> Option<&str> {
        self.reference.as_deref().map(ref_name)
    }

    /// Primary declared type (ignoring a `"null"` member)
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(TypeDecl::primary)
    }

    /// Whether the declared type equals `name`
    pub fn type_is(&self, name: &str) -> bool {
        self.primary_type() == Some(name)
    }

    /// Whether the format equals `name`
    pub fn format_is(&self, name: &str) -> bool {
        self.format.as_deref() == Some(name)
    }

    /// `nullable: true`, or `null` among the declared types
    pub fn declares_nullable(&self) -> bool {
        self.nullable == Some(true)
            || self.schema_type.as_ref().map(TypeDecl::includes_null).unwrap_or(false)
    }

    /// Whether the schema lists enum values
    pub fn has_enum(&self) -> bool {
        self.enum_values.as_ref().map(|v| !v.is_empty()).unwrap_or(false)
    }

    pub fn all_of(&self) -> &[Schema] {
        self.all_of.as_deref().unwrap_or(&[])
    }

    pub fn one_of(&self) -> &[Schema] {
        self.one_of.as_deref().unwrap_or(&[])
    }

    pub fn any_of(&self) -> &[Schema] {
        self.any_of.as_deref().unwrap_or(&[])
    }

    /// The `x-*` extension bag
    pub fn extensions(&self) -> BTreeMap<String, Value> {
        self.extra
            .iter()
            .filter(|(k, _)| k.starts_with(EXTENSION_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Extract the simple name from a `$ref` value.
///
/// `#/components/schemas/Pet`, `#/definitions/Pet`, `common.json#/$defs/Pet`,
/// `models/Pet.schema.json` and `Pet` all yield `Pet`.
pub fn ref_name(reference: &str) -> &str {
    let trimmed = reference.trim_end_matches('#');
    let tail = trimmed
        .rsplit(|c| c == '/' || c == '#')
        .next()
        .unwrap_or(trimmed);
    let tail = tail.strip_suffix(".json").unwrap_or(tail);
    tail.strip_suffix(".schema").unwrap_or(tail)
}
