//! Codegen Configuration
//!
//! Settings the engine receives from its caller:
//! - Type mappings consulted for custom string formats
//! - Import mappings and container instantiation types for reference requirements
//! - Base imports for models and operations
//! - Naming conventions (prefix/suffix, reserved words)
//!
//! Everything here is plain data; loading it from files and the environment
//! is the job of `crate::config`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Global Configuration
// =============================================================================

/// Configuration for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Place required properties before optional ones (stable)
    #[serde(default = "default_true")]
    pub sort_params_by_required: bool,

    /// Imports every model requires
    #[serde(default = "default_model_imports")]
    pub model_imports: Vec<String>,

    /// Suffix of the per-model converter companion type
    #[serde(default = "default_converter_suffix")]
    pub converter_suffix: String,

    /// Imports required by every operation on top of the fixed three
    #[serde(default)]
    pub extra_operation_imports: Vec<String>,

    /// Base class for generated handlers
    #[serde(default = "default_parent_handler_class")]
    pub parent_handler_class: String,

    /// Import path of the handler base class
    #[serde(default)]
    pub parent_handler_import: String,

    /// String format -> custom type name
    #[serde(default)]
    pub type_mappings: BTreeMap<String, String>,

    /// Type name -> fully qualified import path
    #[serde(default = "default_import_mappings")]
    pub import_mappings: BTreeMap<String, String>,

    /// Container kind (`array`, `set`, `map`) -> instantiation type
    #[serde(default = "default_instantiation_types")]
    pub instantiation_types: BTreeMap<String, String>,

    /// Naming conventions
    #[serde(default)]
    pub naming: NamingConfig,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            sort_params_by_required: true,
            type_mappings: BTreeMap::new(),
            import_mappings: default_import_mappings(),
            instantiation_types: default_instantiation_types(),
            model_imports: default_model_imports(),
            converter_suffix: default_converter_suffix(),
            extra_operation_imports: Vec::new(),
            parent_handler_class: default_parent_handler_class(),
            parent_handler_import: String::new(),
            naming: NamingConfig::default(),
        }
    }
}

impl CodegenConfig {
    /// Instantiation type for a container kind
    pub fn instantiation_type(&self, container: &str) -> Option<&str> {
        self.instantiation_types.get(container).map(String::as_str)
    }

    /// Whether a non-model type name carries a reference requirement
    pub fn needs_import(&self, type_name: &str) -> bool {
        !type_name.is_empty() && self.import_mappings.contains_key(type_name)
    }
}

/// Naming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub model_name_prefix: String,

    #[serde(default)]
    pub model_name_suffix: String,

    /// Words that must be escaped in generated identifiers (compared lower-case)
    #[serde(default = "default_reserved_words")]
    pub reserved_words: BTreeSet<String>,

    /// API name used when an operation's tag is empty
    #[serde(default = "default_api_name")]
    pub default_api_name: String,

    /// Suffix appended to camelized tags to form handler names
    #[serde(default = "default_api_suffix")]
    pub api_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            model_name_prefix: String::new(),
            model_name_suffix: String::new(),
            reserved_words: default_reserved_words(),
            default_api_name: default_api_name(),
            api_suffix: default_api_suffix(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_import_mappings() -> BTreeMap<String, String> {
    [
        ("BigDecimal", "java.math.BigDecimal"),
        ("UUID", "java.util.UUID"),
        ("URI", "java.net.URI"),
        ("date", "java.time.LocalDate"),
        ("date-time", "java.time.OffsetDateTime"),
        ("file", "java.io.File"),
        ("binary", "java.io.File"),
        ("ArrayList", "java.util.ArrayList"),
        ("LinkedHashSet", "java.util.LinkedHashSet"),
        ("HashMap", "java.util.HashMap"),
        ("Objects", "java.util.Objects"),
        ("DataObject", "io.vertx.codegen.annotations.DataObject"),
        ("JsonObject", "io.vertx.core.json.JsonObject"),
        ("RoutingContext", "io.vertx.ext.web.RoutingContext"),
        ("RequestParameters", "io.vertx.ext.web.api.RequestParameters"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_instantiation_types() -> BTreeMap<String, String> {
    [("array", "ArrayList"), ("set", "LinkedHashSet"), ("map", "HashMap")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_model_imports() -> Vec<String> {
    vec!["DataObject".to_string(), "Objects".to_string(), "JsonObject".to_string()]
}

fn default_converter_suffix() -> String {
    "Converter".to_string()
}

fn default_parent_handler_class() -> String {
    "ParentHandlerClass".to_string()
}

fn default_api_name() -> String {
    "DefaultController".to_string()
}

fn default_api_suffix() -> String {
    "Handler".to_string()
}

fn default_reserved_words() -> BTreeSet<String> {
    [
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
        "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
        "interface", "long", "native", "new", "package", "private", "protected", "public",
        "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
        "throw", "throws", "transient", "try", "void", "volatile", "while",
        // literals and common clashes
        "true", "false", "null", "object", "list", "file", "localdate", "localdatetime",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
