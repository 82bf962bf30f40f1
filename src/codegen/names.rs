//! Naming Conventions
//!
//! Pure string derivations used when building models and operations:
//! class names, variable names, file stems, API handler names and escaped
//! description text. Nothing here looks at schemas.

use regex::Regex;
use std::sync::OnceLock;

use super::config::NamingConfig;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid pattern"))
}

fn non_alphanumeric() -> &'static Regex {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    NON_ALNUM.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid pattern"))
}

// =============================================================================
// Case Conversion
// =============================================================================

/// Upper camel case: every alphanumeric run starts upper-case, the rest of
/// the run is kept as written (`pet_store-api` -> `PetStoreApi`,
/// `petId` -> `PetId`)
pub fn camelize(word: &str) -> String {
    let mut result = String::with_capacity(word.len());
    for part in non_alphanumeric().split(word).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Lower camel case (`pet_store` -> `petStore`)
pub fn camelize_lower(word: &str) -> String {
    let camel = camelize(word);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => camel,
    }
}

/// Replace every run of characters outside `[A-Za-z0-9_]` with `_`
pub fn sanitize_name(name: &str) -> String {
    let replaced = non_word().replace_all(name, "_");
    replaced.trim_matches('_').to_string()
}

/// Enum type name for a property (`status` -> `StatusEnum`)
pub fn to_enum_name(name: &str) -> String {
    format!("{}Enum", sanitize_name(&camelize(name)))
}

/// Canonical operation id (`list pets` -> `ListPets`)
pub fn to_operation_id(operation_id: &str) -> String {
    camelize(&sanitize_name(operation_id))
}

/// Escape free text for embedding in generated sources.
///
/// Tabs and line breaks become spaces, backslashes and double quotes are
/// escaped, and comment delimiters are broken up.
pub fn escape_text(input: &str) -> String {
    input
        .trim()
        .replace(['\t', '\n', '\r'], " ")
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("*/", "*_/")
        .replace("/*", "/_*")
}

// =============================================================================
// Naming
// =============================================================================

/// Identifier derivation driven by `NamingConfig`
#[derive(Debug, Clone)]
pub struct Naming {
    config: NamingConfig,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(NamingConfig::default())
    }
}

impl Naming {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.config.reserved_words.contains(&word.to_lowercase())
    }

    /// Class name of a model (`pet_store` -> `PetStore`, `class` -> `ModelClass`)
    pub fn model_name(&self, name: &str) -> String {
        let mut full = sanitize_name(name);
        if !self.config.model_name_prefix.is_empty() {
            full = format!("{}_{}", self.config.model_name_prefix, full);
        }
        if !self.config.model_name_suffix.is_empty() {
            full = format!("{}_{}", full, self.config.model_name_suffix);
        }

        let camelized = camelize(&full);
        if self.is_reserved(&camelized) || starts_with_digit(&camelized) {
            return format!("Model{}", camelized);
        }
        camelized
    }

    /// File stem of a model
    pub fn model_filename(&self, name: &str) -> String {
        self.model_name(name)
    }

    /// Variable name (`pet_id` -> `petId`, `class` -> `_class`)
    pub fn var_name(&self, name: &str) -> String {
        let sanitized = sanitize_name(name);

        // Constants stay as written
        if !sanitized.is_empty()
            && sanitized.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return sanitized;
        }

        let var = camelize_lower(&sanitized);
        if self.is_reserved(&var) || starts_with_digit(&var) {
            return format!("_{}", var);
        }
        var
    }

    /// Handler name for a tag (`pet store` -> `PetStoreHandler`)
    pub fn api_name(&self, tag: &str) -> String {
        if tag.is_empty() {
            return self.config.default_api_name.clone();
        }
        let sanitized = non_alphanumeric().replace_all(tag, "_");
        format!("{}{}", camelize(&sanitized), self.config.api_suffix)
    }

    /// Handler file stem for a tag
    pub fn api_filename(&self, tag: &str) -> String {
        if tag.is_empty() {
            return self.config.default_api_name.clone();
        }
        format!("{}{}", camelize(tag), self.config.api_suffix)
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}
