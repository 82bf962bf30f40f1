//! Diagnostics
//!
//! Collects warnings and errors during a generation run. Expected oddities
//! in the input (unknown formats, `anyOf`, contradictory nullability) are
//! reported here instead of aborting, and fatal per-model failures are
//! mirrored here so a run report never drops anything silently.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ModelError;
use crate::schema::SchemaName;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Resolution (fatal for the model) ===
    /// $ref target not found in the document
    UnresolvedReference,
    /// Name requested again before its build produced a placeholder
    CyclicReference,
    /// Schema sits on a cyclic allOf parent chain
    CyclicInheritance,
    /// A parent or union arm failed to resolve
    DependencyFailed,

    // === Declarations ===
    /// Any-type schema explicitly marked `nullable: false`
    ContradictoryNullability,
    /// Numeric format the type inferrer does not know
    UnknownFormat,
    /// Type string the type inferrer does not know
    UnknownType,
    /// `required` lists a name that is not a declared property
    UndeclaredRequired,
    /// Properties declared on a schema classified as an alias
    AliasPropertiesIgnored,

    // === Composition ===
    /// anyOf is not implemented
    UnsupportedComposition,
    /// anyOf present next to oneOf and skipped in its favour
    IgnoredAnyOf,
    /// oneOf arms combined with inline shared properties
    MixedOneOfProperties,
    /// Several allOf references collapsed to the last one
    CollapsedInheritance,
    /// Union parent and member disagree about their link
    UnionLinkMismatch,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedReference => "E001",
            Self::CyclicReference => "E002",
            Self::CyclicInheritance => "E003",
            Self::DependencyFailed => "E004",
            Self::UnionLinkMismatch => "E005",
            Self::UnsupportedComposition => "W001",
            Self::UnknownFormat => "W002",
            Self::UnknownType => "W003",
            Self::MixedOneOfProperties => "W004",
            Self::CollapsedInheritance => "W005",
            Self::IgnoredAnyOf => "W006",
            Self::UndeclaredRequired => "W007",
            Self::AliasPropertiesIgnored => "W008",
            Self::ContradictoryNullability => "W009",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedReference
            | Self::CyclicReference
            | Self::CyclicInheritance
            | Self::DependencyFailed
            | Self::UnionLinkMismatch => Severity::Error,

            Self::UnsupportedComposition
            | Self::UnknownFormat
            | Self::UnknownType
            | Self::MixedOneOfProperties
            | Self::CollapsedInheritance
            | Self::IgnoredAnyOf
            | Self::UndeclaredRequired
            | Self::AliasPropertiesIgnored
            | Self::ContradictoryNullability => Severity::Warning,
        }
    }

    /// The code that reports a fatal resolution error
    pub fn for_error(error: &ModelError) -> Self {
        match error {
            ModelError::CyclicReference { .. } => Self::CyclicReference,
            ModelError::CyclicInheritance { .. } => Self::CyclicInheritance,
            ModelError::DependencyFailed { .. } => Self::DependencyFailed,
            _ => Self::UnresolvedReference,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Schema that caused this diagnostic
    pub schema: SchemaName,
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Additional context (related schemas, property names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(schema: impl Into<SchemaName>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            code,
            severity: code.severity(),
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code, self.severity, self.message, self.schema
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item, logging it at the matching level
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity {
            Severity::Error => tracing::error!(schema = %item.schema, code = %item.code, "{}", item.message),
            Severity::Warning => tracing::warn!(schema = %item.schema, code = %item.code, "{}", item.message),
        }
        self.items.push(item);
    }

    /// Add a diagnostic with the code's own severity
    pub fn report(
        &mut self,
        schema: impl Into<SchemaName>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticItem::new(schema, code, message));
    }

    /// Mirror a fatal resolution error
    pub fn failure(&mut self, schema: impl Into<SchemaName>, error: &ModelError) {
        let mut item = DiagnosticItem::new(schema, DiagnosticCode::for_error(error), error.to_string());
        match error {
            ModelError::CyclicReference { chain, .. } => {
                item = item.with_context(format!("Chain: {}", chain.join(" -> ")));
            }
            ModelError::CyclicInheritance { cycle, .. } => {
                item = item.with_context(format!("Cycle: {}", cycle.join(" -> ")));
            }
            _ => {}
        }
        self.push(item);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Diagnostics raised for one schema
    pub fn for_schema<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a DiagnosticItem> + 'a {
        self.items.iter().filter(move |i| i.schema == schema)
    }

    /// Whether any diagnostic with `code` was raised for `schema`
    pub fn has_code(&self, schema: &str, code: DiagnosticCode) -> bool {
        self.for_schema(schema).any(|i| i.code == code)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&item.to_string());
            output.push('\n');
        }

        if !self.items.is_empty() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
