//! Model Generation
//!
//! Turns a `SchemaDocument` into template-ready `Model` and operation
//! records.
//!
//! Architecture:
//! - Engine: long-lived, immutable. Holds the configuration and the three
//!   strategy traits (`TypeInferrer`, `PropertyClassifier`,
//!   `CompositionResolver`).
//! - ResolutionContext: created fresh for every run. Owns the model cache,
//!   the lazily built alias table and the diagnostics, so concurrent runs
//!   share nothing mutable.
//! - GenerationReport: everything one run produced, failures included.
//!
//! Resolution is depth-first and on demand: resolving a model resolves its
//! allOf parents and oneOf arms through the same context, which memoizes
//! every name.

pub mod aliases;
pub mod builder;
pub mod cache;
pub mod classify;
pub mod compose;
pub mod config;
pub mod infer;
pub mod model;
pub mod names;
pub mod operations;

pub use aliases::{is_alias_eligible, AliasTable};
pub use cache::{CacheEntry, ModelCache};
pub use classify::{DefaultPropertyClassifier, PropertyClassifier};
pub use compose::{CompositionResolver, DefaultCompositionResolver};
pub use config::{CodegenConfig, NamingConfig};
pub use infer::{DefaultTypeInferrer, Inference, InferenceNote, TypeInferrer, TypeTag};
pub use model::{ContainerKind, Model, Property};
pub use names::Naming;
pub use operations::{map_operations, ApiArtifacts, ApiGroup, ArtifactKind, OperationModel};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use crate::graph::{
    compute_inheritance_analysis, DiagnosticCode, Diagnostics, InheritanceAnalysis, RefIssue,
    SchemaDocument,
};
use crate::schema::{ref_name, Schema, SchemaName};

// =============================================================================
// Engine
// =============================================================================

/// Configured engine, reusable across runs and threads
pub struct Engine {
    config: CodegenConfig,
    naming: Naming,
    inferrer: Box<dyn TypeInferrer>,
    classifier: Box<dyn PropertyClassifier>,
    composer: Box<dyn CompositionResolver>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(CodegenConfig::default())
    }
}

impl Engine {
    /// Engine with the default strategies
    pub fn new(config: CodegenConfig) -> Self {
        Self {
            naming: Naming::new(config.naming.clone()),
            inferrer: Box::new(DefaultTypeInferrer::new(config.type_mappings.clone())),
            classifier: Box::new(DefaultPropertyClassifier),
            composer: Box::new(DefaultCompositionResolver),
            config,
        }
    }

    pub fn with_inferrer(mut self, inferrer: impl TypeInferrer + 'static) -> Self {
        self.inferrer = Box::new(inferrer);
        self
    }

    pub fn with_classifier(mut self, classifier: impl PropertyClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_composer(mut self, composer: impl CompositionResolver + 'static) -> Self {
        self.composer = Box::new(composer);
        self
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// A fresh resolution context over a document
    pub fn context<'a>(&'a self, document: &'a SchemaDocument) -> ResolutionContext<'a> {
        ResolutionContext {
            document,
            config: &self.config,
            naming: &self.naming,
            inferrer: self.inferrer.as_ref(),
            classifier: self.classifier.as_ref(),
            composer: self.composer.as_ref(),
            inheritance: compute_inheritance_analysis(document),
            aliases: OnceCell::new(),
            cache: ModelCache::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resolve every schema of the document and map its operations
    pub fn run(&self, document: &SchemaDocument) -> GenerationReport {
        let mut ctx = self.context(document);

        for name in document.names() {
            // Failures are recorded in the cache and the diagnostics
            let _ = ctx.resolve(name);
        }
        ctx.check_consistency();

        let (operations, api_groups) =
            map_operations(document.operations(), &self.config, &self.naming);

        let aliases = ctx.aliases().clone();
        let (cache, diagnostics) = ctx.into_parts();

        let mut models = Vec::new();
        let mut failures = Vec::new();
        for (name, entry) in cache.into_entries() {
            match entry {
                CacheEntry::Ready(model) => models.push(model),
                CacheEntry::Failed(error) => failures.push(ResolutionFailure::new(name, error)),
                CacheEntry::Pending | CacheEntry::Building(_) => {}
            }
        }

        tracing::info!(
            models = models.len(),
            failures = failures.len(),
            operations = operations.len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "Generation run complete"
        );

        GenerationReport {
            title: document.info().title.clone(),
            version: document.info().version.clone(),
            models,
            failures,
            operations,
            api_groups,
            aliases,
            diagnostics,
            fingerprint: document.fingerprint().to_string(),
            generated_at: Utc::now(),
            import_mappings: self.config.import_mappings.clone(),
        }
    }
}

// =============================================================================
// Resolution Context
// =============================================================================

/// All mutable state of one run
pub struct ResolutionContext<'a> {
    document: &'a SchemaDocument,
    config: &'a CodegenConfig,
    naming: &'a Naming,
    inferrer: &'a dyn TypeInferrer,
    classifier: &'a dyn PropertyClassifier,
    composer: &'a dyn CompositionResolver,
    inheritance: InheritanceAnalysis,
    aliases: OnceCell<AliasTable>,
    cache: ModelCache,
    diagnostics: Diagnostics,
}

impl<'a> ResolutionContext<'a> {
    pub fn document(&self) -> &'a SchemaDocument {
        self.document
    }

    pub fn config(&self) -> &'a CodegenConfig {
        self.config
    }

    pub fn naming(&self) -> &'a Naming {
        self.naming
    }

    pub fn inferrer(&self) -> &'a dyn TypeInferrer {
        self.inferrer
    }

    pub fn classifier(&self) -> &'a dyn PropertyClassifier {
        self.classifier
    }

    pub fn composer(&self) -> &'a dyn CompositionResolver {
        self.composer
    }

    pub fn inheritance(&self) -> &InheritanceAnalysis {
        &self.inheritance
    }

    /// The alias table, built on first use
    pub fn aliases(&self) -> &AliasTable {
        self.aliases
            .get_or_init(|| AliasTable::build(self.document, self.inferrer))
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Infer a tag, reporting any inference note against `subject`
    pub fn infer(&mut self, subject: &str, schema: &Schema) -> TypeTag {
        let inference = self.inferrer.infer(schema);
        if let Some(note) = &inference.note {
            self.diagnostics.report(subject, note.code(), note.message());
        }
        inference.tag
    }

    /// Resolve a named schema of the document
    pub fn resolve(&mut self, name: &str) -> Result<Model> {
        let document = self.document;
        match document.get(name) {
            Some(schema) => self.get_or_build(name, schema),
            None => Err(ModelError::UnresolvedReference {
                schema: name.to_string(),
                reference: name.to_string(),
            }),
        }
    }

    /// Resolve a schema under a given name; inline schemas get synthetic names
    pub fn resolve_schema(&mut self, name: &str, schema: &Schema) -> Result<Model> {
        self.get_or_build(name, schema)
    }

    /// Resolve the target of a `$ref` on behalf of `requester`.
    ///
    /// Errors are re-attributed to the requester: a missing target is an
    /// unresolved reference of the requester, a failed target makes the
    /// requester fail as a dependent.
    pub fn resolve_reference(&mut self, requester: &str, reference: &str) -> Result<Model> {
        let target = ref_name(reference);
        if !self.document.contains(target) {
            return Err(ModelError::UnresolvedReference {
                schema: requester.to_string(),
                reference: target.to_string(),
            });
        }
        self.resolve(target).map_err(|error| match error {
            ModelError::CyclicReference { chain, .. } => ModelError::CyclicReference {
                schema: requester.to_string(),
                chain,
            },
            _ => ModelError::DependencyFailed {
                schema: requester.to_string(),
                dependency: target.to_string(),
            },
        })
    }

    /// Memoized build: each name is built at most once per run
    pub fn get_or_build(&mut self, name: &str, schema: &Schema) -> Result<Model> {
        if let Some(cached) = self.cache.lookup(name) {
            return cached;
        }

        self.cache.begin(name);
        tracing::debug!(schema = %name, "Building model");

        match builder::build_model(self, name, schema) {
            Ok(model) => Ok(self.cache.finish(model)),
            Err(error) => {
                self.diagnostics.failure(name, &error);
                self.cache.fail(name, error.clone());
                Err(error)
            }
        }
    }

    /// Expose a partially built model to re-entrant requests
    pub fn publish(&mut self, model: &Model) {
        self.cache.publish(model);
    }

    /// Link a union arm to its parent
    pub fn register_interface(&mut self, child: &str, parent: &str) {
        let parent_classname = self.naming.model_name(parent);
        self.cache.register_interface(child, parent, &parent_classname);
    }

    /// Report union links and parents that do not line up.
    ///
    /// Only reads the cache; models are never changed here.
    pub fn check_consistency(&mut self) {
        let mut issues: Vec<(SchemaName, DiagnosticCode, String)> = Vec::new();

        for model in self.cache.models() {
            for member in &model.union_members {
                let linked = self
                    .cache
                    .get(member)
                    .map(|child| child.interfaces.contains(&model.name));
                if linked == Some(false) {
                    issues.push((
                        model.name.clone(),
                        DiagnosticCode::UnionLinkMismatch,
                        format!("Union member '{}' does not implement '{}'", member, model.name),
                    ));
                }
            }
            for interface in &model.interfaces {
                let listed = self
                    .cache
                    .get(interface)
                    .map(|parent| parent.union_members.contains(&model.name));
                if listed == Some(false) {
                    issues.push((
                        model.name.clone(),
                        DiagnosticCode::UnionLinkMismatch,
                        format!("'{}' implements '{}' but is not one of its members", model.name, interface),
                    ));
                }
            }
            if let Some(parent) = &model.parent_name {
                if self.cache.get(parent).is_none() {
                    issues.push((
                        model.name.clone(),
                        DiagnosticCode::UnresolvedReference,
                        format!("Parent '{}' was not built in this run", parent),
                    ));
                }
            }
        }

        for (schema, code, message) in issues {
            self.diagnostics.report(schema, code, message);
        }
    }

    /// Finish the run, handing back the cache and the diagnostics
    pub fn into_parts(self) -> (ModelCache, Diagnostics) {
        (self.cache, self.diagnostics)
    }
}

/// Map a failed `$ref` walk to the error of the schema being built
pub(crate) fn ref_issue_error(schema: &str, issue: RefIssue) -> ModelError {
    match issue {
        RefIssue::Missing(reference) => ModelError::UnresolvedReference {
            schema: schema.to_string(),
            reference,
        },
        RefIssue::Cycle(chain) => ModelError::CyclicReference {
            schema: schema.to_string(),
            chain,
        },
    }
}

// =============================================================================
// Report
// =============================================================================

/// A schema whose model could not be built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionFailure {
    pub schema: SchemaName,
    pub message: String,
    #[serde(skip)]
    pub error: ModelError,
}

impl ResolutionFailure {
    fn new(schema: SchemaName, error: ModelError) -> Self {
        Self {
            schema,
            message: error.to_string(),
            error,
        }
    }
}

/// Output of one generation run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Models in the order they were first requested
    pub models: Vec<Model>,
    pub failures: Vec<ResolutionFailure>,
    pub operations: Vec<OperationModel>,
    pub api_groups: Vec<ApiGroup>,
    pub aliases: AliasTable,
    pub diagnostics: Diagnostics,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    /// Type name -> import path, for rendering the requirement lists
    pub import_mappings: BTreeMap<String, String>,
}

impl GenerationReport {
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn failure(&self, name: &str) -> Option<&ResolutionFailure> {
        self.failures.iter().find(|f| f.schema == name)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.diagnostics.has_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> SchemaDocument {
        SchemaDocument::from_schema_map(json!({
            "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Broken": {"type": "object", "properties": {"owner": {"$ref": "#/components/schemas/Owner"}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_is_memoized() {
        let engine = Engine::default();
        let doc = document();
        let mut ctx = engine.context(&doc);

        let first = ctx.resolve("Pet").unwrap();
        let second = ctx.resolve("Pet").unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.cache().build_count("Pet"), 1);
    }

    #[test]
    fn test_failure_is_cached_and_reported() {
        let engine = Engine::default();
        let doc = document();
        let mut ctx = engine.context(&doc);

        let error = ctx.resolve("Broken").unwrap_err();
        assert_eq!(
            error,
            ModelError::UnresolvedReference { schema: "Broken".into(), reference: "Owner".into() }
        );
        assert!(ctx.resolve("Broken").is_err());
        assert_eq!(ctx.cache().build_count("Broken"), 1);
        assert!(ctx.diagnostics().has_code("Broken", DiagnosticCode::UnresolvedReference));
    }

    #[test]
    fn test_unknown_name() {
        let engine = Engine::default();
        let doc = document();
        let mut ctx = engine.context(&doc);
        assert!(matches!(
            ctx.resolve("Ghost"),
            Err(ModelError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_reference_failures_are_attributed_to_requester() {
        let engine = Engine::default();
        let doc = document();
        let mut ctx = engine.context(&doc);

        assert_eq!(
            ctx.resolve_reference("Owner", "#/components/schemas/Broken").unwrap_err(),
            ModelError::DependencyFailed { schema: "Owner".into(), dependency: "Broken".into() }
        );
        assert_eq!(
            ctx.resolve_reference("Pet", "#/components/schemas/Nowhere").unwrap_err(),
            ModelError::UnresolvedReference { schema: "Pet".into(), reference: "Nowhere".into() }
        );
    }

    #[test]
    fn test_run_report() {
        let report = Engine::default().run(&document());
        assert!(report.model("Pet").is_some());
        assert!(report.failure("Broken").is_some());
        assert!(!report.is_clean());
        assert_eq!(report.fingerprint, document().fingerprint());
    }
}
