//! OAS Model Engine
//!
//! Resolves an OpenAPI / JSON Schema document into normalized,
//! template-ready models and operation descriptors.
//!
//! ## Features
//!
//! - **Type Inference**: schema shape + format -> target-neutral type tag
//! - **Alias Detection**: named wrappers of simple types become aliases
//! - **Property Classification**: required/optional and read-only/read-write views
//! - **Composition**: allOf single inheritance, oneOf unions, anyOf reported
//! - **Cycle Safety**: memoized, re-entrant resolution with cycle diagnostics
//! - **Per-Run State**: every run owns its cache, alias table and diagnostics
//!
//! ## Architecture
//!
//! ```text
//! SchemaDocument ──► Engine::run ──► ResolutionContext (one per run)
//!                                      ├── AliasTable      (built once, lazily)
//!                                      ├── ModelCache      (name -> Model)
//!                                      ├── Diagnostics
//!                                      └── TypeInferrer / PropertyClassifier / CompositionResolver
//!                                ──► GenerationReport { models, failures, operations, diagnostics }
//! ```
//!
//! ## Example
//!
//! ```
//! use oas_model_engine::{Engine, SchemaDocument};
//! use serde_json::json;
//!
//! let document = SchemaDocument::from_schema_map(json!({
//!     "Meters": {"type": "number"},
//!     "Pet": {"type": "object", "properties": {"height": {"$ref": "#/components/schemas/Meters"}}}
//! })).unwrap();
//!
//! let report = Engine::default().run(&document);
//! assert!(report.model("Meters").unwrap().is_alias);
//! assert_eq!(report.model("Pet").unwrap().all_properties.len(), 1);
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod schema;

pub use codegen::{
    CodegenConfig, Engine, GenerationReport, Model, Property, ResolutionContext, ResolutionFailure, TypeTag,
};
pub use config::EngineConfig;
pub use error::{ModelError, Result};
pub use graph::{load_document, Diagnostics, SchemaDocument};
pub use schema::Schema;
