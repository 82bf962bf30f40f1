//! Operation Mapping
//!
//! Derives the identifiers a template backend needs for each operation and
//! for each tag's handler artifacts. Pure string derivation; no schema is
//! resolved here.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::config::CodegenConfig;
use super::names::{camelize_lower, sanitize_name, to_operation_id, Naming};
use crate::graph::OperationDef;

/// Reference requirements every operation carries, whatever its schemas
pub const REQUIRED_OPERATION_IMPORTS: [&str; 3] = ["JsonObject", "RoutingContext", "RequestParameters"];

/// Tag given to operations that declare none
pub const DEFAULT_TAG: &str = "default";

pub const EXT_IS_GET: &str = "x-codegen-isget";
pub const EXT_PARENT_CLASS: &str = "x-codegen-parent-class";
pub const EXT_PARENT_IMPORT: &str = "x-codegen-parent-import";

// =============================================================================
// Artifacts
// =============================================================================

/// The three files generated per tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Interface,
    Implementation,
    Mock,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Interface, Self::Implementation, Self::Mock];
}

/// File stems of a tag's handler artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArtifacts {
    pub interface: String,
    pub implementation: String,
    pub mock: String,
}

impl ApiArtifacts {
    pub fn for_tag(tag: &str, naming: &Naming) -> Self {
        let stem = naming.api_filename(tag);
        Self {
            implementation: format!("{}Impl", stem),
            mock: format!("{}Mock", stem),
            interface: stem,
        }
    }

    pub fn stem(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Interface => &self.interface,
            ArtifactKind::Implementation => &self.implementation,
            ArtifactKind::Mock => &self.mock,
        }
    }

    /// Path relative to the API folder, without extension
    pub fn relative_path(&self, kind: ArtifactKind) -> String {
        match kind {
            ArtifactKind::Interface => self.interface.clone(),
            ArtifactKind::Implementation | ArtifactKind::Mock => format!("impl/{}", self.stem(kind)),
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Template-ready view of one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationModel {
    pub operation_id: String,
    pub nickname: String,
    pub http_method: String,
    pub path: String,
    /// Primary tag
    pub tag: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub deprecated: bool,
    pub imports: BTreeSet<String>,
    pub vendor_extensions: BTreeMap<String, Value>,
}

/// Operations sharing a tag, rendered into one handler
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub tag: String,
    pub api_name: String,
    pub artifacts: ApiArtifacts,
    pub operations: Vec<OperationModel>,
    pub imports: BTreeSet<String>,
}

/// Map one declared operation
pub fn map_operation(operation: &OperationDef, config: &CodegenConfig) -> OperationModel {
    let raw_id = operation
        .operation_id
        .clone()
        .unwrap_or_else(|| derive_operation_id(&operation.path, &operation.method));
    let tags = if operation.tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        operation.tags.clone()
    };

    let mut imports: BTreeSet<String> = REQUIRED_OPERATION_IMPORTS.iter().map(|s| s.to_string()).collect();
    imports.extend(config.extra_operation_imports.iter().cloned());

    let mut vendor_extensions = operation.extensions.clone();
    if operation.method.eq_ignore_ascii_case("GET") {
        vendor_extensions.insert(EXT_IS_GET.to_string(), Value::Bool(true));
    }
    vendor_extensions.insert(
        EXT_PARENT_CLASS.to_string(),
        Value::String(config.parent_handler_class.clone()),
    );
    let parent_import = if config.parent_handler_import.is_empty() {
        config.import_mappings.get(&config.parent_handler_class).cloned()
    } else {
        Some(config.parent_handler_import.clone())
    };
    vendor_extensions.insert(
        EXT_PARENT_IMPORT.to_string(),
        parent_import.map(Value::String).unwrap_or(Value::Null),
    );

    OperationModel {
        operation_id: to_operation_id(&raw_id),
        nickname: camelize_lower(&sanitize_name(&raw_id)),
        http_method: operation.method.to_uppercase(),
        path: operation.path.clone(),
        tag: tags[0].clone(),
        tags,
        summary: operation.summary.clone(),
        notes: operation.description.clone(),
        deprecated: operation.deprecated,
        imports,
        vendor_extensions,
    }
}

/// Map every operation and group them per tag.
///
/// An operation with several tags appears in each of their groups. Groups
/// come in order of first appearance.
pub fn map_operations(
    operations: &[OperationDef],
    config: &CodegenConfig,
    naming: &Naming,
) -> (Vec<OperationModel>, Vec<ApiGroup>) {
    let mapped: Vec<OperationModel> = operations.iter().map(|op| map_operation(op, config)).collect();

    let mut groups: Vec<ApiGroup> = Vec::new();
    for operation in &mapped {
        for tag in &operation.tags {
            let index = match groups.iter().position(|g| &g.tag == tag) {
                Some(index) => index,
                None => {
                    groups.push(ApiGroup {
                        tag: tag.clone(),
                        api_name: naming.api_name(tag),
                        artifacts: ApiArtifacts::for_tag(tag, naming),
                        operations: Vec::new(),
                        imports: BTreeSet::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[index];
            group.imports.extend(operation.imports.iter().cloned());
            group.operations.push(OperationModel {
                tag: tag.clone(),
                ..operation.clone()
            });
        }
    }

    tracing::debug!(operations = mapped.len(), groups = groups.len(), "Mapped operations");
    (mapped, groups)
}

/// `GET /pets/{petId}` -> `petsPetIdGet`
fn derive_operation_id(path: &str, method: &str) -> String {
    let words = format!("{} {}", path.replace(['{', '}'], ""), method.to_lowercase());
    camelize_lower(&words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(path: &str, method: &str, id: Option<&str>, tags: &[&str]) -> OperationDef {
        OperationDef {
            path: path.to_string(),
            method: method.to_string(),
            operation_id: id.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..OperationDef::default()
        }
    }

    #[test]
    fn test_artifact_stems() {
        let naming = Naming::default();
        let artifacts = ApiArtifacts::for_tag("pet store", &naming);
        assert_eq!(artifacts.interface, "PetStoreHandler");
        assert_eq!(artifacts.relative_path(ArtifactKind::Implementation), "impl/PetStoreHandlerImpl");
        assert_eq!(artifacts.relative_path(ArtifactKind::Mock), "impl/PetStoreHandlerMock");
        assert_eq!(artifacts.relative_path(ArtifactKind::Interface), "PetStoreHandler");

        let fallback = ApiArtifacts::for_tag("", &naming);
        assert_eq!(fallback.interface, "DefaultController");
        assert_eq!(fallback.stem(ArtifactKind::Mock), "DefaultControllerMock");
    }

    #[test]
    fn test_every_operation_requires_the_fixed_imports() {
        let config = CodegenConfig::default();
        let mapped = map_operation(&op("/pets", "POST", Some("addPet"), &["pets"]), &config);
        for import in REQUIRED_OPERATION_IMPORTS {
            assert!(mapped.imports.contains(import));
        }
        assert_eq!(mapped.operation_id, "AddPet");
        assert_eq!(mapped.nickname, "addPet");
    }

    #[test]
    fn test_vendor_extensions() {
        let config = CodegenConfig::default();
        let get = map_operation(&op("/pets", "GET", Some("listPets"), &[]), &config);
        assert_eq!(get.vendor_extensions.get(EXT_IS_GET), Some(&Value::Bool(true)));
        assert_eq!(
            get.vendor_extensions.get(EXT_PARENT_CLASS),
            Some(&Value::String("ParentHandlerClass".into()))
        );
        assert_eq!(get.vendor_extensions.get(EXT_PARENT_IMPORT), Some(&Value::Null));

        let post = map_operation(&op("/pets", "POST", Some("addPet"), &[]), &config);
        assert!(post.vendor_extensions.get(EXT_IS_GET).is_none());
    }

    #[test]
    fn test_missing_operation_id_is_derived() {
        let config = CodegenConfig::default();
        let mapped = map_operation(&op("/pets/{petId}", "GET", None, &[]), &config);
        assert_eq!(mapped.nickname, "petsPetIdGet");
        assert_eq!(mapped.operation_id, "PetsPetIdGet");
        assert_eq!(mapped.tag, DEFAULT_TAG);
    }

    #[test]
    fn test_grouping_by_tag() {
        let ops = vec![
            op("/pets", "GET", Some("listPets"), &["pets"]),
            op("/store", "GET", Some("inventory"), &["store", "pets"]),
            op("/health", "GET", Some("health"), &[]),
        ];
        let (mapped, groups) = map_operations(&ops, &CodegenConfig::default(), &Naming::default());
        assert_eq!(mapped.len(), 3);

        let tags: Vec<&str> = groups.iter().map(|g| g.tag.as_str()).collect();
        assert_eq!(tags, vec!["pets", "store", "default"]);
        assert_eq!(groups[0].operations.len(), 2);
        assert_eq!(groups[0].api_name, "PetsHandler");
        assert_eq!(groups[2].api_name, "DefaultHandler");
        assert_eq!(groups[0].operations[1].tag, "pets");
    }
}
