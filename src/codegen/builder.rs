//! Model Builder
//!
//! Builds the `Model` of one named schema. Called through
//! `ResolutionContext::get_or_build`, which takes care of memoization; this
//! module only knows how to turn a schema into a model.

use super::aliases::is_alias_eligible;
use super::classify::type_name;
use super::model::Model;
use super::names::escape_text;
use super::{ref_issue_error, ResolutionContext};
use crate::error::{ModelError, Result};
use crate::graph::patterns::{detect_kind, is_any_type, is_array_schema, is_composed_schema, is_map_schema, is_set_schema};
use crate::graph::DiagnosticCode;
use crate::schema::{AdditionalProperties, Schema};

/// Build the model for `name` from its schema as written in the document
pub fn build_model(ctx: &mut ResolutionContext<'_>, name: &str, raw: &Schema) -> Result<Model> {
    if let Some(cycle) = ctx.inheritance().cycle_of(name) {
        return Err(ModelError::CyclicInheritance {
            schema: name.to_string(),
            cycle: cycle.to_vec(),
        });
    }

    let document = ctx.document();
    let config = ctx.config();
    let naming = ctx.naming();

    let schema = document
        .unalias(raw)
        .map_err(|issue| ref_issue_error(name, issue))?;

    let mut model = Model::new(name, naming);
    describe(&mut model, raw, schema)?;

    // === Type data ===
    let tag = ctx.infer(name, schema);
    model.data_type = match schema.ref_name() {
        Some(target) => naming.model_name(target),
        None => tag.to_string(),
    };
    model.is_numeric = tag.is_numeric();
    model.is_enum = schema.has_enum();
    model.allowable_values = schema.enum_values.clone().unwrap_or_default();

    let listed_alias = ctx.aliases().get(name).cloned();
    model.is_alias = listed_alias.is_some() || is_alias_eligible(schema);
    if model.is_alias {
        model.alias_target_type = Some(listed_alias.unwrap_or_else(|| tag.clone()));
    }

    // === Nullability ===
    if is_any_type(schema) {
        if schema.nullable == Some(false) {
            ctx.diagnostics_mut().report(
                name,
                DiagnosticCode::ContradictoryNullability,
                "Schema accepts any value but declares nullable: false; left non-nullable",
            );
        } else {
            model.is_nullable = true;
        }
    } else if raw.declares_nullable() || schema.declares_nullable() {
        model.is_nullable = true;
    }

    // === Containers ===
    model.is_map_model = is_map_schema(schema);
    match &schema.additional_properties {
        Some(AdditionalProperties::Bool(true)) => model.is_additional_properties_true = true,
        Some(AdditionalProperties::Schema(value)) => {
            model.additional_properties_type = Some(type_name(ctx, name, value)?);
        }
        Some(AdditionalProperties::Bool(false)) | None => {}
    }

    if is_array_schema(schema) {
        model.is_array_model = true;
        let items = schema.items.as_deref().cloned().unwrap_or_default();
        let item_type = type_name(ctx, name, &items)?;

        let kind = if is_set_schema(schema) { "set" } else { "array" };
        if let Some(instantiation) = config.instantiation_type(kind) {
            model.container_parent = Some(format!("{}<{}>", instantiation, item_type));
            model.add_import(instantiation);
        }
        if items.ref_name().is_some_and(|target| target != name) {
            model.add_import(item_type.clone());
        }
        model.array_model_type = Some(item_type);
    }

    // Re-entrant requests from here on get this placeholder
    ctx.publish(&model);

    // === Properties ===
    if is_composed_schema(schema) {
        let composer = ctx.composer();
        composer.resolve(ctx, schema, &mut model)?;
    } else if model.is_alias {
        if !schema.properties.is_empty() {
            ctx.diagnostics_mut().report(
                name,
                DiagnosticCode::AliasPropertiesIgnored,
                format!(
                    "Alias of {} declares {} propert(ies); they are ignored",
                    model.data_type,
                    schema.properties.len()
                ),
            );
        }
    } else {
        let classifier = ctx.classifier();
        classifier.classify(ctx, &mut model, &schema.properties, &schema.required)?;
    }

    let classifier = ctx.classifier();
    classifier.post_process(ctx, &mut model);
    model.dedupe_properties();
    model.refresh_partitions();
    if config.sort_params_by_required {
        model.sort_required_first();
        model.refresh_partitions();
    }

    // === Model requirements ===
    for import in &config.model_imports {
        model.add_import(import.clone());
    }
    if !model.is_alias && !model.is_enum {
        model.add_import(format!("{}{}", model.classname, config.converter_suffix));
    }

    tracing::debug!(
        schema = %name,
        kind = ?detect_kind(raw),
        properties = model.all_properties.len(),
        alias = model.is_alias,
        parent = ?model.parent_name,
        "Built model"
    );

    Ok(model)
}

/// Copy descriptive metadata. The raw schema wins over its `$ref` target.
fn describe(model: &mut Model, raw: &Schema, schema: &Schema) -> Result<()> {
    let title = raw.title.as_deref().or(schema.title.as_deref());
    let description = raw.description.as_deref().or(schema.description.as_deref());

    model.title = title.map(escape_text);
    model.description = description.map(escape_text);
    model.unescaped_description = description.map(str::to_string);
    model.deprecated = raw.deprecated.or(schema.deprecated) == Some(true);
    model.external_docs = raw.external_docs.clone().or_else(|| schema.external_docs.clone());
    model.xml = raw.xml.clone().or_else(|| schema.xml.clone());

    let mut extensions = schema.extensions();
    extensions.extend(raw.extensions());
    model.vendor_extensions = extensions;

    model.model_json = serde_json::to_string_pretty(raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{Engine, TypeTag};
    use crate::graph::SchemaDocument;
    use serde_json::json;

    fn build(value: serde_json::Value, name: &str) -> (Result<Model>, crate::graph::Diagnostics) {
        let engine = Engine::default();
        let doc = SchemaDocument::from_schema_map(value).unwrap();
        let mut ctx = engine.context(&doc);
        let result = ctx.resolve(name);
        let (_, diagnostics) = ctx.into_parts();
        (result, diagnostics)
    }

    #[test]
    fn test_metadata_is_escaped_and_preserved() {
        let (model, _) = build(
            json!({"Pet": {
                "type": "object",
                "title": "A \"pet\"",
                "description": "Line one\nline two",
                "deprecated": true,
                "x-owner": "team-a",
                "properties": {"name": {"type": "string"}}
            }}),
            "Pet",
        );
        let model = model.unwrap();
        assert_eq!(model.title.as_deref(), Some("A \\\"pet\\\""));
        assert_eq!(model.description.as_deref(), Some("Line one line two"));
        assert_eq!(model.unescaped_description.as_deref(), Some("Line one\nline two"));
        assert!(model.deprecated);
        assert_eq!(model.vendor_extensions.get("x-owner"), Some(&json!("team-a")));
        assert!(model.model_json.contains("\"x-owner\""));
    }

    #[test]
    fn test_any_type_is_nullable() {
        let (model, diagnostics) = build(json!({"Anything": {"description": "free"}}), "Anything");
        let model = model.unwrap();
        assert!(model.is_nullable);
        assert!(model.is_alias);
        assert_eq!(model.alias_target_type, Some(TypeTag::AnyType));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_contradictory_nullability_is_reported_not_fixed() {
        let (model, diagnostics) = build(json!({"Anything": {"nullable": false}}), "Anything");
        assert!(!model.unwrap().is_nullable);
        assert!(diagnostics.has_code("Anything", DiagnosticCode::ContradictoryNullability));
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_array_model_wrapper() {
        let (model, _) = build(
            json!({
                "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
                "Pets": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
                "Tags": {"type": "array", "uniqueItems": true, "items": {"type": "string"}}
            }),
            "Pets",
        );
        let pets = model.unwrap();
        assert!(pets.is_array_model);
        assert_eq!(pets.array_model_type.as_deref(), Some("Pet"));
        assert_eq!(pets.container_parent.as_deref(), Some("ArrayList<Pet>"));
        assert!(pets.imports.contains("Pet"));
        assert!(pets.imports.contains("ArrayList"));

        let (tags, _) = build(
            json!({"Tags": {"type": "array", "uniqueItems": true, "items": {"type": "string"}}}),
            "Tags",
        );
        assert_eq!(tags.unwrap().container_parent.as_deref(), Some("LinkedHashSet<string>"));
    }

    #[test]
    fn test_map_model() {
        let (model, _) = build(
            json!({"Labels": {"type": "object", "additionalProperties": {"type": "integer"}}}),
            "Labels",
        );
        let model = model.unwrap();
        assert!(model.is_map_model);
        assert!(!model.is_additional_properties_true);
        assert_eq!(model.additional_properties_type.as_deref(), Some("integer"));
        assert!(!model.is_alias);
    }

    #[test]
    fn test_alias_with_properties_ignores_them() {
        let (model, diagnostics) = build(
            json!({"Code": {"type": "string", "properties": {"x": {"type": "string"}}}}),
            "Code",
        );
        let model = model.unwrap();
        assert!(model.is_alias);
        assert!(model.own_properties.is_empty());
        assert!(diagnostics.has_code("Code", DiagnosticCode::AliasPropertiesIgnored));
    }

    #[test]
    fn test_reference_alias_keeps_model_name() {
        let (model, _) = build(
            json!({
                "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
                "Animal": {"$ref": "#/components/schemas/Pet"}
            }),
            "Animal",
        );
        let model = model.unwrap();
        assert!(model.is_alias);
        assert_eq!(model.data_type, "Pet");
        assert!(model.parent_name.is_none());
    }

    #[test]
    fn test_model_requirements() {
        let (pet, _) = build(
            json!({"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}),
            "Pet",
        );
        let pet = pet.unwrap();
        for import in ["DataObject", "Objects", "JsonObject", "PetConverter"] {
            assert!(pet.imports.contains(import), "missing {}", import);
        }

        let (color, _) = build(json!({"Color": {"type": "string", "enum": ["RED"]}}), "Color");
        let color = color.unwrap();
        assert!(color.imports.contains("DataObject"));
        assert!(!color.imports.contains("ColorConverter"));
    }

    #[test]
    fn test_required_first_is_stable() {
        let (model, _) = build(
            json!({"Pet": {
                "type": "object",
                "required": ["d", "b"],
                "properties": {
                    "a": {"type": "string"},
                    "b": {"type": "string"},
                    "c": {"type": "string"},
                    "d": {"type": "string"}
                }
            }}),
            "Pet",
        );
        let names: Vec<String> = model
            .unwrap()
            .all_properties
            .iter()
            .map(|p| p.base_name.clone())
            .collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_cyclic_inheritance_fails() {
        let (model, diagnostics) = build(
            json!({
                "A": {"allOf": [{"$ref": "#/components/schemas/B"}]},
                "B": {"allOf": [{"$ref": "#/components/schemas/A"}]}
            }),
            "A",
        );
        assert!(matches!(model, Err(ModelError::CyclicInheritance { .. })));
        assert!(diagnostics.has_code("A", DiagnosticCode::CyclicInheritance));
    }
}
