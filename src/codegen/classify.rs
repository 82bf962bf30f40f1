//! Property Classification
//!
//! Turns a schema's `properties` into `Property` records on a model and
//! keeps the model's partitions (required/optional, read-only/read-write)
//! in sync with the merged property view.
//!
//! Property references never trigger a model build: a `$ref` property only
//! needs the target's class name, so classification cannot recurse.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use super::infer::TypeTag;
use super::model::{ContainerKind, Model, Property};
use super::names::{camelize, escape_text, to_enum_name};
use super::{ref_issue_error, ResolutionContext};
use crate::error::Result;
use crate::graph::DiagnosticCode;
use crate::schema::{AdditionalProperties, Schema, SchemaName};

/// Property set -> model property views
pub trait PropertyClassifier: Send + Sync {
    /// Build one property owned by the model `owner`
    fn property(
        &self,
        ctx: &mut ResolutionContext<'_>,
        owner: &str,
        name: &str,
        schema: &Schema,
    ) -> Result<Property>;

    /// Add `properties` as own properties of `model` and recompute its
    /// partitions over the merged view
    fn classify(
        &self,
        ctx: &mut ResolutionContext<'_>,
        model: &mut Model,
        properties: &IndexMap<String, Schema>,
        required: &[String],
    ) -> Result<()>;

    /// Propagate reference requirements from properties to the model.
    /// Running it twice changes nothing.
    fn post_process(&self, ctx: &ResolutionContext<'_>, model: &mut Model);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyClassifier;

impl PropertyClassifier for DefaultPropertyClassifier {
    fn property(
        &self,
        ctx: &mut ResolutionContext<'_>,
        owner: &str,
        name: &str,
        schema: &Schema,
    ) -> Result<Property> {
        self.property_in_chain(ctx, owner, name, schema, &mut Vec::new())
    }

    fn classify(
        &self,
        ctx: &mut ResolutionContext<'_>,
        model: &mut Model,
        properties: &IndexMap<String, Schema>,
        required: &[String],
    ) -> Result<()> {
        for (name, schema) in properties {
            let property = self.property(ctx, &model.name, name, schema)?;
            model.imports.extend(property.imports.iter().cloned());
            model.upsert_own(property);
        }

        for name in required {
            if model.property(name).is_some() {
                model.required_names.insert(name.clone());
                model.all_required_names.insert(name.clone());
            } else {
                ctx.diagnostics_mut().report(
                    &model.name,
                    DiagnosticCode::UndeclaredRequired,
                    format!("Required property '{}' is not declared", name),
                );
            }
        }

        model.refresh_partitions();
        Ok(())
    }

    fn post_process(&self, ctx: &ResolutionContext<'_>, model: &mut Model) {
        let config = ctx.config();
        let mut imports: BTreeSet<String> = BTreeSet::new();

        for property in model.own_properties.iter().chain(model.all_properties.iter()) {
            imports.extend(property.imports.iter().cloned());

            // Union parents leave container instantiation to their arms
            if property.is_container && model.union_members.is_empty() {
                let kinds = property.levels().filter_map(|level| level.container_type);
                for kind in kinds {
                    if let Some(instantiation) = config.instantiation_type(kind.as_str()) {
                        imports.insert(instantiation.to_string());
                    }
                }
            }
        }

        for import in imports {
            model.add_import(import);
        }
    }
}

impl DefaultPropertyClassifier {
    /// `chain` holds the names already unaliased on the way down the item
    /// chain; a repeat is emitted as a reference to that model.
    fn property_in_chain(
        &self,
        ctx: &mut ResolutionContext<'_>,
        owner: &str,
        name: &str,
        schema: &Schema,
        chain: &mut Vec<SchemaName>,
    ) -> Result<Property> {
        let document = ctx.document();
        let naming = ctx.naming();
        let config = ctx.config();

        let repeated = schema.ref_name().filter(|r| chain.iter().any(|seen| seen == r));
        let target = match repeated {
            Some(_) => schema,
            None => document
                .unalias(schema)
                .map_err(|issue| ref_issue_error(owner, issue))?,
        };
        if let Some(reference) = schema.ref_name() {
            if target.ref_name().is_none() {
                chain.push(reference.to_string());
            }
        }

        let mut property = Property {
            base_name: name.to_string(),
            name: camelize(name),
            var_name: naming.var_name(name),
            type_tag: TypeTag::Object,
            data_type: String::new(),
            complex_type: None,
            container_type: None,
            is_container: false,
            items: None,
            required: false,
            read_only: schema.read_only.or(target.read_only) == Some(true),
            nullable: schema.declares_nullable() || target.declares_nullable(),
            is_enum: false,
            enum_values: Vec::new(),
            enum_name: None,
            description: schema
                .description
                .as_deref()
                .or(target.description.as_deref())
                .map(escape_text),
            imports: BTreeSet::new(),
            vendor_extensions: schema.extensions(),
        };

        if let Some(target_name) = target.ref_name() {
            // Reference to a model of its own (object, enum or composition)
            let classname = naming.model_name(target_name);
            property.data_type = classname.clone();
            property.imports.insert(classname.clone());
            property.complex_type = Some(classname);
            return Ok(property);
        }

        let tag = ctx.infer(owner, target);
        property.data_type = tag.to_string();
        property.is_enum = target.has_enum();
        property.enum_values = target.enum_values.clone().unwrap_or_default();
        if property.is_enum {
            property.enum_name = Some(to_enum_name(name));
        }

        if let Some(kind) = ContainerKind::from_tag(&tag) {
            let inner = match kind {
                ContainerKind::Array | ContainerKind::Set => target.items.as_deref().cloned(),
                ContainerKind::Map => match &target.additional_properties {
                    Some(AdditionalProperties::Schema(value)) => Some((**value).clone()),
                    _ => None,
                },
            }
            .unwrap_or_default();

            let items = self.property_in_chain(ctx, owner, name, &inner, chain)?;
            property.imports.extend(items.imports.iter().cloned());
            property.container_type = Some(kind);
            property.is_container = true;
            property.items = Some(Box::new(items));
        } else if config.needs_import(tag.as_str()) {
            property.imports.insert(tag.to_string());
        }

        property.type_tag = tag;
        Ok(property)
    }
}

/// Type name used for a schema in another model's signature: the model
/// class name for references, the inferred tag otherwise
pub fn type_name(ctx: &mut ResolutionContext<'_>, owner: &str, schema: &Schema) -> Result<String> {
    if schema.ref_name() == Some(owner) {
        return Ok(ctx.naming().model_name(owner));
    }
    let target = ctx
        .document()
        .unalias(schema)
        .map_err(|issue| ref_issue_error(owner, issue))?;
    match target.ref_name() {
        Some(name) => Ok(ctx.naming().model_name(name)),
        None => Ok(ctx.infer(owner, target).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Engine;
    use crate::graph::SchemaDocument;
    use serde_json::json;

    fn document() -> SchemaDocument {
        SchemaDocument::from_schema_map(json!({
            "Meters": {"type": "number"},
            "Owner": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Pet": {
                "type": "object",
                "required": ["id", "ghost"],
                "properties": {
                    "id": {"type": "string", "format": "uuid", "readOnly": true},
                    "owner": {"$ref": "#/components/schemas/Owner"},
                    "height": {"$ref": "#/components/schemas/Meters"},
                    "grid": {
                        "type": "array",
                        "items": {"type": "array", "items": {"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Owner"}}}
                    },
                    "status": {"type": "string", "enum": ["available", "sold"]}
                }
            }
        }))
        .unwrap()
    }

    fn classified() -> (Model, crate::graph::Diagnostics) {
        let engine = Engine::default();
        let doc = document();
        let mut ctx = engine.context(&doc);
        let schema = doc.get("Pet").unwrap();
        let mut model = Model::new("Pet", ctx.naming());
        DefaultPropertyClassifier
            .classify(&mut ctx, &mut model, &schema.properties, &schema.required)
            .unwrap();
        DefaultPropertyClassifier.post_process(&ctx, &mut model);
        let (_, diagnostics) = ctx.into_parts();
        (model, diagnostics)
    }

    #[test]
    fn test_reference_and_alias_properties() {
        let (model, _) = classified();
        let owner = model.property("owner").unwrap();
        assert_eq!(owner.complex_type.as_deref(), Some("Owner"));
        assert_eq!(owner.data_type, "Owner");

        // aliases are replaced by their target type
        let height = model.property("height").unwrap();
        assert_eq!(height.type_tag, TypeTag::Number);
        assert!(height.complex_type.is_none());
    }

    #[test]
    fn test_nested_containers_register_every_level() {
        let (model, _) = classified();
        let grid = model.property("grid").unwrap();
        let kinds: Vec<_> = grid.levels().filter_map(|p| p.container_type).collect();
        assert_eq!(kinds, vec![ContainerKind::Array, ContainerKind::Array, ContainerKind::Map]);
        assert_eq!(grid.innermost().complex_type.as_deref(), Some("Owner"));
        assert!(grid.imports.contains("Owner"));

        assert!(model.imports.contains("Owner"));
        assert!(model.imports.contains("ArrayList"));
        assert!(model.imports.contains("HashMap"));
        assert!(model.imports.contains("UUID"));
    }

    #[test]
    fn test_required_and_read_only_flags() {
        let (model, diagnostics) = classified();
        let id = model.property("id").unwrap();
        assert!(id.required && id.read_only);
        assert!(!model.property("owner").unwrap().required);
        assert!(model.required_names.contains("id"));
        assert!(!model.required_names.contains("ghost"));
        assert!(diagnostics.has_code("Pet", DiagnosticCode::UndeclaredRequired));
        assert!(!model.has_only_read_only);
    }

    #[test]
    fn test_inline_enum_property() {
        let (model, _) = classified();
        let status = model.property("status").unwrap();
        assert!(status.is_enum);
        assert_eq!(status.enum_values, vec![json!("available"), json!("sold")]);
        assert_eq!(status.enum_name.as_deref(), Some("StatusEnum"));
        assert!(model.property("owner").unwrap().enum_name.is_none());
        assert!(model.has_enums);
    }

    #[test]
    fn test_post_process_is_idempotent() {
        let engine = Engine::default();
        let doc = document();
        let ctx = engine.context(&doc);
        let (mut model, _) = classified();
        let before = model.imports.clone();
        DefaultPropertyClassifier.post_process(&ctx, &mut model);
        assert_eq!(model.imports, before);
    }

    #[test]
    fn test_union_parent_skips_container_instantiation() {
        let engine = Engine::default();
        let doc = document();
        let ctx = engine.context(&doc);
        let (mut model, _) = classified();
        model.imports.clear();
        model.union_members.insert("Cat".to_string());
        DefaultPropertyClassifier.post_process(&ctx, &mut model);
        assert!(!model.imports.contains("ArrayList"));
        assert!(model.imports.contains("Owner"));
    }

    #[test]
    fn test_self_referencing_map_stops_at_the_repeat() {
        let report = Engine::default().run(
            &SchemaDocument::from_schema_map(json!({
                "Tree": {"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Tree"}},
                "Config": {"type": "object", "properties": {"settings": {"$ref": "#/components/schemas/Tree"}}}
            }))
            .unwrap(),
        );
        let settings = report.model("Config").unwrap().property("settings").unwrap();
        assert_eq!(settings.container_type, Some(ContainerKind::Map));
        let value = settings.items.as_deref().unwrap();
        assert_eq!(value.complex_type.as_deref(), Some("Tree"));
        assert!(value.items.is_none());
        assert!(report.model("Config").unwrap().imports.contains("Tree"));
        assert_eq!(report.model("Tree").unwrap().additional_properties_type.as_deref(), Some("Tree"));
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_self_referencing_array_stops_at_the_repeat() {
        let report = Engine::default().run(
            &SchemaDocument::from_schema_map(json!({
                "Nested": {"type": "array", "items": {"$ref": "#/components/schemas/Nested"}},
                "Holder": {"type": "object", "properties": {"n": {"$ref": "#/components/schemas/Nested"}}}
            }))
            .unwrap(),
        );
        let n = report.model("Holder").unwrap().property("n").unwrap();
        assert_eq!(n.container_type, Some(ContainerKind::Array));
        assert_eq!(n.innermost().complex_type.as_deref(), Some("Nested"));
        assert_eq!(n.levels().count(), 2);

        let nested = report.model("Nested").unwrap();
        assert_eq!(nested.container_parent.as_deref(), Some("ArrayList<Nested>"));
        assert!(!nested.imports.contains("Nested"));
    }

    #[test]
    fn test_mutually_recursive_containers_terminate() {
        let engine = Engine::default();
        let doc = SchemaDocument::from_schema_map(json!({
            "Left": {"type": "array", "items": {"$ref": "#/components/schemas/Right"}},
            "Right": {"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Left"}}
        }))
        .unwrap();
        let mut ctx = engine.context(&doc);
        let property = DefaultPropertyClassifier
            .property(&mut ctx, "Owner", "link", &Schema::reference_to("Left"))
            .unwrap();
        let kinds: Vec<Option<ContainerKind>> = property.levels().map(|level| level.container_type).collect();
        assert_eq!(kinds, vec![Some(ContainerKind::Array), Some(ContainerKind::Map), None]);
        assert_eq!(property.innermost().complex_type.as_deref(), Some("Left"));
    }
}
