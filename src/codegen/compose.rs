//! Composition Resolution
//!
//! `allOf`, `oneOf` and `anyOf` handling for composed schemas:
//!
//! - allOf: single inheritance. `$ref` members are resolved as parents and
//!   the last one wins; inline members contribute own properties.
//! - oneOf: tagged union. Each arm becomes a model that implements the
//!   parent, and the parent lists it among its union members.
//! - anyOf: not supported. Reported, and the union stays empty.
//!
//! When a schema has both oneOf and anyOf, only oneOf is processed.

use super::model::Model;
use super::ResolutionContext;
use crate::error::{ModelError, Result};
use crate::graph::DiagnosticCode;
use crate::schema::{ref_name, Schema, SchemaName};

/// Composed schema -> model relationships
pub trait CompositionResolver: Send + Sync {
    /// Fill `model` from the composition keywords of `schema`
    fn resolve(&self, ctx: &mut ResolutionContext<'_>, schema: &Schema, model: &mut Model) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompositionResolver;

impl CompositionResolver for DefaultCompositionResolver {
    fn resolve(&self, ctx: &mut ResolutionContext<'_>, schema: &Schema, model: &mut Model) -> Result<()> {
        let classifier = ctx.classifier();

        if !schema.all_of().is_empty() {
            self.resolve_all_of(ctx, schema, model)?;
        }

        // Properties next to the composition keywords are own properties
        classifier.classify(ctx, model, &schema.properties, &schema.required)?;

        if !schema.one_of().is_empty() {
            if !schema.any_of().is_empty() {
                ctx.diagnostics_mut().report(
                    &model.name,
                    DiagnosticCode::IgnoredAnyOf,
                    "Both oneOf and anyOf are present; anyOf is ignored",
                );
            }
            self.resolve_one_of(ctx, schema, model)?;
        } else if !schema.any_of().is_empty() {
            self.resolve_any_of(ctx, schema, model);
        }

        Ok(())
    }
}

impl DefaultCompositionResolver {
    fn resolve_all_of(&self, ctx: &mut ResolutionContext<'_>, schema: &Schema, model: &mut Model) -> Result<()> {
        let classifier = ctx.classifier();
        let mut parents: Vec<Model> = Vec::new();
        let mut inline: Vec<&Schema> = Vec::new();

        for member in schema.all_of() {
            match member.reference.as_deref() {
                Some(reference) => parents.push(ctx.resolve_reference(&model.name, reference)?),
                None => inline.push(member),
            }
        }

        if let Some(parent) = parents.pop() {
            if !parents.is_empty() {
                let collapsed: Vec<SchemaName> = parents.iter().map(|p| p.name.clone()).collect();
                ctx.diagnostics_mut().report(
                    &model.name,
                    DiagnosticCode::CollapsedInheritance,
                    format!(
                        "allOf lists {} parents; only '{}' is kept, {} collapsed",
                        collapsed.len() + 1,
                        parent.name,
                        collapsed.join(", ")
                    ),
                );
                model.collapsed_parents = collapsed;
            }

            tracing::debug!(schema = %model.name, parent = %parent.name, "Linked allOf parent");
            model.parent_name = Some(parent.name.clone());
            model.add_import(parent.classname.clone());
            model.inherit(&parent.all_properties);
            model
                .all_required_names
                .extend(parent.all_required_names.iter().cloned());
        }

        for member in inline {
            classifier.classify(ctx, model, &member.properties, &member.required)?;
        }

        model.refresh_partitions();
        Ok(())
    }

    fn resolve_one_of(&self, ctx: &mut ResolutionContext<'_>, schema: &Schema, model: &mut Model) -> Result<()> {
        if !schema.properties.is_empty() {
            ctx.diagnostics_mut().report(
                &model.name,
                DiagnosticCode::MixedOneOfProperties,
                "oneOf is combined with inline properties; they are kept as shared properties",
            );
        }

        // Arms that resolve this model back see its shared properties
        ctx.publish(model);

        for (index, arm) in schema.one_of().iter().enumerate() {
            let child = match arm.reference.as_deref() {
                Some(reference) => {
                    ctx.resolve_reference(&model.name, reference)?;
                    ref_name(reference).to_string()
                }
                None => {
                    // Positional, counting from 0
                    let child = format!("{}OneOf{}", model.name, index);
                    ctx.resolve_schema(&child, arm)
                        .map_err(|_| ModelError::DependencyFailed {
                            schema: model.name.clone(),
                            dependency: child.clone(),
                        })?;
                    child
                }
            };

            model.union_members.insert(child.clone());
            ctx.register_interface(&child, &model.name);
        }

        ctx.publish(model);
        Ok(())
    }

    fn resolve_any_of(&self, ctx: &mut ResolutionContext<'_>, schema: &Schema, model: &Model) {
        let branches: Vec<String> = schema
            .any_of()
            .iter()
            .map(|branch| branch.ref_name().unwrap_or("<inline>").to_string())
            .collect();
        ctx.diagnostics_mut().report(
            &model.name,
            DiagnosticCode::UnsupportedComposition,
            format!(
                "anyOf is not supported; {} branch(es) ignored: {}",
                branches.len(),
                branches.join(", ")
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Engine;
    use crate::graph::SchemaDocument;
    use serde_json::json;

    fn run(value: serde_json::Value) -> crate::codegen::GenerationReport {
        Engine::default().run(&SchemaDocument::from_schema_map(value).unwrap())
    }

    #[test]
    fn test_last_all_of_reference_wins() {
        let report = run(json!({
            "A": {"type": "object", "properties": {"a": {"type": "string"}}},
            "B": {"type": "object", "properties": {"b": {"type": "string"}}},
            "C": {"allOf": [
                {"$ref": "#/components/schemas/A"},
                {"$ref": "#/components/schemas/B"}
            ]}
        }));
        let c = report.model("C").unwrap();
        assert_eq!(c.parent_name.as_deref(), Some("B"));
        assert_eq!(c.collapsed_parents, vec!["A"]);
        assert!(c.property("b").is_some());
        assert!(c.property("a").is_none());
        assert!(report.diagnostics.has_code("C", DiagnosticCode::CollapsedInheritance));
    }

    #[test]
    fn test_inline_all_of_members_are_own_properties() {
        let report = run(json!({
            "Animal": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}},
            "Dog": {
                "allOf": [
                    {"$ref": "#/components/schemas/Animal"},
                    {"type": "object", "required": ["bark"], "properties": {"bark": {"type": "boolean"}}}
                ],
                "properties": {"name": {"type": "string", "description": "Dog name"}}
            }
        }));
        let dog = report.model("Dog").unwrap();
        let own: Vec<&str> = dog.own_properties.iter().map(|p| p.base_name.as_str()).collect();
        assert_eq!(own, vec!["bark", "name"]);
        assert_eq!(dog.all_properties.len(), 2);
        assert_eq!(dog.property("name").unwrap().description.as_deref(), Some("Dog name"));
        assert!(dog.all_required_names.contains("name"));
        assert!(dog.required_names.contains("bark"));
        assert!(dog.imports.contains("Animal"));
    }

    #[test]
    fn test_inline_one_of_arms_get_synthetic_names() {
        let report = run(json!({
            "Shape": {"oneOf": [
                {"type": "object", "properties": {"radius": {"type": "number"}}},
                {"type": "object", "properties": {"side": {"type": "number"}}}
            ]}
        }));
        let shape = report.model("Shape").unwrap();
        let members: Vec<&str> = shape.union_members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["ShapeOneOf0", "ShapeOneOf1"]);
        let arm = report.model("ShapeOneOf1").unwrap();
        assert!(arm.interfaces.contains("Shape"));
        assert!(arm.imports.contains("Shape"));
    }

    #[test]
    fn test_one_of_takes_precedence_over_any_of() {
        let report = run(json!({
            "Cat": {"type": "object", "properties": {"meow": {"type": "boolean"}}},
            "Dog": {"type": "object", "properties": {"bark": {"type": "boolean"}}},
            "Pet": {
                "oneOf": [{"$ref": "#/components/schemas/Cat"}],
                "anyOf": [{"$ref": "#/components/schemas/Dog"}]
            }
        }));
        let pet = report.model("Pet").unwrap();
        assert_eq!(pet.union_members.len(), 1);
        assert!(report.diagnostics.has_code("Pet", DiagnosticCode::IgnoredAnyOf));
        assert!(!report.diagnostics.has_code("Pet", DiagnosticCode::UnsupportedComposition));
        assert!(report.model("Dog").unwrap().interfaces.is_empty());
    }

    #[test]
    fn test_shared_one_of_properties_are_reported() {
        let report = run(json!({
            "Cat": {"type": "object", "properties": {"meow": {"type": "boolean"}}},
            "Pet": {
                "properties": {"name": {"type": "string"}},
                "oneOf": [{"$ref": "#/components/schemas/Cat"}]
            }
        }));
        let pet = report.model("Pet").unwrap();
        assert!(pet.property("name").is_some());
        assert!(report.diagnostics.has_code("Pet", DiagnosticCode::MixedOneOfProperties));
    }

    #[test]
    fn test_failed_arm_fails_the_union() {
        let report = run(json!({
            "Pet": {"oneOf": [{"$ref": "#/components/schemas/Ghost"}]},
            "Other": {"type": "object", "properties": {"x": {"type": "string"}}}
        }));
        assert_eq!(
            report.failure("Pet").unwrap().error,
            ModelError::UnresolvedReference { schema: "Pet".into(), reference: "Ghost".into() }
        );
        assert!(report.model("Other").is_some());
    }
}
