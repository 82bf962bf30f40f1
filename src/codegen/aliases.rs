//! Alias Table
//!
//! Named schemas that only rename a simple type (`Meters: {type: number}`)
//! become aliases instead of models with properties. The table is computed
//! once per run from the full schema table and never changes afterwards.

use indexmap::IndexMap;
use serde::Serialize;

use super::infer::{TypeInferrer, TypeTag};
use crate::graph::patterns::{is_array_schema, is_composed_schema, is_map_schema, is_object_schema};
use crate::graph::SchemaDocument;
use crate::schema::{Schema, SchemaName};

/// A bare wrapper: not an object, array, map or composition, and no enum
pub fn is_alias_eligible(schema: &Schema) -> bool {
    !(is_object_schema(schema)
        || is_array_schema(schema)
        || is_map_schema(schema)
        || is_composed_schema(schema)
        || schema.has_enum())
}

/// Alias name -> aliased type, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: IndexMap<SchemaName, TypeTag>,
}

impl AliasTable {
    /// Scan every named schema once.
    ///
    /// The recorded tag is that of the schema at the end of its `$ref`
    /// chain, so `Distance -> Meters -> number` records `number`.
    pub fn build(document: &SchemaDocument, inferrer: &dyn TypeInferrer) -> Self {
        let entries: IndexMap<SchemaName, TypeTag> = document
            .iter()
            .filter(|(_, schema)| is_alias_eligible(schema))
            .map(|(name, schema)| {
                let target = document.unalias(schema).unwrap_or(schema);
                (name.clone(), inferrer.infer_tag(target))
            })
            .collect();

        tracing::debug!(aliases = entries.len(), "Built alias table");
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&TypeTag> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SchemaName, &TypeTag)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::infer::DefaultTypeInferrer;
    use serde_json::json;

    fn document() -> SchemaDocument {
        SchemaDocument::from_schema_map(json!({
            "Meters": {"type": "number"},
            "Distance": {"$ref": "#/components/schemas/Meters"},
            "Id": {"type": "string", "format": "uuid"},
            "Color": {"type": "string", "enum": ["RED", "GREEN"]},
            "Tags": {"type": "array", "items": {"type": "string"}},
            "Labels": {"type": "object", "additionalProperties": {"type": "string"}},
            "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Shape": {"oneOf": [{"$ref": "#/components/schemas/Pet"}]}
        }))
        .unwrap()
    }

    #[test]
    fn test_only_simple_wrappers_are_aliases() {
        let table = AliasTable::build(&document(), &DefaultTypeInferrer::default());
        let names: Vec<&str> = table.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Meters", "Distance", "Id"]);
        assert!(!table.contains("Color"));
        assert!(!table.contains("Pet"));
    }

    #[test]
    fn test_alias_records_dereferenced_tag() {
        let table = AliasTable::build(&document(), &DefaultTypeInferrer::default());
        assert_eq!(table.get("Meters"), Some(&TypeTag::Number));
        assert_eq!(table.get("Distance"), Some(&TypeTag::Number));
        assert_eq!(table.get("Id"), Some(&TypeTag::Uuid));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let table = AliasTable::build(&document(), &DefaultTypeInferrer::default());
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["Meters"], json!("number"));
        assert_eq!(value["Id"], json!("UUID"));
    }
}
