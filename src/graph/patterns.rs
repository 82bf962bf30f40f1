//! Schema Pattern Detection
//!
//! Structural predicates over a single schema. These look at the schema as
//! written and never follow `$ref`; callers dereference first when needed.

use serde::{Deserialize, Serialize};

use crate::schema::{AdditionalProperties, Schema};

// =============================================================================
// Schema Kind
// =============================================================================

/// Coarse shape of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaKind {
    /// Pure `$ref` to another named schema
    Reference,
    /// Has `allOf` / `oneOf` / `anyOf`
    Composed,
    /// Lists enum values
    Enum,
    Array,
    Map,
    /// Object with no declared properties and unconstrained extras
    FreeFormObject,
    /// Object with declared properties
    NamedObject,
    /// Scalar wrapper (string, number, boolean, ...)
    Primitive,
}

/// Detect the kind of a schema
pub fn detect_kind(schema: &Schema) -> SchemaKind {
    if schema.reference.is_some() {
        SchemaKind::Reference
    } else if is_composed_schema(schema) {
        SchemaKind::Composed
    } else if schema.has_enum() {
        SchemaKind::Enum
    } else if is_array_schema(schema) {
        SchemaKind::Array
    } else if is_map_schema(schema) {
        SchemaKind::Map
    } else if !schema.properties.is_empty() {
        SchemaKind::NamedObject
    } else if is_free_form_object(schema) || is_any_type(schema) {
        SchemaKind::FreeFormObject
    } else {
        SchemaKind::Primitive
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// `type: object`, or no type but declared properties
pub fn is_object_schema(schema: &Schema) -> bool {
    schema.type_is("object") || (schema.primary_type().is_none() && !schema.properties.is_empty())
}

pub fn is_composed_schema(schema: &Schema) -> bool {
    !schema.all_of().is_empty() || !schema.one_of().is_empty() || !schema.any_of().is_empty()
}

/// No declared properties and `additionalProperties` is a schema or `true`
pub fn is_map_schema(schema: &Schema) -> bool {
    if schema.reference.is_some() || !schema.properties.is_empty() {
        return false;
    }
    matches!(
        schema.additional_properties,
        Some(AdditionalProperties::Schema(_)) | Some(AdditionalProperties::Bool(true))
    )
}

pub fn is_array_schema(schema: &Schema) -> bool {
    schema.type_is("array")
}

pub fn is_set_schema(schema: &Schema) -> bool {
    is_array_schema(schema) && schema.unique_items == Some(true)
}

pub fn is_string_schema(schema: &Schema) -> bool {
    schema.type_is("string")
}

pub fn is_boolean_schema(schema: &Schema) -> bool {
    schema.type_is("boolean")
}

pub fn is_number_schema(schema: &Schema) -> bool {
    schema.type_is("number")
}

pub fn is_integer_schema(schema: &Schema) -> bool {
    schema.type_is("integer")
}

pub fn is_long_schema(schema: &Schema) -> bool {
    is_integer_schema(schema) && (schema.format_is("int64") || schema.format_is("long"))
}

pub fn is_byte_array_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("byte")
}

pub fn is_binary_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("binary")
}

/// Swagger 2 `type: file`
pub fn is_file_schema(schema: &Schema) -> bool {
    schema.type_is("file")
}

pub fn is_date_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("date")
}

pub fn is_date_time_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("date-time")
}

pub fn is_uuid_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("uuid")
}

pub fn is_uri_schema(schema: &Schema) -> bool {
    is_string_schema(schema) && schema.format_is("uri")
}

pub fn is_null_type(schema: &Schema) -> bool {
    schema.schema_type.as_ref().map(|t| t.is_null_only()).unwrap_or(false)
}

/// `type: object` with nothing declared and extras left open
pub fn is_free_form_object(schema: &Schema) -> bool {
    if !schema.type_is("object") || !schema.properties.is_empty() || is_composed_schema(schema) {
        return false;
    }
    match &schema.additional_properties {
        None | Some(AdditionalProperties::Bool(true)) => true,
        Some(AdditionalProperties::Schema(inner)) => **inner == Schema::default(),
        Some(AdditionalProperties::Bool(false)) => false,
    }
}

/// No constraining keyword at all, e.g. `{}` or `{"description": "..."}`
pub fn is_any_type(schema: &Schema) -> bool {
    schema.reference.is_none()
        && schema.primary_type().is_none()
        && !is_null_type(schema)
        && schema.format.is_none()
        && schema.properties.is_empty()
        && schema.items.is_none()
        && schema.additional_properties.is_none()
        && !schema.has_enum()
        && !is_composed_schema(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn test_detect_kinds() {
        assert_eq!(detect_kind(&schema(json!({"$ref": "#/components/schemas/Pet"}))), SchemaKind::Reference);
        assert_eq!(detect_kind(&schema(json!({"allOf": [{"type": "object"}]}))), SchemaKind::Composed);
        assert_eq!(detect_kind(&schema(json!({"type": "string", "enum": ["A"]}))), SchemaKind::Enum);
        assert_eq!(detect_kind(&schema(json!({"type": "array", "items": {"type": "string"}}))), SchemaKind::Array);
        assert_eq!(detect_kind(&schema(json!({"type": "object", "additionalProperties": {"type": "integer"}}))), SchemaKind::Map);
        assert_eq!(detect_kind(&schema(json!({"properties": {"a": {"type": "string"}}}))), SchemaKind::NamedObject);
        assert_eq!(detect_kind(&schema(json!({"type": "object"}))), SchemaKind::FreeFormObject);
        assert_eq!(detect_kind(&schema(json!({"type": "integer"}))), SchemaKind::Primitive);
    }

    #[test]
    fn test_map_requires_open_extras() {
        assert!(is_map_schema(&schema(json!({"additionalProperties": true}))));
        assert!(!is_map_schema(&schema(json!({"additionalProperties": false}))));
        assert!(!is_map_schema(&schema(json!({
            "properties": {"a": {"type": "string"}},
            "additionalProperties": true
        }))));
    }

    #[test]
    fn test_any_type_has_no_constraints() {
        assert!(is_any_type(&schema(json!({}))));
        assert!(is_any_type(&schema(json!({"description": "anything", "nullable": true}))));
        assert!(!is_any_type(&schema(json!({"type": "null"}))));
        assert!(!is_any_type(&schema(json!({"format": "uuid"}))));
        assert!(!is_any_type(&schema(json!({"additionalProperties": true}))));
    }

    #[test]
    fn test_free_form_object() {
        assert!(is_free_form_object(&schema(json!({"type": "object"}))));
        assert!(is_free_form_object(&schema(json!({"type": "object", "additionalProperties": {}}))));
        assert!(!is_free_form_object(&schema(json!({"type": "object", "additionalProperties": false}))));
        assert!(!is_free_form_object(&schema(json!({"type": "object", "properties": {"a": {}}}))));
    }

    #[test]
    fn test_long_accepts_both_formats() {
        assert!(is_long_schema(&schema(json!({"type": "integer", "format": "int64"}))));
        assert!(is_long_schema(&schema(json!({"type": "integer", "format": "long"}))));
        assert!(!is_long_schema(&schema(json!({"type": "integer", "format": "int32"}))));
    }
}
