//! Type Inference
//!
//! Maps a schema's shape and format to a target-neutral `TypeTag`. The
//! checks run most-specific first and their order is part of the contract:
//! a `string` with format `number` is a `BigDecimal`, not a `string`; a map
//! is a `map` even when it is also `type: object`.
//!
//! Inference never fails. Shapes it cannot place fall back to `object` or
//! pass their type through, with an `InferenceNote` the caller turns into a
//! diagnostic.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::patterns::*;
use crate::graph::DiagnosticCode;
use crate::schema::Schema;

// =============================================================================
// Type Tags
// =============================================================================

/// Target-neutral type of a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    /// Arbitrary precision decimal (`string` + format `number`)
    BigDecimal,
    ByteArray,
    Binary,
    File,
    Boolean,
    Date,
    DateTime,
    Number,
    Float,
    Double,
    Long,
    Integer,
    Map,
    Set,
    Array,
    Uuid,
    Uri,
    String,
    /// String format remapped through the caller's type mappings
    Custom(String),
    Object,
    AnyType,
    /// Unrecognised `type` string, passed through verbatim
    Unknown(String),
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::BigDecimal => "BigDecimal",
            Self::ByteArray => "ByteArray",
            Self::Binary => "binary",
            Self::File => "file",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Number => "number",
            Self::Float => "float",
            Self::Double => "double",
            Self::Long => "long",
            Self::Integer => "integer",
            Self::Map => "map",
            Self::Set => "set",
            Self::Array => "array",
            Self::Uuid => "UUID",
            Self::Uri => "URI",
            Self::String => "string",
            Self::Custom(name) | Self::Unknown(name) => name,
            Self::Object => "object",
            Self::AnyType => "AnyType",
        }
    }

    /// Array, set or map
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array | Self::Set | Self::Map)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number | Self::Float | Self::Double | Self::Long | Self::Integer | Self::BigDecimal
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// =============================================================================
// Inference Result
// =============================================================================

/// Something the inferrer had to guess about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceNote {
    /// Numeric schema with a format other than float/double
    UnknownFormat { format: String },
    /// `type` string outside the known set
    UnknownType { type_name: String },
}

impl InferenceNote {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::UnknownFormat { .. } => DiagnosticCode::UnknownFormat,
            Self::UnknownType { .. } => DiagnosticCode::UnknownType,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::UnknownFormat { format } => {
                format!("Unknown number format '{}', falling back to number", format)
            }
            Self::UnknownType { type_name } => {
                format!("Unknown type '{}', passed through as-is", type_name)
            }
        }
    }
}

/// Tag plus an optional note about how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub tag: TypeTag,
    pub note: Option<InferenceNote>,
}

impl Inference {
    fn certain(tag: TypeTag) -> Self {
        Self { tag, note: None }
    }

    fn noted(tag: TypeTag, note: InferenceNote) -> Self {
        Self { tag, note: Some(note) }
    }
}

// =============================================================================
// Inferrer
// =============================================================================

/// Schema shape -> type tag
pub trait TypeInferrer: Send + Sync {
    /// Infer the tag of a schema. Must be a pure function of its input.
    fn infer(&self, schema: &Schema) -> Inference;

    fn infer_tag(&self, schema: &Schema) -> TypeTag {
        self.infer(schema).tag
    }
}

/// The standard ordered rule set
#[derive(Debug, Clone, Default)]
pub struct DefaultTypeInferrer {
    /// String format -> custom type
    type_mappings: BTreeMap<String, String>,
}

impl DefaultTypeInferrer {
    pub fn new(type_mappings: BTreeMap<String, String>) -> Self {
        Self { type_mappings }
    }
}

impl TypeInferrer for DefaultTypeInferrer {
    fn infer(&self, schema: &Schema) -> Inference {
        if is_null_type(schema) {
            return Inference::certain(TypeTag::Null);
        }
        if is_string_schema(schema) && schema.format_is("number") {
            return Inference::certain(TypeTag::BigDecimal);
        }
        if is_byte_array_schema(schema) {
            return Inference::certain(TypeTag::ByteArray);
        }
        if is_file_schema(schema) {
            return Inference::certain(TypeTag::File);
        }
        if is_binary_schema(schema) {
            return Inference::certain(TypeTag::Binary);
        }
        if is_boolean_schema(schema) {
            return Inference::certain(TypeTag::Boolean);
        }
        if is_date_schema(schema) {
            return Inference::certain(TypeTag::Date);
        }
        if is_date_time_schema(schema) {
            return Inference::certain(TypeTag::DateTime);
        }
        if is_number_schema(schema) {
            return match schema.format.as_deref() {
                None => Inference::certain(TypeTag::Number),
                Some("float") => Inference::certain(TypeTag::Float),
                Some("double") => Inference::certain(TypeTag::Double),
                Some(other) => Inference::noted(
                    TypeTag::Number,
                    InferenceNote::UnknownFormat { format: other.to_string() },
                ),
            };
        }
        if is_integer_schema(schema) {
            return if is_long_schema(schema) {
                Inference::certain(TypeTag::Long)
            } else {
                Inference::certain(TypeTag::Integer)
            };
        }
        if is_map_schema(schema) {
            return Inference::certain(TypeTag::Map);
        }
        if is_array_schema(schema) {
            return if is_set_schema(schema) {
                Inference::certain(TypeTag::Set)
            } else {
                Inference::certain(TypeTag::Array)
            };
        }
        if is_uuid_schema(schema) {
            return Inference::certain(TypeTag::Uuid);
        }
        if is_uri_schema(schema) {
            return Inference::certain(TypeTag::Uri);
        }
        if is_string_schema(schema) {
            let custom = schema
                .format
                .as_ref()
                .and_then(|format| self.type_mappings.get(format));
            return match custom {
                Some(mapped) => Inference::certain(TypeTag::Custom(mapped.clone())),
                None => Inference::certain(TypeTag::String),
            };
        }
        if is_free_form_object(schema) {
            return Inference::certain(TypeTag::Object);
        }
        if is_object_schema(schema) && !schema.properties.is_empty() {
            return Inference::certain(TypeTag::Object);
        }
        if is_any_type(schema) {
            return Inference::certain(TypeTag::AnyType);
        }

        match schema.primary_type() {
            Some("object") => Inference::certain(TypeTag::Object),
            Some(other) => Inference::noted(
                TypeTag::Unknown(other.to_string()),
                InferenceNote::UnknownType { type_name: other.to_string() },
            ),
            // Untyped refs, compositions and enums are named models
            None => Inference::certain(TypeTag::Object),
        }
    }
}
