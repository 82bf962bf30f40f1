//! Model Records
//!
//! The normalized output of a run: one `Model` per schema name, each with
//! its own and inherited `Property` views. Everything here serializes in
//! camelCase so template backends can consume it as-is.

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::infer::TypeTag;
use super::names::Naming;
use crate::schema::{SchemaName, XmlObject};

// =============================================================================
// Property
// =============================================================================

/// Container shape of a property or array model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Array,
    Set,
    Map,
}

impl ContainerKind {
    pub fn from_tag(tag: &TypeTag) -> Option<Self> {
        match tag {
            TypeTag::Array => Some(Self::Array),
            TypeTag::Set => Some(Self::Set),
            TypeTag::Map => Some(Self::Map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Set => "set",
            Self::Map => "map",
        }
    }
}

/// One property of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Key as written in the schema
    pub base_name: String,
    /// Camelized accessor stem
    pub name: String,
    pub var_name: String,
    pub type_tag: TypeTag,
    /// Tag name, or the model class name for references
    pub data_type: String,
    /// Referenced model class name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complex_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_type: Option<ContainerKind>,
    pub is_container: bool,
    /// Item (or map value) property of a container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Property>>,
    pub required: bool,
    pub read_only: bool,
    pub nullable: bool,
    pub is_enum: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Type name of an inline enum (`status` -> `StatusEnum`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reference requirements of this property, nested levels included
    pub imports: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vendor_extensions: BTreeMap<String, Value>,
}

impl Property {
    /// Walk the item chain, outermost first
    pub fn levels(&self) -> impl Iterator<Item = &Property> {
        std::iter::successors(Some(self), |p| p.items.as_deref())
    }

    /// Innermost item of a container chain (the property itself otherwise)
    pub fn innermost(&self) -> &Property {
        self.levels().last().unwrap_or(self)
    }
}

// =============================================================================
// Model
// =============================================================================

/// The resolved form of one named schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    // === Identity ===
    pub name: SchemaName,
    pub classname: String,
    pub class_var_name: String,
    pub class_filename: String,

    // === Metadata ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unescaped_description: Option<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<XmlObject>,
    pub vendor_extensions: BTreeMap<String, Value>,
    /// Pretty-printed source schema
    pub model_json: String,

    // === Type data ===
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_target_type: Option<TypeTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowable_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_model_type: Option<String>,
    /// Synthetic wrapper such as `ArrayList<Pet>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_parent: Option<String>,

    // === Flags ===
    pub is_alias: bool,
    pub is_enum: bool,
    pub has_enums: bool,
    pub is_nullable: bool,
    pub is_map_model: bool,
    pub is_array_model: bool,
    pub is_additional_properties_true: bool,
    pub is_numeric: bool,
    pub has_vars: bool,
    pub has_required: bool,
    pub has_optional: bool,
    pub has_only_read_only: bool,

    // === Relationships ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<SchemaName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collapsed_parents: Vec<SchemaName>,
    /// Union parents this model implements
    pub interfaces: IndexSet<SchemaName>,
    /// oneOf arms when this model is a union parent
    pub union_members: IndexSet<SchemaName>,

    // === Properties ===
    pub own_properties: Vec<Property>,
    pub all_properties: Vec<Property>,
    pub required_names: BTreeSet<String>,
    pub all_required_names: BTreeSet<String>,
    pub required_vars: Vec<Property>,
    pub optional_vars: Vec<Property>,
    pub read_only_vars: Vec<Property>,
    pub read_write_vars: Vec<Property>,

    /// Aggregated reference requirements
    pub imports: BTreeSet<String>,
}

impl Model {
    /// An empty model carrying only its identity
    pub fn new(name: &str, naming: &Naming) -> Self {
        let classname = naming.model_name(name);
        Self {
            name: name.to_string(),
            class_var_name: naming.var_name(&classname),
            class_filename: naming.model_filename(name),
            classname,
            title: None,
            description: None,
            unescaped_description: None,
            deprecated: false,
            external_docs: None,
            xml: None,
            vendor_extensions: BTreeMap::new(),
            model_json: String::new(),
            data_type: TypeTag::Object.to_string(),
            alias_target_type: None,
            allowable_values: Vec::new(),
            additional_properties_type: None,
            array_model_type: None,
            container_parent: None,
            is_alias: false,
            is_enum: false,
            has_enums: false,
            is_nullable: false,
            is_map_model: false,
            is_array_model: false,
            is_additional_properties_true: false,
            is_numeric: false,
            has_vars: false,
            has_required: false,
            has_optional: false,
            has_only_read_only: true,
            parent_name: None,
            collapsed_parents: Vec::new(),
            interfaces: IndexSet::new(),
            union_members: IndexSet::new(),
            own_properties: Vec::new(),
            all_properties: Vec::new(),
            required_names: BTreeSet::new(),
            all_required_names: BTreeSet::new(),
            required_vars: Vec::new(),
            optional_vars: Vec::new(),
            read_only_vars: Vec::new(),
            read_write_vars: Vec::new(),
            imports: BTreeSet::new(),
        }
    }

    pub fn add_import(&mut self, import: impl Into<String>) {
        let import = import.into();
        if !import.is_empty() {
            self.imports.insert(import);
        }
    }

    /// Property of the merged view by its schema key
    pub fn property(&self, base_name: &str) -> Option<&Property> {
        self.all_properties.iter().find(|p| p.base_name == base_name)
    }

    pub fn own_property(&self, base_name: &str) -> Option<&Property> {
        self.own_properties.iter().find(|p| p.base_name == base_name)
    }

    /// Add or replace an own property. The merged view is updated in place
    /// so an own definition takes the slot of an inherited one.
    pub fn upsert_own(&mut self, property: Property) {
        upsert(&mut self.all_properties, property.clone());
        upsert(&mut self.own_properties, property);
    }

    /// Append inherited properties ahead of any own ones, skipping names the
    /// model already defines itself
    pub fn inherit(&mut self, inherited: &[Property]) {
        let mut merged: Vec<Property> = inherited
            .iter()
            .filter(|p| self.own_property(&p.base_name).is_none())
            .cloned()
            .collect();
        for property in self.all_properties.drain(..) {
            if !merged.iter().any(|p| p.base_name == property.base_name) {
                merged.push(property);
            }
        }
        self.all_properties = merged;
    }

    /// Drop duplicate names from both views, keeping the last definition
    /// in the slot of the first
    pub fn dedupe_properties(&mut self) {
        dedupe(&mut self.own_properties);
        dedupe(&mut self.all_properties);
    }

    /// Stable sort of both views, required first
    pub fn sort_required_first(&mut self) {
        self.own_properties.sort_by_key(|p| !p.required);
        self.all_properties.sort_by_key(|p| !p.required);
    }

    /// Recompute required flags, the four partitions and the derived flags
    /// from the current property views.
    ///
    /// Always a full recomputation over `all_properties`, so the result does
    /// not depend on how many batches of properties were added before.
    pub fn refresh_partitions(&mut self) {
        let required = &self.all_required_names;
        for property in self.own_properties.iter_mut().chain(self.all_properties.iter_mut()) {
            property.required = required.contains(&property.base_name);
        }

        let (required_vars, optional_vars): (Vec<_>, Vec<_>) =
            self.all_properties.iter().cloned().partition(|p| p.required);
        let (read_only_vars, read_write_vars): (Vec<_>, Vec<_>) =
            self.all_properties.iter().cloned().partition(|p| p.read_only);

        self.has_required = !required_vars.is_empty();
        self.has_optional = !optional_vars.is_empty();
        self.has_only_read_only = read_write_vars.is_empty();
        self.has_enums = self.all_properties.iter().any(|p| p.is_enum);
        self.has_vars = !self.own_properties.is_empty();

        self.required_vars = required_vars;
        self.optional_vars = optional_vars;
        self.read_only_vars = read_only_vars;
        self.read_write_vars = read_write_vars;
    }
}

fn upsert(list: &mut Vec<Property>, property: Property) {
    match list.iter_mut().find(|p| p.base_name == property.base_name) {
        Some(slot) => *slot = property,
        None => list.push(property),
    }
}

fn dedupe(list: &mut Vec<Property>) {
    let mut unique: Vec<Property> = Vec::with_capacity(list.len());
    for property in list.drain(..) {
        upsert(&mut unique, property);
    }
    *list = unique;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, read_only: bool) -> Property {
        Property {
            base_name: name.to_string(),
            name: name.to_string(),
            var_name: name.to_string(),
            type_tag: TypeTag::String,
            data_type: "string".to_string(),
            complex_type: None,
            container_type: None,
            is_container: false,
            items: None,
            required: false,
            read_only,
            nullable: false,
            is_enum: false,
            enum_values: Vec::new(),
            enum_name: None,
            description: None,
            imports: BTreeSet::new(),
            vendor_extensions: BTreeMap::new(),
        }
    }

    fn model() -> Model {
        Model::new("Pet", &Naming::default())
    }

    #[test]
    fn test_identity() {
        let model = model();
        assert_eq!(model.classname, "Pet");
        assert_eq!(model.class_var_name, "pet");
        assert_eq!(model.class_filename, "Pet");
        assert!(model.has_only_read_only);
    }

    #[test]
    fn test_partitions_are_complete_and_disjoint() {
        let mut model = model();
        model.upsert_own(prop("id", true));
        model.upsert_own(prop("name", false));
        model.upsert_own(prop("tag", false));
        model.all_required_names.insert("name".to_string());
        model.refresh_partitions();

        assert_eq!(model.required_vars.len() + model.optional_vars.len(), 3);
        assert_eq!(model.read_only_vars.len() + model.read_write_vars.len(), 3);
        assert_eq!(model.required_vars[0].base_name, "name");
        assert!(model.has_required && model.has_optional);
        assert!(!model.has_only_read_only);
    }

    #[test]
    fn test_read_only_fold_ignores_order() {
        let mut first = model();
        first.upsert_own(prop("a", false));
        first.upsert_own(prop("b", true));
        first.refresh_partitions();

        let mut second = model();
        second.upsert_own(prop("b", true));
        second.upsert_own(prop("a", false));
        second.refresh_partitions();

        assert_eq!(first.has_only_read_only, second.has_only_read_only);
        assert!(!first.has_only_read_only);
    }

    #[test]
    fn test_own_property_wins_over_inherited() {
        let mut model = model();
        model.upsert_own(prop("name", false));
        model.inherit(&[prop("id", true), prop("name", true)]);

        let names: Vec<&str> = model.all_properties.iter().map(|p| p.base_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(!model.property("name").unwrap().read_only);
    }

    #[test]
    fn test_stable_required_sort() {
        let mut model = model();
        for name in ["a", "b", "c", "d"] {
            model.upsert_own(prop(name, false));
        }
        model.all_required_names.extend(["c".to_string(), "a".to_string()]);
        model.refresh_partitions();
        model.sort_required_first();

        let names: Vec<&str> = model.own_properties.iter().map(|p| p.base_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_dedupe_keeps_first_slot() {
        let mut model = model();
        model.own_properties = vec![prop("a", false), prop("b", false), prop("a", true)];
        model.dedupe_properties();
        assert_eq!(model.own_properties.len(), 2);
        assert_eq!(model.own_properties[0].base_name, "a");
        assert!(model.own_properties[0].read_only);
    }
}
