use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keywords::{SchemaType, TypeKeyword};
use crate::lenient;
use crate::node::{AdditionalProperties, Items, Schema, SchemaNode};

/// A schema node in editing shape.
///
/// Same keywords as [`SchemaNode`], except `properties` is an ordered list of
/// [`FieldItem`]s and there is no `required`: requiredness lives on each
/// field. Combinators, `not`, `additionalProperties` and nested `$defs` are
/// edited as whole canonical fragments and stay in canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeKeyword>,

    #[serde(
        rename = "$ref",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub reference: Option<String>,

    #[serde(flatten)]
    pub keywords: IndexMap<String, Value>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::list"
    )]
    pub properties: Option<Vec<FieldItem>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::items"
    )]
    pub items: Option<Items<FormNode>>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::additional_properties"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(
        rename = "allOf",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::list"
    )]
    pub all_of: Option<Vec<Schema<SchemaNode>>>,

    #[serde(
        rename = "anyOf",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::list"
    )]
    pub any_of: Option<Vec<Schema<SchemaNode>>>,

    #[serde(
        rename = "oneOf",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::list"
    )]
    pub one_of: Option<Vec<Schema<SchemaNode>>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::boxed"
    )]
    pub not: Option<Box<Schema<SchemaNode>>>,

    #[serde(
        rename = "$defs",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::map"
    )]
    pub defs: Option<IndexMap<String, Schema<SchemaNode>>>,
}

impl FormNode {
    /// A node carrying only a `type`.
    pub fn of_type(ty: SchemaType) -> Self {
        Self {
            schema_type: Some(ty.into()),
            ..Self::default()
        }
    }

    /// The recognized `type` name, if any.
    pub fn type_name(&self) -> Option<SchemaType> {
        self.schema_type.as_ref().and_then(TypeKeyword::name)
    }

    /// Look up an untyped keyword such as `title` or `minimum`.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }
}

/// One named property slot.
///
/// `id` is a synthetic handle for list reconciliation; it never reaches the
/// canonical document. A property declared as `true` or `false` keeps that
/// boolean schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub schema: Schema<FormNode>,
}

impl FieldItem {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        schema: impl Into<Schema<FormNode>>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            is_required: false,
            schema: schema.into(),
        }
    }

    #[must_use]
    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }
}

/// A named schema stored under the root `$defs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub schema: Schema<FormNode>,
}

impl DefinitionItem {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        schema: impl Into<Schema<FormNode>>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            schema: schema.into(),
        }
    }
}

/// The whole document in editing shape.
///
/// `root` holds the top-level keywords (`type`, `title`, `$schema`, `items`
/// for array roots, ...); the top-level properties and definitions are kept
/// in their own lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub root: FormNode,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub properties: Vec<FieldItem>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub definitions: Vec<DefinitionItem>,
    /// The document writes a top-level `properties` map even when there are
    /// no fields.
    #[serde(default, rename = "declaresProperties")]
    pub declares_properties: bool,
}

impl FormSchema {
    /// Read a form tree from a raw JSON document, degrading malformed parts.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Index of the top-level field named `key`.
    pub fn field_index(&self, key: &str) -> Option<usize> {
        self.properties.iter().position(|field| field.key == key)
    }

    /// Index of the definition named `key`.
    pub fn definition_index(&self, key: &str) -> Option<usize> {
        self.definitions.iter().position(|def| def.key == key)
    }
}
