use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::keywords::{SchemaType, TypeKeyword, is_recognized};
use crate::lenient;

/// A node of a canonical JSON Schema document.
///
/// Structural keywords are typed; everything else lives in [`keywords`]
/// in document order.
///
/// [`keywords`]: SchemaNode::keywords
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeKeyword>,

    #[serde(
        rename = "$ref",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string"
    )]
    pub reference: Option<String>,

    /// Every keyword without a typed field, e.g. `title`, `minimum`, `$id`.
    #[serde(flatten)]
    pub keywords: IndexMap<String, Value>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::map"
    )]
    pub properties: Option<IndexMap<String, Schema<SchemaNode>>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::string_list"
    )]
    pub required: Option<Vec<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::items"
    )]
    pub items: Option<Items<SchemaNode>>,

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

impl SchemaNode {
    /// A node carrying only a `type`.
    pub fn of_type(ty: SchemaType) -> Self {
        Self {
            schema_type: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Read a node from an arbitrary JSON value.
    ///
    /// Anything that is not an object reads as an empty node.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// The recognized `type` name, if any.
    pub fn type_name(&self) -> Option<SchemaType> {
        self.schema_type.as_ref().and_then(TypeKeyword::name)
    }

    /// Look up an untyped keyword such as `title` or `minimum`.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    /// Names of untyped keywords outside the recognized table, anywhere in
    /// this subtree, each listed once in first-seen order.
    pub fn unrecognized_keywords(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_unrecognized(&mut found);
        found
    }

    fn collect_unrecognized<'a>(&'a self, found: &mut Vec<&'a str>) {
        for name in self.keywords.keys() {
            if !is_recognized(name) && !found.contains(&name.as_str()) {
                found.push(name.as_str());
            }
        }
        let children = self
            .properties
            .iter()
            .chain(&self.defs)
            .flat_map(IndexMap::values)
            .chain(self.items.iter().flat_map(Items::schemas))
            .chain(self.all_of.iter().chain(&self.any_of).chain(&self.one_of).flatten())
            .chain(self.not.as_deref())
            .filter_map(Schema::as_node)
            .chain(match &self.additional_properties {
                Some(AdditionalProperties::Schema(node)) => Some(node.as_ref()),
                _ => None,
            });
        for child in children {
            child.collect_unrecognized(found);
        }
    }
}

/// A schema position: `true`/`false` or a schema object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Schema<N> {
    Bool(bool),
    Node(N),
}

impl<N: Default> Default for Schema<N> {
    fn default() -> Self {
        Self::Node(N::default())
    }
}

impl<N> From<N> for Schema<N> {
    fn from(node: N) -> Self {
        Self::Node(node)
    }
}

impl<N> Schema<N> {
    /// The schema object, unless this is a boolean schema.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            Self::Node(node) => Some(node),
            Self::Bool(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut N> {
        match self {
            Self::Node(node) => Some(node),
            Self::Bool(_) => None,
        }
    }

    /// Convert the schema object with `f`; boolean schemas are kept as is.
    pub fn map<M>(&self, f: impl FnOnce(&N) -> M) -> Schema<M> {
        match self {
            Self::Bool(b) => Schema::Bool(*b),
            Self::Node(node) => Schema::Node(f(node)),
        }
    }
}

impl<N: DeserializeOwned> Schema<N> {
    /// Read a schema from a raw value; anything but a boolean or a readable
    /// object is treated as absent.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(b)),
            v @ Value::Object(_) => serde_json::from_value(v).ok().map(Self::Node),
            _ => None,
        }
    }
}

impl<'de, N: DeserializeOwned> Deserialize<'de> for Schema<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?)
            .ok_or_else(|| de::Error::custom("a schema must be a boolean or an object"))
    }
}

/// The two shapes of the `items` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Items<N> {
    /// One schema applied to every element.
    Single(Box<Schema<N>>),
    /// Positional schemas, one per element.
    Tuple(Vec<Schema<N>>),
}

impl<N: DeserializeOwned> Items<N> {
    /// Read `items` from a raw value; any other shape is treated as absent.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(values) => Some(Self::Tuple(
                values.into_iter().filter_map(Schema::from_value).collect(),
            )),
            other => Schema::from_value(other).map(|schema| Self::Single(Box::new(schema))),
        }
    }
}

impl<N> Items<N> {
    /// The single item schema object, when `items` is neither a tuple nor a
    /// boolean schema.
    pub fn as_single(&self) -> Option<&N> {
        match self {
            Self::Single(schema) => schema.as_node(),
            Self::Tuple(_) => None,
        }
    }

    /// Every item schema, in position order.
    pub fn schemas(&self) -> &[Schema<N>] {
        match self {
            Self::Single(schema) => core::slice::from_ref(schema.as_ref()),
            Self::Tuple(schemas) => schemas,
        }
    }

    /// Mutable access to the single item schema object.
    pub fn as_single_mut(&mut self) -> Option<&mut N> {
        match self {
            Self::Single(schema) => schema.as_node_mut(),
            Self::Tuple(_) => None,
        }
    }

    /// Apply `f` to every schema object, keeping the shape and any boolean
    /// schemas.
    pub fn map<M>(&self, mut f: impl FnMut(&N) -> M) -> Items<M> {
        match self {
            Self::Single(schema) => Items::Single(Box::new(schema.map(&mut f))),
            Self::Tuple(schemas) => Items::Tuple(schemas.iter().map(|s| s.map(&mut f)).collect()),
        }
    }
}

impl<N: Serialize> Serialize for Items<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(node) => node.serialize(serializer),
            Self::Tuple(nodes) => nodes.serialize(serializer),
        }
    }
}

impl<'de, N: DeserializeOwned> Deserialize<'de> for Items<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?)
            .ok_or_else(|| de::Error::custom("`items` must be a schema or an array of schemas"))
    }
}

/// `additionalProperties`: either a flag or a schema for extra keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaNode>),
}

impl AdditionalProperties {
    /// Read the keyword from a raw value; other shapes are treated as absent.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(b)),
            v @ Value::Object(_) => Some(Self::Schema(Box::new(SchemaNode::from_value(v)))),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AdditionalProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?).ok_or_else(|| {
            de::Error::custom("`additionalProperties` must be a boolean or a schema")
        })
    }
}
