use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The `$schema` URI of JSON Schema draft 2020-12.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Prefix of every `$ref` that targets a root-level definition.
pub const DEFS_REF_PREFIX: &str = "#/$defs/";

/// Keywords the editor knows how to present.
///
/// Anything outside this table is carried through conversions untouched; the
/// meta-validator decides whether it is acceptable.
pub const RECOGNIZED_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$defs",
    "type",
    "title",
    "description",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minContains",
    "maxContains",
    "minProperties",
    "maxProperties",
    "enum",
    "properties",
    "required",
    "items",
    "additionalProperties",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
];

/// Whether `keyword` is one of [`RECOGNIZED_KEYWORDS`].
pub fn is_recognized(keyword: &str) -> bool {
    RECOGNIZED_KEYWORDS.contains(&keyword)
}

/// Build the `$ref` string pointing at the root definition named `key`.
pub fn definition_ref(key: &str) -> String {
    format!("{DEFS_REF_PREFIX}{key}")
}

/// Extract the definition name from a `#/$defs/<key>` reference.
pub fn definition_key(reference: &str) -> Option<&str> {
    reference.strip_prefix(DEFS_REF_PREFIX)
}

/// A named value of the `type` keyword.
///
/// `Ref` never appears in a canonical document: it marks a form node whose
/// only job is to hold a `$ref`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::AsRefStr,
    strum::Display,
    strum::VariantArray,
)]
#[strum(serialize_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    Ref,
}

/// The `type` keyword as written in a document.
///
/// Values that are not a single recognized name (type arrays, typos,
/// non-strings) are kept as [`TypeKeyword::Other`] and written back as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKeyword {
    Name(SchemaType),
    Other(Value),
}

impl TypeKeyword {
    /// The recognized type name, if any.
    pub fn name(&self) -> Option<SchemaType> {
        match self {
            Self::Name(ty) => Some(*ty),
            Self::Other(_) => None,
        }
    }
}

impl From<SchemaType> for TypeKeyword {
    fn from(ty: SchemaType) -> Self {
        Self::Name(ty)
    }
}

impl From<Value> for TypeKeyword {
    fn from(value: Value) -> Self {
        match value.as_str().and_then(|s| s.parse::<SchemaType>().ok()) {
            Some(ty) => Self::Name(ty),
            None => Self::Other(value),
        }
    }
}

impl fmt::Display for TypeKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(ty) => write!(f, "{ty}"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for TypeKeyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Name(ty) => serializer.serialize_str(ty.as_ref()),
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TypeKeyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::VariantArray;

    #[test]
    fn type_names_are_lowercase() {
        for ty in SchemaType::VARIANTS {
            let written = ty.to_string();
            assert_eq!(written, written.to_lowercase());
            assert_eq!(written.parse::<SchemaType>().ok(), Some(*ty));
        }
    }

    #[test]
    fn unknown_type_is_preserved() {
        let keyword: TypeKeyword = serde_json::from_value(json!(["string", "null"])).expect("any value");
        assert_eq!(keyword, TypeKeyword::Other(json!(["string", "null"])));
        assert_eq!(
            serde_json::to_value(&keyword).expect("serializable"),
            json!(["string", "null"])
        );
    }

    #[test]
    fn known_type_parses() {
        let keyword: TypeKeyword = serde_json::from_value(json!("integer")).expect("any value");
        assert_eq!(keyword.name(), Some(SchemaType::Integer));
    }

    #[test]
    fn misspelled_type_is_other() {
        let keyword = TypeKeyword::from(json!("strng"));
        assert_eq!(keyword.name(), None);
        assert_eq!(keyword.to_string(), "\"strng\"");
    }

    #[test]
    fn definition_refs() {
        assert_eq!(definition_ref("Address"), "#/$defs/Address");
        assert_eq!(definition_key("#/$defs/Address"), Some("Address"));
        assert_eq!(definition_key("#/definitions/Address"), None);
    }

    #[test]
    fn recognized_keywords() {
        assert!(is_recognized("minContains"));
        assert!(!is_recognized("x-custom"));
    }
}
