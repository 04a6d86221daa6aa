//! Meta-validation: checking that an authored document is itself a valid
//! draft 2020-12 schema.

use jsonschema_schema::DRAFT_2020_12;
use serde_json::{Value, json};
use thiserror::Error;

/// One meta-schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaError {
    /// JSON Pointer into the validated schema document, e.g.
    /// `/properties/age/minimum`. Empty for the document root.
    pub instance_path: String,
    pub message: String,
}

/// Validates schema documents against a meta-schema.
pub trait MetaValidator {
    /// `None` when `schema` is valid, otherwise the errors in validator order.
    fn validate(&self, schema: &Value) -> Option<Vec<MetaError>>;
}

#[derive(Debug, Error)]
pub enum MetaSchemaError {
    #[error("failed to compile the draft 2020-12 meta-schema: {0}")]
    Compile(String),
}

/// Meta-validator for draft 2020-12, backed by the `jsonschema` crate.
///
/// `format` is treated as an annotation unless format validation is enabled.
pub struct DraftMetaValidator {
    validator: jsonschema::Validator,
}

impl DraftMetaValidator {
    /// Build a validator with format annotations only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled meta-schema fails to compile.
    pub fn new() -> Result<Self, MetaSchemaError> {
        Self::with_formats(false)
    }

    /// Build a validator, optionally asserting `format` values.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled meta-schema fails to compile.
    pub fn with_formats(validate_formats: bool) -> Result<Self, MetaSchemaError> {
        // The draft 2020-12 meta-schema and its vocabularies ship with the
        // validator's default registry, so this resolves without I/O.
        let meta = json!({
            "$schema": DRAFT_2020_12,
            "$ref": DRAFT_2020_12,
        });
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(validate_formats)
            .build(&meta)
            .map_err(|e| MetaSchemaError::Compile(e.to_string()))?;
        Ok(Self { validator })
    }
}

impl MetaValidator for DraftMetaValidator {
    fn validate(&self, schema: &Value) -> Option<Vec<MetaError>> {
        let errors: Vec<MetaError> = self
            .validator
            .iter_errors(schema)
            .map(|error| MetaError {
                instance_path: error.instance_path().to_string(),
                message: clean_error_message(error.to_string()),
            })
            .collect();
        (!errors.is_empty()).then_some(errors)
    }
}

/// Trim `oneOf`/`anyOf` failures that echo the whole offending value.
///
/// `{...} is not valid under any of the schemas listed in the 'anyOf' keyword`
/// becomes `not valid under any of the schemas listed in the 'anyOf' keyword`.
fn clean_error_message(msg: String) -> String {
    const MARKER: &str = " is not valid under any of the schemas listed in the '";
    if let Some(pos) = msg.find(MARKER) {
        return msg[pos + 4..].to_string();
    }
    msg
}

/// Why a free-text keyword value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("Invalid JSON format.")]
    InvalidJson,
    #[error("Invalid schema structure.")]
    InvalidSchema(Vec<MetaError>),
}

/// Parse and check text typed into a keyword editor (`allOf`, `anyOf`,
/// `oneOf`, `not`, `additionalProperties`, ...).
///
/// The parsed value is validated in isolation as `{ <keyword>: value }`, so
/// an array of schemas for a combinator and a boolean for
/// `additionalProperties` are both accepted.
///
/// # Errors
///
/// [`FragmentError::InvalidJson`] if `text` does not parse,
/// [`FragmentError::InvalidSchema`] if the fragment breaks the meta-schema.
pub fn validate_keyword_text(
    validator: &impl MetaValidator,
    keyword: &str,
    text: &str,
) -> Result<Value, FragmentError> {
    let value: Value = serde_json::from_str(text).map_err(|_| FragmentError::InvalidJson)?;
    let mut fragment = serde_json::Map::new();
    fragment.insert(keyword.to_string(), value.clone());
    match validator.validate(&Value::Object(fragment)) {
        None => Ok(value),
        Some(errors) => Err(FragmentError::InvalidSchema(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> DraftMetaValidator {
        DraftMetaValidator::new().expect("meta-schema compiles")
    }

    #[test]
    fn valid_schema_has_no_errors() {
        let schema = json!({
            "$schema": DRAFT_2020_12,
            "type": "object",
            "properties": {"email": {"type": "string", "format": "email"}},
            "required": ["email"]
        });
        let v = validator();
        assert_eq!(v.validate(&schema), None);
        // no accumulation across calls
        assert_eq!(v.validate(&schema), None);
    }

    #[test]
    fn invalid_minimum_is_located() {
        let schema = json!({
            "type": "object",
            "properties": {"age": {"type": "number", "minimum": "invalid"}}
        });
        let errors = validator().validate(&schema).expect("invalid");
        assert!(
            errors
                .iter()
                .any(|e| e.instance_path == "/properties/age/minimum"),
            "{errors:?}"
        );
    }

    #[test]
    fn invalid_type_is_reported_at_root_keyword() {
        let errors = validator()
            .validate(&json!({"type": "strng"}))
            .expect("invalid");
        assert!(errors.iter().all(|e| e.instance_path.starts_with("/type")));
    }

    #[test]
    fn unknown_format_is_an_annotation() {
        let schema = json!({"type": "string", "format": "not-a-real-format"});
        assert_eq!(validator().validate(&schema), None);
    }

    #[test]
    fn keyword_text_accepts_valid_fragments() {
        let v = validator();
        assert_eq!(
            validate_keyword_text(&v, "anyOf", r#"[{"type": "string"}, {"type": "null"}]"#),
            Ok(json!([{"type": "string"}, {"type": "null"}]))
        );
        assert_eq!(
            validate_keyword_text(&v, "additionalProperties", "false"),
            Ok(json!(false))
        );
    }

    #[test]
    fn keyword_text_rejects_bad_json() {
        let err = validate_keyword_text(&validator(), "allOf", "[{").expect_err("bad json");
        assert_eq!(err, FragmentError::InvalidJson);
        assert_eq!(err.to_string(), "Invalid JSON format.");
    }

    #[test]
    fn keyword_text_rejects_bad_structure() {
        let err = validate_keyword_text(&validator(), "allOf", r#"{"type": "string"}"#)
            .expect_err("allOf must be an array");
        assert!(matches!(err, FragmentError::InvalidSchema(_)));
        assert_eq!(err.to_string(), "Invalid schema structure.");
    }

    #[test]
    fn clean_error_message_strips_value_prefix() {
        let raw = r#"{"a":1} is not valid under any of the schemas listed in the 'oneOf' keyword"#;
        assert_eq!(
            clean_error_message(raw.to_string()),
            "not valid under any of the schemas listed in the 'oneOf' keyword"
        );
        assert_eq!(clean_error_message("plain".to_string()), "plain");
    }
}
