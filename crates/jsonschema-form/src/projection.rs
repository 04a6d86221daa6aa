//! Mapping meta-validation errors onto form field paths.
//!
//! The canonical document nests `properties/<key>` where the form tree has
//! `properties.<index>.schema`. Only the first property level is resolved:
//! `/properties/a/properties/b/minimum` lands on `properties.<i>.schema.properties`.

use jsonschema_schema::FormSchema;

use crate::meta::MetaError;

/// A field-level error annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted form path, e.g. `properties.0.schema.minimum` or `root.type`.
    pub path: String,
    pub message: String,
}

/// Project validator errors onto form paths.
///
/// Errors under an unknown top-level property, or naming a property with
/// no keyword after it, resolve to no field and are dropped.
pub fn project_errors(form: &FormSchema, errors: &[MetaError]) -> Vec<FieldError> {
    errors
        .iter()
        .filter_map(|error| {
            field_path(form, &error.instance_path).map(|path| FieldError {
                path,
                message: error.message.clone(),
            })
        })
        .collect()
}

/// The form path for one `instancePath`, if it resolves.
pub fn field_path(form: &FormSchema, instance_path: &str) -> Option<String> {
    let parts: Vec<&str> = instance_path.split('/').filter(|s| !s.is_empty()).collect();
    match parts.as_slice() {
        ["properties", key, rest @ ..] => {
            let key = unescape(key);
            let index = form.field_index(&key)?;
            let keyword = rest.first()?;
            Some(format!("properties.{index}.schema.{}", unescape(keyword)))
        }
        [first, ..] => Some(format!("root.{}", unescape(first))),
        [] => None,
    }
}

/// Decode a JSON Pointer reference token.
fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
