//! Dot-separated addressing into the form document.
//!
//! `properties.0.schema.properties.2.key` walks object keys and array
//! indices alike: a segment indexes an array when the current value is one.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("{path}: index {index} is out of range (length {len})")]
    OutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("{path}: '{segment}' is not an array index")]
    NotAnIndex { path: String, segment: String },
    #[error("{path}: cannot descend into a {kind} value")]
    NotAContainer { path: String, kind: &'static str },
    #[error("{path}: expected an array")]
    NotAnArray { path: String },
}

/// Split a dotted path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Join segments back into a dotted path.
pub fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(".")
}

/// Look up the value at `path`.
pub fn get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `new_value` at `path`.
///
/// Missing object keys along the way are created as empty objects; array
/// indices must already exist.
pub fn set(value: &mut Value, path: &str, new_value: Value) -> Result<(), PathError> {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(PathError::Empty);
    };

    let mut current = value;
    for (depth, segment) in parents.iter().enumerate() {
        let here = join(parts[..=depth].iter().copied());
        current = step_mut(current, segment, &here)?;
    }

    match current {
        Value::Object(map) => {
            map.insert((*last).to_string(), new_value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            let len = items.len();
            let slot = items.get_mut(index).ok_or(PathError::OutOfRange {
                path: path.to_string(),
                index,
                len,
            })?;
            *slot = new_value;
            Ok(())
        }
        other => Err(PathError::NotAContainer {
            path: path.to_string(),
            kind: kind(other),
        }),
    }
}

/// Mutable access to the array at `path`, creating it when the slot is
/// missing or `null`.
pub fn array_mut<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Vec<Value>, PathError> {
    let mut current = value;
    let parts: Vec<&str> = segments(path).collect();
    for (depth, segment) in parts.iter().enumerate() {
        let here = join(parts[..=depth].iter().copied());
        current = step_mut(current, segment, &here)?;
    }
    if current.is_null() || current.as_object().is_some_and(Map::is_empty) {
        *current = Value::Array(Vec::new());
    }
    match current {
        Value::Array(items) => Ok(items),
        _ => Err(PathError::NotAnArray {
            path: path.to_string(),
        }),
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &str, here: &str) -> Result<&'a mut Value, PathError> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = parse_index(segment, here)?;
            let len = items.len();
            items.get_mut(index).ok_or(PathError::OutOfRange {
                path: here.to_string(),
                index,
                len,
            })
        }
        other => Err(PathError::NotAContainer {
            path: here.to_string(),
            kind: kind(other),
        }),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, PathError> {
    segment.parse().map_err(|_| PathError::NotAnIndex {
        path: path.to_string(),
        segment: segment.to_string(),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "root": {"type": "object"},
            "properties": [
                {"id": "1", "key": "a", "schema": {"type": "object", "properties": [
                    {"id": "2", "key": "b", "schema": {"type": "string"}}
                ]}}
            ]
        })
    }

    #[test]
    fn get_walks_keys_and_indices() {
        let doc = doc();
        assert_eq!(get(&doc, "properties.0.schema.properties.0.key"), Some(&json!("b")));
        assert_eq!(get(&doc, "properties.3.key"), None);
        assert_eq!(get(&doc, "root.type.x"), None);
        assert_eq!(get(&doc, ""), Some(&doc));
    }

    #[test]
    fn set_replaces_existing_values() {
        let mut doc = doc();
        set(&mut doc, "properties.0.schema.properties.0.key", json!("renamed")).expect("set");
        assert_eq!(doc["properties"][0]["schema"]["properties"][0]["key"], "renamed");
    }

    #[test]
    fn set_creates_missing_object_keys() {
        let mut doc = doc();
        set(&mut doc, "root.items.minItems", json!(2)).expect("set");
        assert_eq!(doc["root"]["items"], json!({"minItems": 2}));
    }

    #[test]
    fn set_rejects_out_of_range_index() {
        let mut doc = doc();
        let err = set(&mut doc, "properties.4.key", json!("x")).expect_err("out of range");
        assert_eq!(
            err,
            PathError::OutOfRange {
                path: "properties.4".to_string(),
                index: 4,
                len: 1
            }
        );
    }

    #[test]
    fn set_rejects_scalar_parents() {
        let mut doc = doc();
        let err = set(&mut doc, "root.type.inner", json!(1)).expect_err("scalar parent");
        assert!(matches!(err, PathError::NotAContainer { kind: "string", .. }));
    }

    #[test]
    fn set_rejects_empty_path() {
        let mut doc = doc();
        assert_eq!(set(&mut doc, "", json!(1)), Err(PathError::Empty));
    }

    #[test]
    fn array_mut_creates_missing_lists() {
        let mut doc = doc();
        array_mut(&mut doc, "definitions").expect("created").push(json!({"key": "d"}));
        assert_eq!(doc["definitions"], json!([{"key": "d"}]));
    }

    #[test]
    fn array_mut_rejects_non_arrays() {
        let mut doc = doc();
        assert!(matches!(
            array_mut(&mut doc, "root.type"),
            Err(PathError::NotAnArray { .. })
        ));
    }
}
