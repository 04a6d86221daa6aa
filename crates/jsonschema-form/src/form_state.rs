use indexmap::IndexMap;
use jsonschema_schema::FormSchema;
use serde_json::Value;

use crate::path::{self, PathError};

/// In-memory form container.
///
/// Holds the form tree as a JSON document (camelCase keys, field lists as
/// arrays) plus one error message per field path.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    value: Value,
    errors: IndexMap<String, String>,
    revision: u64,
}

impl FormState {
    /// A container holding `form`.
    pub fn new(form: &FormSchema) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::to_value(form)?,
            ..Self::default()
        })
    }

    /// The value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path::get(&self.value, path)
    }

    /// Write a value at a dotted path.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), PathError> {
        path::set(&mut self.value, path, value)?;
        self.revision += 1;
        Ok(())
    }

    /// The array at `path`, as a list of raw items.
    pub fn items(&self, path: &str) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Push an item onto the array at `path`, creating the array if needed.
    pub fn append(&mut self, path: &str, item: Value) -> Result<(), PathError> {
        path::array_mut(&mut self.value, path)?.push(item);
        self.revision += 1;
        Ok(())
    }

    /// Remove the item at `index` from the array at `path`.
    ///
    /// Later items shift down by one. A failed removal leaves the tree
    /// untouched.
    pub fn remove(&mut self, path: &str, index: usize) -> Result<Value, PathError> {
        let len = self
            .get(path)
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| PathError::NotAnArray {
                path: path.to_string(),
            })?;
        if index >= len {
            return Err(PathError::OutOfRange {
                path: path.to_string(),
                index,
                len,
            });
        }
        let removed = path::array_mut(&mut self.value, path)?.remove(index);
        self.revision += 1;
        Ok(removed)
    }

    /// Replace the whole tree.
    pub fn reset(&mut self, form: &FormSchema) -> Result<(), serde_json::Error> {
        self.value = serde_json::to_value(form)?;
        self.revision += 1;
        Ok(())
    }

    /// The current tree, read through the lenient typed model.
    pub fn watch(&self) -> FormSchema {
        FormSchema::from_value(self.value.clone())
    }

    /// The raw form document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_field_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(path.into(), message.into());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Field errors keyed by dotted path, in the order they were set.
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }
}
