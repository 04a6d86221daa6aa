pub mod check;
pub mod definitions;
pub mod new;
pub mod normalize;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonschema_form::meta::DraftMetaValidator;
use jsonschema_form::{EditorSession, SessionOptions};
use jsonschema_schema::SchemaNode;
use serde_json::Value;

use crate::config::Config;

/// Read and parse a schema document.
pub fn read_schema(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Start an editing session over `document` with the validator `config` asks for.
pub fn open_session(document: Value, config: &Config) -> Result<EditorSession> {
    let validator = DraftMetaValidator::with_formats(config.validate_formats)?;
    let options = SessionOptions {
        root_type: config.root_type.into(),
        default_value: Some(SchemaNode::from_value(document)),
        dialect: config.dialect.clone(),
        ..SessionOptions::default()
    };
    Ok(EditorSession::with_validator(options, validator)?)
}

/// Print `schema` as pretty JSON, or write it to `target`.
pub fn emit(schema: &SchemaNode, target: Option<&Path>) -> Result<()> {
    let mut text = serde_json::to_string_pretty(schema)?;
    text.push('\n');
    match target {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
