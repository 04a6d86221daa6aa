use std::path::{Path, PathBuf};

use jsonschema_form::RootType;
use jsonschema_schema::DRAFT_2020_12;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const CONFIG_FILENAME: &str = "jsonschema-form.toml";

fn default_dialect() -> String {
    DRAFT_2020_12.to_string()
}

/// Root shape of newly created documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    #[default]
    Object,
    Array,
}

impl From<RootKind> for RootType {
    fn from(kind: RootKind) -> Self {
        match kind {
            RootKind::Object => RootType::Object,
            RootKind::Array => RootType::Array,
        }
    }
}

/// Settings for the `jsonschema-form` command.
///
/// The nearest `jsonschema-form.toml` above the edited document applies;
/// files further up are not merged.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "jsonschema-form.toml")]
pub struct Config {
    /// Root type for documents created with `new`.
    #[schemars(title = "Root Type")]
    #[serde(default)]
    pub root_type: RootKind,

    /// Assert `format` values during meta-validation instead of treating
    /// them as annotations.
    #[schemars(title = "Validate Formats")]
    #[serde(default)]
    pub validate_formats: bool,

    /// `$schema` URI written into new documents.
    #[schemars(title = "Dialect")]
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_type: RootKind::default(),
            validate_formats: false,
            dialect: default_dialect(),
        }
    }
}

/// The JSON Schema for `jsonschema-form.toml`.
///
/// # Errors
///
/// Returns an error if the generated schema cannot be serialized.
pub fn schema() -> Result<Value, serde_json::Error> {
    serde_json::to_value(schema_for!(Config))
}

/// Nearest `jsonschema-form.toml` at or above `start_dir`.
pub fn find_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load the nearest config at or above `start_dir`.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn find_and_load(start_dir: &Path) -> Result<Option<Config>, anyhow::Error> {
    let Some(path) = find_config_path(start_dir) else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(Some(config))
}

/// Config governing `document`, or the defaults when there is none.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_for(document: &Path) -> Result<Config, anyhow::Error> {
    let start = match document.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    Ok(find_and_load(&start)?.unwrap_or_default())
}

/// Config for the working directory.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load() -> Result<Config, anyhow::Error> {
    let cwd = std::env::current_dir()?;
    Ok(find_and_load(&cwd)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_config_from_directory() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "root_type = \"array\"\nvalidate_formats = true\n",
        )?;

        let config = find_and_load(tmp.path())?.expect("config should exist");
        assert_eq!(config.root_type, RootKind::Array);
        assert!(config.validate_formats);
        assert_eq!(config.dialect, DRAFT_2020_12);
        Ok(())
    }

    #[test]
    fn walks_up_to_find_config() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let sub = tmp.path().join("schemas/nested");
        fs::create_dir_all(&sub)?;
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "dialect = \"https://example.com/dialect\"",
        )?;

        let config = load_for(&sub.join("person.json"))?;
        assert_eq!(config.dialect, "https://example.com/dialect");
        Ok(())
    }

    #[test]
    fn nearest_config_wins() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let sub = tmp.path().join("inner");
        fs::create_dir_all(&sub)?;
        fs::write(tmp.path().join(CONFIG_FILENAME), "validate_formats = true")?;
        fs::write(sub.join(CONFIG_FILENAME), "root_type = \"array\"")?;

        let config = find_and_load(&sub)?.expect("config should exist");
        assert_eq!(config.root_type, RootKind::Array);
        assert!(!config.validate_formats);
        Ok(())
    }

    #[test]
    fn returns_none_when_no_config() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        assert!(find_and_load(tmp.path())?.is_none());
        Ok(())
    }

    #[test]
    fn empty_config_uses_defaults() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join(CONFIG_FILENAME), "")?;

        let config = find_and_load(tmp.path())?.expect("config should exist");
        assert_eq!(config.root_type, RootKind::Object);
        assert!(!config.validate_formats);
        assert_eq!(config.dialect, DRAFT_2020_12);
        Ok(())
    }

    #[test]
    fn rejects_unknown_fields() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::write(tmp.path().join(CONFIG_FILENAME), "bogus = true")?;
        let err = find_and_load(tmp.path()).expect_err("unknown field");
        assert!(err.to_string().contains("bogus"), "{err}");
        Ok(())
    }

    #[test]
    fn config_schema_lists_settings() -> anyhow::Result<()> {
        let schema = schema()?;
        let properties = schema["properties"]
            .as_object()
            .expect("object schema");
        assert!(properties.contains_key("root_type"));
        assert!(properties.contains_key("validate_formats"));
        assert!(properties.contains_key("dialect"));
        Ok(())
    }
}
