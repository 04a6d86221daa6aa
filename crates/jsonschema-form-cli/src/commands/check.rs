use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonschema_form::IdGenerator;
use jsonschema_form::meta::{DraftMetaValidator, MetaValidator};
use jsonschema_form::projection::field_path;
use jsonschema_form::refs::dangling_references;
use jsonschema_form::to_form;
use jsonschema_schema::SchemaNode;
use miette::NamedSource;
use serde_json::Value;

use crate::CheckArgs;
use crate::config::{self, Config};
use crate::diagnostics::{
    SchemaDiagnostic, find_instance_path_span, find_string_span, line_col_to_offset,
    location_help,
};

/// Run the `check` command. Returns `true` when the document has errors.
pub fn run(args: &CheckArgs) -> Result<bool> {
    let config = config::load_for(&args.file)?;
    let diagnostics = check_file(&args.file, &config)?;
    let had_errors = diagnostics.iter().any(SchemaDiagnostic::is_error);
    let count = diagnostics.len();
    for diagnostic in diagnostics {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    if had_errors {
        eprintln!("{}: {count} problem(s)", args.file.display());
    } else {
        eprintln!("{}: valid", args.file.display());
    }
    Ok(had_errors)
}

/// Meta-validate one document and locate each problem in its text.
pub fn check_file(path: &Path, config: &Config) -> Result<Vec<SchemaDiagnostic>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.display().to_string();

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let offset = line_col_to_offset(&content, e.line(), e.column());
            return Ok(vec![SchemaDiagnostic::Parse {
                src: NamedSource::new(name, content),
                span: (offset, 0).into(),
                message: e.to_string(),
            }]);
        }
    };

    let validator = DraftMetaValidator::with_formats(config.validate_formats)?;
    let form = to_form(&SchemaNode::from_value(value.clone()), &mut IdGenerator::new());

    let mut diagnostics = Vec::new();
    for error in validator.validate(&value).unwrap_or_default() {
        let field = field_path(&form, &error.instance_path);
        diagnostics.push(SchemaDiagnostic::Invalid {
            src: NamedSource::new(name.clone(), content.clone()),
            span: find_instance_path_span(&content, &error.instance_path).into(),
            location: location_help(field.as_deref()),
            instance_path: error.instance_path,
            message: error.message,
        });
    }
    for reference in dangling_references(&form) {
        diagnostics.push(SchemaDiagnostic::DanglingRef {
            src: NamedSource::new(name.clone(), content.clone()),
            span: find_string_span(&content, &reference).into(),
            reference,
        });
    }
    tracing::debug!(file = %name, count = diagnostics.len(), "checked");
    Ok(diagnostics)
}
