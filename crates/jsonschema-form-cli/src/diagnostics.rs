use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A problem found in a schema document.
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaDiagnostic {
    #[error("{message}")]
    #[diagnostic(code(jsonschema_form::parse))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
    },

    #[error("{message}")]
    #[diagnostic(code(jsonschema_form::meta_schema), help("{location}"))]
    Invalid {
        #[source_code]
        src: NamedSource<String>,
        #[label("{instance_path}")]
        span: SourceSpan,
        instance_path: String,
        /// Where the form editor shows this error.
        location: String,
        message: String,
    },

    #[error("reference to missing definition '{reference}'")]
    #[diagnostic(code(jsonschema_form::dangling_ref), severity(Warning))]
    DanglingRef {
        #[source_code]
        src: NamedSource<String>,
        #[label("no such definition")]
        span: SourceSpan,
        reference: String,
    },
}

impl SchemaDiagnostic {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::DanglingRef { .. })
    }
}

/// Help text for an error shown at `field` in the form, if anywhere.
pub fn location_help(field: Option<&str>) -> String {
    match field {
        Some(path) => format!("shown on form field `{path}`"),
        None => "not attached to any form field".to_string(),
    }
}

/// Byte offset of a 1-based line and column.
pub fn line_col_to_offset(content: &str, line: usize, column: usize) -> usize {
    let line_start: usize = content
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(content.len())
}

/// Byte span `(offset, length)` of the value addressed by a JSON Pointer,
/// located by searching for each key in turn.
///
/// Array indices are skipped. A root pointer maps to the start of the
/// document; a key that cannot be found leaves the span at the last key
/// that was.
pub fn find_instance_path_span(content: &str, instance_path: &str) -> (usize, usize) {
    let mut cursor = 0;
    let mut span = (content.len() - content.trim_start().len(), 0);
    for token in instance_path.split('/').filter(|s| !s.is_empty()) {
        if token.parse::<usize>().is_ok() {
            continue;
        }
        let key = format!("\"{}\"", token.replace("~1", "/").replace("~0", "~"));
        let Some(pos) = content[cursor..].find(&key) else {
            break;
        };
        span = (cursor + pos, key.len());
        cursor += pos + key.len();
    }
    span
}

/// Byte span of the first occurrence of `reference` as a JSON string.
pub fn find_string_span(content: &str, reference: &str) -> (usize, usize) {
    let needle = format!("\"{reference}\"");
    content
        .find(&needle)
        .map_or((0, 0), |pos| (pos, needle.len()))
}
