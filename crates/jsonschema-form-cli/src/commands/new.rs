use anyhow::Result;
use jsonschema_form::{EditorSession, SessionOptions};

use crate::NewArgs;
use crate::commands::emit;
use crate::config;

/// Run the `new` command: print the document a fresh session starts from.
pub fn run(args: &NewArgs) -> Result<()> {
    let config = config::load()?;
    let root_type = args.root.unwrap_or_else(|| config.root_type.into());
    let session = EditorSession::new(SessionOptions {
        root_type,
        dialect: config.dialect,
        ..SessionOptions::default()
    })?;
    emit(session.schema(), None)
}
