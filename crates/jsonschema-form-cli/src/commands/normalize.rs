use anyhow::Result;

use crate::NormalizeArgs;
use crate::commands::{emit, open_session, read_schema};
use crate::config;

/// Run the `normalize` command: load the document into an editing session
/// and emit the schema derived from it.
pub fn run(args: &NormalizeArgs) -> Result<()> {
    let config = config::load_for(&args.file)?;
    let session = open_session(read_schema(&args.file)?, &config)?;
    emit(session.schema(), args.write.then_some(args.file.as_path()))
}
