use anyhow::{Result, anyhow};

use crate::commands::{emit, open_session, read_schema};
use crate::config;
use crate::{RemoveDefArgs, RenameDefArgs};

/// Run the `rename-def` command.
pub fn rename(args: &RenameDefArgs) -> Result<()> {
    let config = config::load_for(&args.file)?;
    let mut session = open_session(read_schema(&args.file)?, &config)?;
    let index = session
        .form()
        .definition_index(&args.old)
        .ok_or_else(|| anyhow!("no definition named '{}' in {}", args.old, args.file.display()))?;
    session.rename_definition(index, &args.new)?;
    emit(session.schema(), args.write.then_some(args.file.as_path()))
}

/// Run the `remove-def` command. References to the definition are cleared.
pub fn remove(args: &RemoveDefArgs) -> Result<()> {
    let config = config::load_for(&args.file)?;
    let mut session = open_session(read_schema(&args.file)?, &config)?;
    let index = session
        .form()
        .definition_index(&args.key)
        .ok_or_else(|| anyhow!("no definition named '{}' in {}", args.key, args.file.display()))?;
    session.remove_definition(index)?;
    emit(session.schema(), args.write.then_some(args.file.as_path()))
}
