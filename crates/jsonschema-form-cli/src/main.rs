use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use jsonschema_form::RootType;
use tracing_subscriber::prelude::*;

mod commands;
mod config;
mod diagnostics;

#[derive(Debug, Clone, Bpaf)]
pub struct CheckArgs {
    /// Schema document to check
    #[bpaf(positional("FILE"))]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
pub struct NormalizeArgs {
    /// Write the result back to FILE instead of printing it
    #[bpaf(short('w'), long("write"), switch)]
    pub write: bool,

    #[bpaf(positional("FILE"))]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
pub struct RenameDefArgs {
    /// Write the result back to FILE instead of printing it
    #[bpaf(short('w'), long("write"), switch)]
    pub write: bool,

    #[bpaf(positional("FILE"))]
    pub file: PathBuf,

    /// Current definition key
    #[bpaf(positional("OLD"))]
    pub old: String,

    /// New definition key
    #[bpaf(positional("NEW"))]
    pub new: String,
}

#[derive(Debug, Clone, Bpaf)]
pub struct RemoveDefArgs {
    /// Write the result back to FILE instead of printing it
    #[bpaf(short('w'), long("write"), switch)]
    pub write: bool,

    #[bpaf(positional("FILE"))]
    pub file: PathBuf,

    /// Definition key to remove
    #[bpaf(positional("KEY"))]
    pub key: String,
}

#[derive(Debug, Clone, Bpaf)]
pub struct NewArgs {
    /// Root type: object or array (default from jsonschema-form.toml)
    #[bpaf(long("root"), argument("TYPE"))]
    pub root: Option<RootType>,
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage)]
/// Check and edit JSON Schema documents the way the form editor sees them
struct Cli {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("check"))]
    /// Validate a document against the draft 2020-12 meta-schema
    Check(#[bpaf(external(check_args))] CheckArgs),

    #[bpaf(command("normalize"))]
    /// Print the canonical form of a document
    Normalize(#[bpaf(external(normalize_args))] NormalizeArgs),

    #[bpaf(command("rename-def"))]
    /// Rename a $defs entry and rewrite references to it
    RenameDef(#[bpaf(external(rename_def_args))] RenameDefArgs),

    #[bpaf(command("remove-def"))]
    /// Remove a $defs entry and clear references to it
    RemoveDef(#[bpaf(external(remove_def_args))] RemoveDefArgs),

    #[bpaf(command("new"))]
    /// Print the document a new editing session starts from
    New(#[bpaf(external(new_args))] NewArgs),

    #[bpaf(command("schema"))]
    /// Print the JSON Schema for jsonschema-form.toml
    Schema,

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

fn init_tracing() {
    if let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env("JSONSCHEMA_FORM_LOG") {
        tracing_subscriber::registry()
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true)
                    .with_indent_lines(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = cli().run();

    let result = match cli.command {
        Commands::Check(args) => commands::check::run(&args),
        Commands::Normalize(args) => commands::normalize::run(&args).map(|()| false),
        Commands::RenameDef(args) => commands::definitions::rename(&args).map(|()| false),
        Commands::RemoveDef(args) => commands::definitions::remove(&args).map(|()| false),
        Commands::New(args) => commands::new::run(&args).map(|()| false),
        Commands::Schema => config::schema()
            .and_then(|schema| serde_json::to_string_pretty(&schema))
            .map(|text| {
                println!("{text}");
                false
            })
            .map_err(Into::into),
        Commands::Version => {
            println!("jsonschema-form {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_check() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["check", "person.json"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Check(args) => assert_eq!(args.file, PathBuf::from("person.json")),
            _ => panic!("expected Check"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_rename_def() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["rename-def", "-w", "person.json", "Address", "PostalAddress"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::RenameDef(args) => {
                assert!(args.write);
                assert_eq!(args.file, PathBuf::from("person.json"));
                assert_eq!(args.old, "Address");
                assert_eq!(args.new, "PostalAddress");
            }
            _ => panic!("expected RenameDef"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_remove_def_without_write() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["remove-def", "person.json", "Legacy"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::RemoveDef(args) => {
                assert!(!args.write);
                assert_eq!(args.key, "Legacy");
            }
            _ => panic!("expected RemoveDef"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_new_root() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["new", "--root", "array"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::New(args) => assert_eq!(args.root, Some(RootType::Array)),
            _ => panic!("expected New"),
        }
        Ok(())
    }

    #[test]
    fn cli_new_defaults_to_config_root() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["new"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::New(args) => assert_eq!(args.root, None),
            _ => panic!("expected New"),
        }
        Ok(())
    }

    #[test]
    fn cli_rejects_unknown_root() {
        assert!(cli().run_inner(&["new", "--root", "string"]).is_err());
    }
}
