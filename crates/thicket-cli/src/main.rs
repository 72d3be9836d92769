#![forbid(unsafe_code)]

mod cmd;
mod output;
mod workspace;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::Session;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::io;
use std::path::PathBuf;
use thicket_core::config::{EffectiveConfig, resolve_config};
use thicket_core::{ErrorCode, LockError, StoreConfig};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use workspace::{DEFAULT_FILE, Workspace};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "thicket: an indexed multi-parent record hierarchy",
    long_about = None
)]
struct Cli {
    /// Log at debug level (ignored when THICKET_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Snapshot file to operate on.
    #[arg(long, global = true, default_value = DEFAULT_FILE)]
    file: PathBuf,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Payload field used to disambiguate colliding identifiers; repeatable,
    /// tried in order. Overrides config files and the snapshot's own list.
    #[arg(long = "disambiguate", global = true, value_name = "FIELD")]
    disambiguate: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Store settings from the flag, else from the config files.
    fn store_config(&self, config: &EffectiveConfig) -> Option<StoreConfig> {
        if self.disambiguate.is_empty() {
            config.store.clone()
        } else {
            Some(StoreConfig::with_disambiguation(
                self.disambiguate.iter().cloned(),
            ))
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Create an empty snapshot",
        long_about = "Create an empty snapshot file, recording the disambiguation fields in effect.",
        after_help = "EXAMPLES:\n    # Create thicket.json in the current directory\n    tk init\n\n    # Disambiguate colliding names by their `type` field\n    tk init --disambiguate type"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Add a record",
        long_about = "Add a record under a parent (the top level by default) and print its identifier.",
        after_help = "EXAMPLES:\n    # Add a top-level record\n    tk add project\n\n    # Add under a parent with payload fields\n    tk add main --parent src --field type=function --field lines=40\n\n    # Emit machine-readable output\n    tk add docs --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Remove records",
        long_about = "Remove records. Children are removed too unless --promote re-links them under the removed record's parents.",
        after_help = "EXAMPLES:\n    # Remove a record and everything below it\n    tk rm src\n\n    # Remove a record but keep its children\n    tk rm src --promote"
    )]
    Rm(cmd::rm::RmArgs),

    #[command(
        next_help_heading = "Relationships",
        about = "Add a parent to a record",
        long_about = "Link CHILD under PARENT, keeping its other parents unless --clear is given.",
        after_help = "EXAMPLES:\n    # Give `lib` a second parent\n    tk link lib docs\n\n    # Move `lib` so `docs` is its only parent\n    tk link lib docs --clear"
    )]
    Link(cmd::link::LinkArgs),

    #[command(
        next_help_heading = "Relationships",
        about = "Drop a parent from a record",
        after_help = "EXAMPLES:\n    # Detach `lib` from `docs`\n    tk unlink lib docs"
    )]
    Unlink(cmd::link::UnlinkArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one record",
        after_help = "EXAMPLES:\n    # Show a record\n    tk show main\n\n    # Emit machine-readable output\n    tk show main --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Read", about = "List a record's children")]
    Children(cmd::show::NeighbourArgs),

    #[command(next_help_heading = "Read", about = "List a record's parents")]
    Parents(cmd::show::NeighbourArgs),

    #[command(
        next_help_heading = "Read",
        about = "Draw the hierarchy",
        after_help = "EXAMPLES:\n    # Draw everything\n    tk tree\n\n    # Two levels below `src`\n    tk tree src --depth 2"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Read",
        about = "Find records by field value",
        after_help = "EXAMPLES:\n    # Records whose `type` is \"function\"\n    tk find type=function\n\n    # Match by name\n    tk find name=main"
    )]
    Find(cmd::find::FindArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Verify relationship invariants",
        long_about = "Load the snapshot and report every relationship that breaks the store's invariants. Exits non-zero on any violation."
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    tk completions bash > ~/.local/share/bash-completion/completions/tk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Filter used when `THICKET_LOG` is unset.
const fn default_directives(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "thicket=debug,info"
    } else {
        "thicket=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("THICKET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_directives(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("THICKET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, file = %cli.file.display(), "starting");

    if let Commands::Completions(ref args) = cli.command {
        return cmd::completions::run_completions(args.shell, &mut Cli::command());
    }

    let config = match resolve_config(&Workspace::project_root(&cli.file)) {
        Ok(config) => config,
        Err(e) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            render_error(
                output,
                &CliError::with_code(format!("{e:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(e);
        }
    };

    let session = Session {
        file: cli.file.clone(),
        output: resolve_output_mode(cli.format, cli.json, config.output.as_deref()),
        store_config: cli.store_config(&config),
    };

    let result = match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &session),
        Commands::Add(ref args) => cmd::add::run_add(args, &session),
        Commands::Rm(ref args) => cmd::rm::run_rm(args, &session),
        Commands::Link(ref args) => cmd::link::run_link(args, &session),
        Commands::Unlink(ref args) => cmd::link::run_unlink(args, &session),
        Commands::Show(ref args) => cmd::show::run_show(args, &session),
        Commands::Children(ref args) => cmd::show::run_children(args, &session),
        Commands::Parents(ref args) => cmd::show::run_parents(args, &session),
        Commands::Tree(ref args) => cmd::tree::run_tree(args, &session),
        Commands::Find(ref args) => cmd::find::run_find(args, &session),
        Commands::Check(ref args) => cmd::check::run_check(args, &session),
        Commands::Completions(_) => Ok(()),
    };

    if let Err(ref e) = result
        && let Some(lock) = e.chain().find_map(|c| c.downcast_ref::<LockError>())
    {
        render_error(
            session.output,
            &CliError::with_code(lock.to_string(), lock.code()),
        )?;
    }
    result
}
