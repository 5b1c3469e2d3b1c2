//! Binary entrypoint for buttonmap.
use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};
use tracing::error;

/// Offline table commands: list, map, remove, check.
mod commands;
mod error;
/// Live sessions that own the event tap.
mod session;

use crate::{commands::Context, error::Result};

#[derive(Parser, Debug)]
#[command(
    name = "buttonmap",
    about = "Remap mouse buttons, shortcuts and media keys",
    version
)]
/// Command-line interface for the `buttonmap` binary.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the settings file (defaults to ~/.buttonmap/config.ron)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the entry and mapping tables
    #[arg(long, value_name = "DIR", global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Install the event tap and remap input until interrupted.
    Run,
    /// Learn a new trigger from the next button or shortcut pressed.
    Learn {
        /// Name for the new entry (defaults to the trigger's label)
        #[arg(long)]
        name: Option<String>,
    },
    /// List entries and their actions.
    List,
    /// List the available actions.
    Actions,
    /// Assign an action to an entry.
    Map {
        /// Entry id or name
        entry: String,
        /// Action id, e.g. `copy` or `missionControl`
        action: String,
    },
    /// Remove an entry and its mapping.
    Remove {
        /// Entry id or name
        entry: String,
    },
    /// Load, sanitize and migrate the stored state, then report it.
    Check,
}

/// Dispatch `cli.command`.
async fn dispatch(cli: Cli) -> Result<()> {
    if let Command::Actions = cli.command {
        print!("{}", commands::format_actions());
        return Ok(());
    }
    let ctx = Context::resolve(cli.config.as_deref(), cli.state_dir.as_deref())?;
    match cli.command {
        Command::Run => session::run(&ctx).await?,
        Command::Learn { name } => session::learn(&ctx, name.as_deref()).await?,
        Command::List => print!("{}", commands::format_list(ctx.engine().table())),
        Command::Map { entry, action } => println!("{}", commands::map(&ctx, &entry, &action)?),
        Command::Remove { entry } => println!("{}", commands::remove(&ctx, &entry)?),
        Command::Check => print!("{}", commands::check(&ctx)),
        Command::Actions => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    if let Err(e) = dispatch(cli).await {
        error!(error = %e, "command_failed");
        eprintln!("{e}");
        process::exit(1);
    }
}
