//! Command-line interface definitions.
//!
//! Lives in the library so that `cargo xtask man` can render the man page
//! from the same definitions the binary parses.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[cfg(not(feature = "release"))]
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("TERMSTAGE_BUILD_DATE"),
    ")"
);

#[cfg(feature = "release")]
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("TERMSTAGE_BUILD_DATE"),
    ")"
);

#[derive(Debug, Parser)]
#[command(
    name = "termstage",
    version = VERSION,
    about = "Scripted live terminal demos on tmux",
    long_about = "Replay a scripted terminal demo one step at a time.\n\n\
        Commands are typed into an audience pane with human cadence and then \
        executed by its shell; speaker notes go to a separate pane the \
        audience never sees. Press a key to advance to the next step.",
    after_help = format!("Project: https://github.com/{}", env!("TERMSTAGE_REPO_NAME"))
)]
pub struct Cli {
    /// Write the log here instead of the state directory
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Present a script
    Run(RunArgs),

    /// Validate a script without starting tmux
    Check {
        /// Script file (TOML)
        script: PathBuf,
    },

    /// Show or edit the configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script file (TOML)
    pub script: PathBuf,

    /// Session name (defaults to the script title)
    #[arg(long)]
    pub name: Option<String>,

    /// Type instantly, for rehearsals
    #[arg(long)]
    pub speedy: bool,

    /// Seed for the typing cadence, to make a run reproducible
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Replay every step in memory and print both surfaces, no tmux needed
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Open the configuration file in $EDITOR
    Edit,
}
