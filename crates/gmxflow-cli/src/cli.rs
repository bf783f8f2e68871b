use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Jonas Landsgesell",
    version,
    about = "gmxflow CLI - A command-line interface for orchestrating GROMACS molecular-dynamics pipelines with validated configurations and resumable runs.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the configured pipeline, skipping steps whose outputs are
    /// already registered.
    Run(RunArgs),
    /// Validate a run configuration against the reference template without
    /// executing anything.
    Check(CheckArgs),
    /// Manage locally cached toolchain data (mdp option lists).
    Data(DataArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory the run lives in. Defaults to the current directory.
    #[arg(short = 'd', long, value_name = "PATH")]
    pub run_dir: Option<PathBuf>,

    /// Override the reference template shipped with gmxflow.
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Accept every proposed name correction without prompting.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the reference template shipped with gmxflow.
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Accept every proposed name correction without prompting.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Fetch the legal mdp options for a GROMACS version from the online
    /// manual and cache them locally.
    FetchMdp {
        /// The GROMACS version to query, e.g. 2024 or 2024.1.
        #[arg(long, required = true, value_name = "VERSION")]
        gmx_version: String,

        /// Refetch even when the version is already cached.
        #[arg(long)]
        force: bool,
    },
    /// Show the absolute path to the local data directory.
    Path,
    /// Set a custom absolute path for the local data directory.
    SetPath {
        /// The new path to use for storing cached data.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the data path to its default, OS-specific location.
    ResetPath,
}
