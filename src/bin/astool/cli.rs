//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// astool - export, deployment, and manifest tooling for Automation
/// Studio projects
#[derive(Parser)]
#[command(name = "astool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export libraries from a project to a destination folder
    Export(ExportArgs),

    /// Deploy libraries into a software deployment table
    Deploy(DeployArgs),

    /// Synchronize a package or library manifest with its directory
    Sync(SyncArgs),

    /// List the build configurations of a project
    Configs(ConfigsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Path to the project file or directory
    pub project: Option<PathBuf>,

    /// Destination path for exported libraries (defaults to ../Exports
    /// next to the project)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Configurations whose build output feeds binary exports
    #[arg(short, long = "config")]
    pub configs: Vec<String>,

    /// Export only these libraries (case-insensitive; wins over the
    /// blacklist)
    #[arg(long)]
    pub whitelist: Vec<String>,

    /// Skip these libraries (case-insensitive)
    #[arg(long)]
    pub blacklist: Vec<String>,

    /// Export a single library together with its dependency closure
    #[arg(long)]
    pub lib: Option<String>,

    /// With --lib, export only the library itself
    #[arg(long, requires = "lib")]
    pub no_deps: bool,

    /// With --lib, glob patterns of dependency names to skip
    #[arg(long, requires = "lib")]
    pub ignore: Vec<String>,

    /// Overwrite previously exported libraries
    #[arg(short, long)]
    pub overwrite: bool,

    /// Export libraries as source instead of binary
    #[arg(long)]
    pub source: bool,

    /// Include the version number in the folder structure
    #[arg(long)]
    pub include_version: bool,

    /// Drive the run from a JSON parameter file
    #[arg(long)]
    pub params: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Path to the deployment table (cpu.sw)
    #[arg(short, long)]
    pub table: PathBuf,

    /// Folder holding the libraries to deploy
    #[arg(short, long)]
    pub library_folder: PathBuf,

    /// Libraries to deploy (defaults to everything in the folder)
    pub libraries: Vec<String>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Package or library directory (or manifest file) to synchronize
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigsArgs {
    /// Path to the project file or directory
    pub project: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
