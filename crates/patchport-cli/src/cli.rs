//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use patchport::ClampMode;

#[derive(Parser)]
#[command(name = "patchport")]
#[command(version, about = "Port binary patches to a new build of a module")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub port: PortArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct PortArgs {
    /// Game code used as fingerprint prefix (e.g. LDJ)
    pub game_code: Option<String>,

    /// Module the existing patch set was made for
    pub old_module: Option<PathBuf>,

    /// Module to port the patches to
    pub new_module: Option<PathBuf>,

    /// Directory containing `<fingerprint>.json` patch sets
    #[arg(short = 'd', long, default_value = ".", env = "PATCHPORT_DIR")]
    pub patch_dir: PathBuf,

    /// TOML file with relocation settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the starting margin
    #[arg(long)]
    pub max_margin: Option<usize>,

    /// Window handling near the start of the module
    #[arg(long)]
    pub clamp: Option<ClampMode>,

    /// Relocate and report without writing the new patch set
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the fingerprint of a module
    Fingerprint {
        /// Game code used as fingerprint prefix
        game_code: String,

        /// Module file
        module: PathBuf,

        /// Also report whether a patch set exists in this directory
        #[arg(short = 'd', long)]
        patch_dir: Option<PathBuf>,
    },

    /// Relocate a single offset from the old module to the new one
    Locate {
        old_module: PathBuf,

        new_module: PathBuf,

        /// Offset in the old module (decimal, or hex with 0x prefix)
        offset: String,

        /// Payload length in bytes
        length: usize,

        /// Starting margin
        #[arg(long, default_value_t = patchport::config::DEFAULT_MAX_MARGIN)]
        max_margin: usize,

        /// Smallest margin to try before giving up
        #[arg(long, default_value_t = 0)]
        min_margin: usize,

        /// Window handling near the start of the module
        #[arg(long, default_value_t = ClampMode::Trim)]
        clamp: ClampMode,
    },
}
