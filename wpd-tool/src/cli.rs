//! Root CLI structure for wpd-tool

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wpd-tool")]
#[command(about = "Patch and dump WPD game data archives", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding the archives named in filelists
    #[arg(long, env = "WPD_DATA_DIR", default_value = "sys", global = true)]
    pub data_dir: PathBuf,

    /// Directory patch scripts are read from and generated into
    #[arg(long, env = "WPD_PATCH_DIR", default_value = "patch", global = true)]
    pub patch_dir: PathBuf,

    /// Root of the enum/ and fmt/ schema descriptors
    #[arg(long, env = "WPD_SCHEMA_DIR", default_value = "schema", global = true)]
    pub schema_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply the patch scripts listed in each filelist
    Patch {
        /// Filelist documents to process
        #[arg(required = true)]
        filelists: Vec<PathBuf>,
    },

    /// Write the patch files listed in each filelist from the archives
    Generate {
        /// Filelist documents to process
        #[arg(required = true)]
        filelists: Vec<PathBuf>,

        /// Include hidden attributes in the output
        #[arg(long)]
        show_hidden: bool,
    },

    /// Display the entry directory of a WPD archive
    Info {
        /// Path to the WPD file
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
