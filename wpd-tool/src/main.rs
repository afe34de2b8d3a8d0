//! Main entry point for the wpd-tool CLI

mod cli;
mod commands;
mod filelist;
mod utils;

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use crate::cli::{Cli, Commands};
use crate::commands::Directories;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    let directories = Directories {
        data: cli.data_dir,
        patch: cli.patch_dir,
        schema: cli.schema_dir,
    };

    // Execute command
    match cli.command {
        Commands::Patch { filelists } => commands::patch::execute(&directories, &filelists),
        Commands::Generate {
            filelists,
            show_hidden,
        } => commands::generate::execute(&directories, &filelists, show_hidden),
        Commands::Info { file } => commands::info::execute(&file),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
