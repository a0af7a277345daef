//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Inspect and verify compiled dependency-injection containers
#[derive(Parser, Debug)]
#[command(name = "autowire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with compiled container dumps
    Dump {
        #[command(subcommand)]
        command: DumpCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DumpCommands {
    /// Print the statements of every service
    Show {
        /// Dump file (default: configured dump_path)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Only show this service
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Check the fingerprint of a dump
    Verify {
        /// Dump file (default: configured dump_path)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// List services with their provided types
    Types {
        /// Dump file (default: configured dump_path)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
