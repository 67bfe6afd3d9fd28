//! Library interface for the `fresh-stack` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, fresh_stack_core=trace)
    FRESH_STACK_LOG_PATH    Explicit log file path
    FRESH_STACK_LOG_DIR     Log directory
";

/// Command-line interface definition for fresh-stack.
#[derive(Parser)]
#[command(name = "fresh-stack")]
#[command(about = "Scaffold a new project for a popular stack, interactively", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// The subcommand to execute (defaults to `new`).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Answers for `new` when no subcommand is given.
    #[command(flatten)]
    pub new: commands::new::NewArgs,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

impl Cli {
    /// The subcommand to run, falling back to `new` with the top-level answers.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::New(self.new))
    }
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project (the default)
    New(commands::new::NewArgs),

    /// List the available stacks
    List(commands::list::ListArgs),

    /// Diagnose configuration, environment and stack dependencies
    Doctor(commands::doctor::DoctorArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
