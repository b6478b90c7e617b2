//! Command-line interface for muster.
//!
//! This module provides the CLI structure and command handlers for the
//! `muster` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, ListCommand, OutputFormat, ReportCommand, StatusCommand,
    SubmitCommand, ValidateCommand,
};

/// muster - Emergency check-in and accountability
///
/// Records check-ins from people on the community roster and reports who
/// has and has not checked in, split into staff and students.
#[derive(Debug, Parser)]
#[command(name = "muster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether an identifier is on the roster
    Validate(ValidateCommand),

    /// Record a check-in
    Submit(SubmitCommand),

    /// List check-ins, newest first
    List(ListCommand),

    /// Delete every check-in
    Clear(ClearCommand),

    /// Show who has and has not checked in
    Report(ReportCommand),

    /// Show store and directory status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
