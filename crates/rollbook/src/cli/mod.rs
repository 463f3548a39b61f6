//! Command-line interface for rollbook.
//!
//! This module provides the CLI structure for the `rollbook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, ListCommand, OutputFormat, SearchCommand,
    ShowCommand, StatsCommand, UpdateCommand,
};

/// rollbook - Keep student records in a single JSON file
///
/// Add, edit, remove and search student records. Every change is written to
/// the data file before the command returns.
#[derive(Debug, Parser)]
#[command(name = "rollbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the student data file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

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
    /// Add a new student
    Add(AddCommand),

    /// Show one student
    Show(ShowCommand),

    /// List all students
    List(ListCommand),

    /// Change fields of an existing student
    Update(UpdateCommand),

    /// Remove a student
    Delete(DeleteCommand),

    /// Search by id, name, email or phone
    Search(SearchCommand),

    /// Show totals
    Stats(StatsCommand),

    /// Count students per grade
    Grades,

    /// List students added today
    Today,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
