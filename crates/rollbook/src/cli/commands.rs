//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::RecordUpdate;

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Student id (must not already exist)
    pub id: String,

    /// Full name
    pub name: String,

    /// Grade, e.g. "10th"
    #[arg(long, default_value = "")]
    pub grade: String,

    /// Email address
    #[arg(long, default_value = "")]
    pub email: String,

    /// Phone number
    #[arg(long, default_value = "")]
    pub phone: String,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Student id
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Update command arguments.
///
/// Fields that are omitted or empty are left unchanged.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Student id
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New grade
    #[arg(long)]
    pub grade: Option<String>,

    /// New email address
    #[arg(long)]
    pub email: Option<String>,

    /// New phone number
    #[arg(long)]
    pub phone: Option<String>,
}

impl UpdateCommand {
    /// Build the store update from the given flags, trimming each value.
    #[must_use]
    pub fn to_update(&self) -> RecordUpdate {
        let trimmed = |value: &Option<String>| value.as_deref().map(|v| v.trim().to_string());
        RecordUpdate {
            name: trimmed(&self.name),
            grade: trimmed(&self.grade),
            email: trimmed(&self.email),
            phone: trimmed(&self.phone),
        }
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Student id
    pub id: String,

    /// Confirm the deletion
    #[arg(short, long)]
    pub yes: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in id, name, email (any case) or phone (exact case)
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per record
    Plain,
    /// Aligned columns
    #[default]
    Table,
    /// JSON array
    Json,
}
