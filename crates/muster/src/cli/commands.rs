//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, ValueEnum};

use crate::checkin::CheckInRequest;

/// Validate command arguments.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Identifier to look up (any casing)
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Identifier of the person checking in
    #[arg(long)]
    pub id: String,

    /// Name to show on the check-in
    #[arg(short, long)]
    pub name: String,

    /// Where the person is
    #[arg(short, long)]
    pub location: String,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Client timestamp (RFC 3339); defaults to the time of receipt
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl SubmitCommand {
    /// Build the request this command describes.
    #[must_use]
    pub fn to_request(&self) -> CheckInRequest {
        CheckInRequest {
            user_id: self.id.clone(),
            display_name: self.name.clone(),
            location: self.location.clone(),
            notes: self.notes.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
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

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_timestamp_accepts_offsets() {
        let ts = parse_timestamp("2025-03-14T06:30:00-04:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(err.contains("RFC 3339"));
    }

    #[test]
    fn test_submit_to_request() {
        let cmd = SubmitCommand {
            id: "AB1C".to_string(),
            name: "Ann Bee".to_string(),
            location: "Library".to_string(),
            notes: Some("with roommate".to_string()),
            submitted_at: None,
            json: false,
        };

        let request = cmd.to_request();
        assert_eq!(request.user_id, "AB1C");
        assert_eq!(request.display_name, "Ann Bee");
        assert_eq!(request.location, "Library");
        assert_eq!(request.notes.as_deref(), Some("with roommate"));
        assert!(request.submitted_at.is_none());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_output_format_debug() {
        let format = OutputFormat::Json;
        let debug_str = format!("{format:?}");
        assert_eq!(debug_str, "Json");
    }
}
