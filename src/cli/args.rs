//! Command-line argument definitions for the grade importer
//!
//! Defines the CLI interface with the clap derive API. Every subcommand
//! shares [`CommonArgs`] for configuration, data file and logging flags.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ImportConfig;

/// Bulk import of student grades and rosters from spreadsheets
#[derive(Debug, Clone, Parser)]
#[command(
    name = "grade-import",
    version,
    about = "Import student grades and rosters from Excel/CSV spreadsheets",
    long_about = "Validates uploaded grade sheets row by row, computes weighted final grades \
                  from each subject's configuration and writes the results in batches. \
                  School data (classes, subjects, students, notes) is read from and written \
                  back to a JSON data file."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Import grades for a subject from a grade sheet
    ImportNotes(ImportNotesArgs),
    /// Import students into a class from a roster sheet
    ImportStudents(ImportStudentsArgs),
    /// Check a grade sheet without importing it
    Validate(ValidateArgs),
    /// Generate a pre-filled grade sheet for a subject and class
    Template(TemplateArgs),
    /// Show accepted formats, columns and limits
    Info(InfoArgs),
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// TOML configuration file
    ///
    /// If not specified, looks for grade-import/config.toml in the user's
    /// configuration directory.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// JSON file holding classes, subjects, students and notes
    #[arg(
        short = 'd',
        long = "data",
        value_name = "FILE",
        help = "JSON school data file read and updated by the command"
    )]
    pub data_file: Option<PathBuf>,

    /// Override the configured persistence batch size
    #[arg(long = "batch-size", value_name = "COUNT")]
    pub batch_size: Option<usize>,

    /// Override the configured row limit
    #[arg(long = "max-rows", value_name = "COUNT")]
    pub max_rows: Option<usize>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[arg(
        long = "format",
        value_enum,
        default_value = "text",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct ImportNotesArgs {
    /// Grade sheet (.xlsx, .xls, .ods or delimited text)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(short = 's', long = "subject", value_name = "ID")]
    pub subject_id: i64,

    /// Only match students of this class
    #[arg(long = "class", value_name = "ID")]
    pub class_id: Option<i64>,

    /// Teacher recorded on written notes
    #[arg(long = "teacher", value_name = "ID")]
    pub teacher_id: Option<i64>,

    #[arg(long = "overwrite", help = "Update notes that already exist")]
    pub overwrite: bool,

    #[arg(
        long = "validate-only",
        help = "Run every stage except writing to the data file"
    )]
    pub validate_only: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
pub struct ImportStudentsArgs {
    /// Roster sheet
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long = "class", value_name = "ID")]
    pub class_id: i64,

    #[arg(long = "overwrite", help = "Update students that already exist")]
    pub overwrite: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// Grade sheet to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
pub struct TemplateArgs {
    #[arg(short = 's', long = "subject", value_name = "ID")]
    pub subject_id: i64,

    #[arg(long = "class", value_name = "ID")]
    pub class_id: i64,

    #[arg(long = "include-notes", help = "Fill in grades already recorded")]
    pub include_existing_notes: bool,

    #[arg(long = "include-emails", help = "Add an email column")]
    pub include_student_emails: bool,

    /// Output path; defaults to the generated file name in the current directory
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
pub struct InfoArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON for scripting
    Json,
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::ImportNotes(args) => &args.common,
            Self::ImportStudents(args) => &args.common,
            Self::Validate(args) => &args.common,
            Self::Template(args) => &args.common,
            Self::Info(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Progress bars are shown for text output unless quiet
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Text
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: ImportConfig) -> ImportConfig {
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(max_rows) = self.max_rows {
            config = config.with_max_rows(max_rows);
        }
        config
    }
}
