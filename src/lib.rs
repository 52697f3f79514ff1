//! Grade Import Library
//!
//! A Rust library for importing student grades and student rosters from
//! spreadsheet uploads into a school-administration backend.
//!
//! This library provides tools for:
//! - Decoding `.xlsx`/`.xls`/`.ods` workbooks and delimited text exports
//! - Validating headers and every data cell with row-scoped diagnostics
//! - Computing weighted final grades from a per-subject configuration
//! - Reconciling rows against existing records (create, update or skip)
//! - Persisting changes in fixed-size batches that tolerate partial failure
//! - Aggregating import statistics and generating pre-filled import templates

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod batch_coordinator;
        pub mod grade_calculator;
        pub mod notes_import;
        pub mod progress;
        pub mod repositories;
        pub mod roster_import;
        pub mod spreadsheet;
        pub mod template;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Candidate, GradeComponent, Note, NoteConfig, Student, StructuralError};
pub use config::ImportConfig;

/// Result type alias for the grade importer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for grade import operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be decoded
    #[error("Workbook error: {message}")]
    Workbook { message: String },

    /// Delimited text could not be decoded
    #[error("CSV parsing error: {message}")]
    CsvParsing {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Sheet structure is unusable; nothing was imported
    #[error("Invalid spreadsheet structure: {}", join_structural(.errors))]
    Structural { errors: Vec<StructuralError> },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Subject grading weights are inconsistent
    #[error("Invalid note configuration: {message}")]
    InvalidNoteConfig { message: String },

    /// Subject not found
    #[error("Subject not found: id = {subject_id}")]
    SubjectNotFound { subject_id: i64 },

    /// Subject exists but has no grading configuration
    #[error("Note configuration not found for subject {subject_id}")]
    NoteConfigNotFound { subject_id: i64 },

    /// Class not found
    #[error("Class not found: id = {class_id}")]
    ClassNotFound { class_id: i64 },

    /// Persistence collaborator failed
    #[error("Repository error: {message}")]
    Repository { message: String },

    /// JSON serialization error
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Spreadsheet generation failed
    #[error("Spreadsheet writing error: {message}")]
    SpreadsheetWriting {
        message: String,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

fn join_structural(errors: &[StructuralError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a workbook decoding error
    pub fn workbook(message: impl Into<String>) -> Self {
        Self::Workbook {
            message: message.into(),
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(message: impl Into<String>, source: Option<csv::Error>) -> Self {
        Self::CsvParsing {
            message: message.into(),
            source,
        }
    }

    /// Create a structural error from one or more sheet-level problems
    pub fn structural(errors: Vec<StructuralError>) -> Self {
        Self::Structural { errors }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid note configuration error
    pub fn invalid_note_config(message: impl Into<String>) -> Self {
        Self::InvalidNoteConfig {
            message: message.into(),
        }
    }

    pub fn subject_not_found(subject_id: i64) -> Self {
        Self::SubjectNotFound { subject_id }
    }

    pub fn note_config_not_found(subject_id: i64) -> Self {
        Self::NoteConfigNotFound { subject_id }
    }

    pub fn class_not_found(class_id: i64) -> Self {
        Self::ClassNotFound { class_id }
    }

    /// Create a repository error
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Structural problems carried by this error, if any
    pub fn structural_errors(&self) -> &[StructuralError] {
        match self {
            Self::Structural { errors } => errors,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::CsvParsing {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Self::Workbook {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::SpreadsheetWriting {
            message: err.to_string(),
            source: err,
        }
    }
}
