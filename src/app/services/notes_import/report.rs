//! Parse, preview and validation result structures for grade sheets

use serde::Serialize;

use crate::app::models::{Candidate, RowError, RowErrorKind, RowOutcome, RowWarning, RowWarningKind};

/// Result of parsing a grade sheet: one outcome per data row
#[derive(Debug, Clone, PartialEq)]
pub struct NotesParseReport {
    pub sheet_name: String,

    /// Non-blank data rows in the sheet
    pub total_rows: usize,

    /// Rows that produced a candidate
    pub valid_rows: usize,

    /// Whether any accepted row supplied a TP grade
    pub has_tp_component: bool,

    /// Per-row outcomes in sheet order
    pub outcomes: Vec<RowOutcome<Candidate>>,
}

impl NotesParseReport {
    pub fn from_outcomes(sheet_name: String, outcomes: Vec<RowOutcome<Candidate>>) -> Self {
        let valid_rows = outcomes.iter().filter(|o| o.success()).count();
        let has_tp_component = outcomes
            .iter()
            .filter_map(|o| o.record.as_ref())
            .any(|c| c.grades.note_tp.is_some());

        Self {
            sheet_name,
            total_rows: outcomes.len(),
            valid_rows,
            has_tp_component,
            outcomes,
        }
    }

    /// At least one row is importable
    pub fn success(&self) -> bool {
        self.valid_rows > 0
    }

    pub fn invalid_rows(&self) -> usize {
        self.total_rows - self.valid_rows
    }

    /// Accepted candidates with their row numbers
    pub fn candidates(&self) -> impl Iterator<Item = (usize, &Candidate)> + '_ {
        self.outcomes
            .iter()
            .filter(|o| o.success())
            .filter_map(|o| o.record.as_ref().map(|c| (o.row, c)))
    }

    pub fn errors(&self) -> impl Iterator<Item = &RowError> + '_ {
        self.outcomes.iter().flat_map(|o| o.errors.iter())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RowWarning> + '_ {
        self.outcomes.iter().flat_map(|o| o.warnings.iter())
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings().map(ToString::to_string).collect()
    }
}

/// Dry-run view of an upload, shown before the user commits to importing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesPreview {
    pub sheet_name: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub has_tp_component: bool,
    pub required_columns: Vec<String>,
    pub found_columns: Vec<String>,
    pub missing_columns: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// First accepted candidates
    pub sample_data: Vec<Candidate>,
}

impl NotesPreview {
    /// The sheet could be imported as-is
    pub fn is_importable(&self) -> bool {
        self.missing_columns.is_empty() && self.valid_rows > 0
    }
}

/// Outcome of validating a single candidate record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteValidation {
    pub errors: Vec<RowErrorKind>,
    pub warnings: Vec<RowWarningKind>,
    /// Normalized record, present only when valid
    pub data: Option<Candidate>,
}

impl NoteValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Upload constraints advertised to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFormatInfo {
    pub supported_formats: Vec<String>,
    pub max_file_size: String,
    pub max_rows: usize,
    pub required_columns: Vec<String>,
    /// Optional columns other than the grade columns
    pub optional_columns: Vec<String>,
    pub note_columns: Vec<String>,
}
