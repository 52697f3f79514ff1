//! Typed diagnostics: sheet-level structural errors, row errors and row warnings
//!
//! Each kind renders the human-readable text shown to the uploader. Row-scoped
//! messages always carry the spreadsheet row number they refer to.

use super::GradeComponent;
use super::identifiers::IdentifierError;
use std::fmt;

/// Spreadsheet field a row message refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Firstname,
    Lastname,
    Email,
    StudentNumber,
    BirthDate,
    Grade(GradeComponent),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Firstname => "prenom",
            Self::Lastname => "nom",
            Self::Email => "email",
            Self::StudentNumber => "numeroEtudiant",
            Self::BirthDate => "dateNaissance",
            Self::Grade(component) => component.label(),
        };
        f.write_str(name)
    }
}

/// Problem with the sheet as a whole; aborts the import before any row
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    #[error("File is too large ({size} bytes). Maximum allowed is {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("No worksheets found in the file")]
    NoWorksheets,

    #[error("The file is empty")]
    EmptyFile,

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("At least one note column (noteCC, noteTP, noteDV) must be present")]
    NoNoteColumn,

    #[error("Duplicate headers found: {}", .headers.join(", "))]
    DuplicateHeaders { headers: Vec<String> },

    #[error("No data rows found in the file")]
    NoDataRows,

    #[error("File contains too many rows ({found}). Maximum allowed is {max}")]
    TooManyRows { found: usize, max: usize },
}

/// Row-scoped failure; the row is excluded from the import
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowErrorKind {
    #[error("Missing or empty '{0}' field")]
    MissingField(Field),

    #[error("Invalid {field} value '{raw}' - must be a number")]
    InvalidNumber { field: GradeComponent, raw: String },

    #[error("{field} value '{value}' is out of range (0-20)")]
    OutOfRange { field: GradeComponent, value: f64 },

    #[error("Invalid email '{raw}': {reason}")]
    InvalidEmail { raw: String, reason: IdentifierError },

    #[error("Invalid student number '{raw}': {reason}")]
    InvalidStudentNumber { raw: String, reason: IdentifierError },

    #[error("Invalid birth date '{raw}': {reason}")]
    InvalidBirthDate { raw: String, reason: String },

    #[error("Student with number {numero} not found in class")]
    StudentNotFound { numero: String },

    #[error("Failed to save: {message}")]
    PersistenceFailed { message: String },

    #[error("Not attempted: import was cancelled")]
    NotAttempted,
}

/// Row-scoped notice; the row still proceeds
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowWarningKind {
    #[error("{field} value '{original}' rounded to '{rounded}'")]
    Rounded {
        field: GradeComponent,
        original: f64,
        rounded: f64,
    },

    #[error("No notes provided for student {student}")]
    NoNotes { student: String },

    #[error("Note already exists and overwrite is disabled")]
    NoteAlreadyExists,

    #[error("TP note provided but subject does not have TP component")]
    TpNotConfigured,

    #[error("Final grade not computed: missing {}", list_components(.missing))]
    IncompleteGrade { missing: Vec<GradeComponent> },

    #[error("Skipped duplicate: {student}")]
    DuplicateStudent { student: String },
}

fn list_components(components: &[GradeComponent]) -> String {
    components
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Row error tagged with its spreadsheet row number
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(row: usize, kind: RowErrorKind) -> Self {
        Self { row, kind }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.kind)
    }
}

impl std::error::Error for RowError {}

/// Row warning tagged with its spreadsheet row number
#[derive(Debug, Clone, PartialEq)]
pub struct RowWarning {
    pub row: usize,
    pub kind: RowWarningKind,
}

impl RowWarning {
    pub fn new(row: usize, kind: RowWarningKind) -> Self {
        Self { row, kind }
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.kind)
    }
}

/// Validation outcome of a single data row
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome<T> {
    pub row: usize,
    /// Present only when the row passed validation
    pub record: Option<T>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

impl<T> RowOutcome<T> {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            record: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, kind: RowErrorKind) {
        self.errors.push(RowError::new(self.row, kind));
    }

    pub fn warn(&mut self, kind: RowWarningKind) {
        self.warnings.push(RowWarning::new(self.row, kind));
    }

    pub fn success(&self) -> bool {
        self.record.is_some() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_messages_carry_row_number() {
        let error = RowError::new(
            5,
            RowErrorKind::InvalidNumber {
                field: GradeComponent::Cc,
                raw: "abc".into(),
            },
        );
        assert_eq!(
            error.to_string(),
            "Row 5: Invalid noteCC value 'abc' - must be a number"
        );

        let warning = RowWarning::new(
            3,
            RowWarningKind::Rounded {
                field: GradeComponent::Dv,
                original: 15.555,
                rounded: 15.56,
            },
        );
        assert_eq!(
            warning.to_string(),
            "Row 3: noteDV value '15.555' rounded to '15.56'"
        );
    }

    #[test]
    fn test_structural_messages() {
        let duplicate = StructuralError::DuplicateHeaders {
            headers: vec!["nom".into(), "email".into()],
        };
        assert_eq!(duplicate.to_string(), "Duplicate headers found: nom, email");
        assert_eq!(
            StructuralError::TooManyRows {
                found: 1001,
                max: 1000
            }
            .to_string(),
            "File contains too many rows (1001). Maximum allowed is 1000"
        );
    }

    #[test]
    fn test_outcome_success_requires_record() {
        let mut outcome: RowOutcome<u8> = RowOutcome::new(2);
        assert!(!outcome.success());

        outcome.record = Some(1);
        assert!(outcome.success());

        outcome.error(RowErrorKind::MissingField(Field::Lastname));
        assert!(!outcome.success());
        assert_eq!(
            outcome.errors[0].to_string(),
            "Row 2: Missing or empty 'nom' field"
        );
    }
}
