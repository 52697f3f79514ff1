//! Application constants for the grade import pipeline
//!
//! Column names, limits and grading thresholds used throughout the crate.
//! Column names are stored in their normalized (lower-case, trimmed) form.

// =============================================================================
// Spreadsheet Limits
// =============================================================================

/// Maximum number of data rows accepted in a single import
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Maximum accepted size of an uploaded spreadsheet (10 MB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Number of persistence instructions handled per batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Row-level progress is reported once every this many rows
pub const DEFAULT_PROGRESS_INTERVAL_ROWS: usize = 10;

/// Rows shown in a validation preview
pub const DEFAULT_PREVIEW_SAMPLE_ROWS: usize = 5;

/// Spreadsheet row number of the first data row (the header occupies row 1)
pub const FIRST_DATA_ROW: usize = 2;

/// File extensions accepted by the upload surface
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

/// Config file name under the user's configuration directory
pub const CONFIG_DIR_NAME: &str = "grade-import";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    pub const FIRSTNAME: &str = "prenom";
    pub const LASTNAME: &str = "nom";
    pub const EMAIL: &str = "email";
    pub const STUDENT_NUMBER: &str = "numeroetudiant";
    pub const BIRTH_DATE: &str = "datenaissance";
    pub const NOTE_CC: &str = "notecc";
    pub const NOTE_TP: &str = "notetp";
    pub const NOTE_DV: &str = "notedv";
}

/// Columns every grade sheet must carry
pub const NOTES_REQUIRED_COLUMNS: &[&str] = &[
    columns::FIRSTNAME,
    columns::LASTNAME,
    columns::STUDENT_NUMBER,
];

/// Columns a grade sheet may carry
pub const NOTES_OPTIONAL_COLUMNS: &[&str] = &[
    columns::EMAIL,
    columns::NOTE_CC,
    columns::NOTE_TP,
    columns::NOTE_DV,
];

/// Grade columns; at least one must be present
pub const NOTE_COLUMNS: &[&str] = &[columns::NOTE_CC, columns::NOTE_TP, columns::NOTE_DV];

/// Columns every roster sheet must carry
pub const ROSTER_REQUIRED_COLUMNS: &[&str] = &[
    columns::FIRSTNAME,
    columns::LASTNAME,
    columns::EMAIL,
    columns::STUDENT_NUMBER,
];

pub const ROSTER_OPTIONAL_COLUMNS: &[&str] = &[columns::BIRTH_DATE];

// =============================================================================
// Grading
// =============================================================================

pub mod grading {
    /// Inclusive grade range on the 20-point scale
    pub const MIN_GRADE: f64 = 0.0;
    pub const MAX_GRADE: f64 = 20.0;

    /// Minimum final grade for a pass
    pub const PASSING_GRADE: f64 = 10.0;

    /// Lower bounds of the reporting bands
    pub const EXCELLENT_THRESHOLD: f64 = 16.0;
    pub const GOOD_THRESHOLD: f64 = 12.0;

    /// Lower bounds of the letter grades (D is the passing grade)
    pub const LETTER_A: f64 = 16.0;
    pub const LETTER_B: f64 = 14.0;
    pub const LETTER_C: f64 = 12.0;
    pub const LETTER_D: f64 = 10.0;

    /// Component weights must add up to this total
    pub const WEIGHT_TOTAL: f64 = 100.0;
    pub const WEIGHT_TOLERANCE: f64 = 0.01;
}

// =============================================================================
// Identifier Validation
// =============================================================================

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const STUDENT_NUMBER_MAX_LENGTH: usize = 20;

/// Earliest enrolment year encoded in a student number
pub const STUDENT_NUMBER_MIN_YEAR: i32 = 2000;

/// Birth dates further in the past than this are rejected
pub const BIRTH_DATE_MAX_YEARS_BACK: i32 = 100;
pub const BIRTH_DATE_MAX_YEARS_AHEAD: i32 = 10;

/// Days between the Excel epoch (1899-12-30) and the Unix epoch
pub const EXCEL_UNIX_EPOCH_OFFSET_DAYS: i64 = 25569;

// =============================================================================
// Template
// =============================================================================

/// Sample rows written into generated import templates
pub const TEMPLATE_SAMPLE_ROWS: &[[&str; 7]] = &[
    [
        "Ahmed",
        "Ben Ali",
        "2021001234",
        "ahmed.benali@esprit.tn",
        "15.5",
        "14.0",
        "16.0",
    ],
    [
        "Fatima",
        "Zahra",
        "2022005678",
        "fatima.zahra@esprit.tn",
        "17.0",
        "15.5",
        "18.0",
    ],
];

