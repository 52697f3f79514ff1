//! Grade sheet parser
//!
//! Orchestrates decoding, header validation and per-row validation of an
//! uploaded grade sheet, reporting progress along the way.

use chrono::Datelike;
use tracing::{debug, info};

use super::record_parser::parse_note_row;
use super::report::{FileFormatInfo, NoteValidation, NotesParseReport, NotesPreview};
use crate::app::models::{
    Candidate, Field, GradeComponent, RowErrorKind, RowWarningKind, round_to_hundredths,
};
use crate::app::services::progress::{ImportStage, ProgressCallback, ProgressTracker};
use crate::app::services::spreadsheet::field_parsers::{parse_email, parse_student_number};
use crate::app::services::spreadsheet::{HeaderValidator, SpreadsheetReader};
use crate::config::ImportConfig;
use crate::constants::grading::{MAX_GRADE, MIN_GRADE};
use crate::constants::{NOTE_COLUMNS, SUPPORTED_EXTENSIONS};
use crate::{Error, Result};

/// Parser for grade sheets (`prenom`, `nom`, `numeroEtudiant`, grade columns)
#[derive(Debug, Clone)]
pub struct NotesWorkbookParser {
    config: ImportConfig,
    reader: SpreadsheetReader,
    headers: HeaderValidator,
    current_year: i32,
}

impl NotesWorkbookParser {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            reader: SpreadsheetReader::new(&config),
            headers: HeaderValidator::notes(),
            current_year: chrono::Local::now().year(),
            config,
        }
    }

    /// Validate student numbers against a fixed reference year
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse a grade sheet
    pub fn parse(&self, buffer: &[u8]) -> Result<NotesParseReport> {
        self.parse_tracked(buffer, &mut ProgressTracker::disabled())
    }

    /// Parse a grade sheet, reporting progress from 0 to 100
    pub fn parse_with_progress(
        &self,
        buffer: &[u8],
        on_progress: ProgressCallback<'_>,
    ) -> Result<NotesParseReport> {
        let mut tracker = ProgressTracker::new(Some(on_progress), self.config.progress_interval_rows);
        let report = self.parse_tracked(buffer, &mut tracker)?;
        tracker.complete("Validation complete");
        Ok(report)
    }

    /// Parse with an externally owned tracker, whose window the caller sets
    pub(crate) fn parse_tracked(
        &self,
        buffer: &[u8],
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<NotesParseReport> {
        tracker.report(ImportStage::Parsing, 10.0, "Reading spreadsheet...");
        let sheet = self.reader.read(buffer)?;

        tracker.report(ImportStage::Validating, 20.0, "Validating file structure...");
        tracker.report(ImportStage::Validating, 30.0, "Validating headers...");
        let mapping = self
            .headers
            .validate(&sheet.headers)
            .map_err(Error::structural)?;

        tracker.report(ImportStage::Validating, 40.0, "Processing notes data...");
        let total = sheet.rows.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, row) in sheet.rows.iter().enumerate() {
            tracker.report_row(
                ImportStage::Validating,
                index,
                total,
                40.0,
                50.0,
                format!("Validating row {} of {}", index + 1, total),
            );
            outcomes.push(parse_note_row(row, &mapping, self.current_year));
        }

        let report = NotesParseReport::from_outcomes(sheet.sheet_name, outcomes);
        tracker.report(ImportStage::Validating, 100.0, "Validation complete");

        info!(
            "Parsed grade sheet: {} valid of {} rows (TP present: {})",
            report.valid_rows, report.total_rows, report.has_tp_component
        );
        Ok(report)
    }

    /// Validate an upload without importing it
    ///
    /// Header problems are listed in the preview rather than returned as an
    /// error; only undecodable buffers and sheet-level limits fail.
    pub fn preview(&self, buffer: &[u8]) -> Result<NotesPreview> {
        let sheet = self.reader.read(buffer)?;
        let check = self.headers.check(&sheet.headers);
        let required_columns = self
            .headers
            .required_columns()
            .iter()
            .map(|c| c.to_string())
            .collect();

        if !check.is_valid() {
            debug!("Preview found {} header problems", check.errors.len());
            return Ok(NotesPreview {
                sheet_name: sheet.sheet_name,
                total_rows: sheet.rows.len(),
                valid_rows: 0,
                invalid_rows: sheet.rows.len(),
                has_tp_component: false,
                required_columns,
                found_columns: check.found,
                missing_columns: check.missing,
                errors: check.errors.iter().map(ToString::to_string).collect(),
                warnings: Vec::new(),
                sample_data: Vec::new(),
            });
        }

        let outcomes = sheet
            .rows
            .iter()
            .map(|row| parse_note_row(row, &check.mapping, self.current_year))
            .collect();
        let report = NotesParseReport::from_outcomes(sheet.sheet_name, outcomes);

        Ok(NotesPreview {
            total_rows: report.total_rows,
            valid_rows: report.valid_rows,
            invalid_rows: report.invalid_rows(),
            has_tp_component: report.has_tp_component,
            required_columns,
            found_columns: check.found,
            missing_columns: check.missing,
            errors: report.error_messages(),
            warnings: report.warning_messages(),
            sample_data: report
                .candidates()
                .take(self.config.preview_sample_rows)
                .map(|(_, candidate)| candidate.clone())
                .collect(),
            sheet_name: report.sheet_name,
        })
    }

    /// Validate and normalize a candidate built outside the spreadsheet path
    pub fn validate_note_data(&self, candidate: &Candidate) -> NoteValidation {
        let mut validation = NoteValidation::default();

        let firstname = candidate.firstname.trim();
        let lastname = candidate.lastname.trim();
        let numero = candidate.numero.trim();
        if firstname.is_empty() {
            validation.errors.push(RowErrorKind::MissingField(Field::Firstname));
        }
        if lastname.is_empty() {
            validation.errors.push(RowErrorKind::MissingField(Field::Lastname));
        }

        let numero = if numero.is_empty() {
            validation.errors.push(RowErrorKind::MissingField(Field::StudentNumber));
            None
        } else {
            parse_student_number(numero, self.current_year)
                .map_err(|kind| validation.errors.push(kind))
                .ok()
        };

        let email = match candidate.email.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_email(raw)
                .map_err(|kind| validation.errors.push(kind))
                .ok()
                .map(|email| email.into_inner()),
            _ => None,
        };

        let mut grades = candidate.grades;
        for component in GradeComponent::ALL {
            let Some(value) = candidate.grade(component) else {
                continue;
            };
            if !value.is_finite() || !(MIN_GRADE..=MAX_GRADE).contains(&value) {
                validation.errors.push(RowErrorKind::OutOfRange {
                    field: component,
                    value,
                });
                grades.set(component, None);
            } else {
                grades.set(component, Some(round_to_hundredths(value)));
            }
        }

        if grades.is_empty() {
            validation.warnings.push(RowWarningKind::NoNotes {
                student: format!("{} {}", firstname, lastname),
            });
        }

        if let (true, Some(numero)) = (validation.is_valid(), numero) {
            validation.data = Some(Candidate {
                firstname: firstname.to_string(),
                lastname: lastname.to_string(),
                numero: numero.into_inner(),
                email,
                grades,
            });
        }
        validation
    }

    /// Upload constraints for this parser's configuration
    pub fn file_format_info(&self) -> FileFormatInfo {
        let optional: Vec<&str> = self
            .headers
            .optional_columns()
            .iter()
            .copied()
            .filter(|c| !NOTE_COLUMNS.contains(c))
            .collect();

        FileFormatInfo {
            supported_formats: to_strings(SUPPORTED_EXTENSIONS),
            max_file_size: format_size(self.config.max_file_size_bytes),
            max_rows: self.config.max_rows,
            required_columns: to_strings(self.headers.required_columns()),
            optional_columns: to_strings(optional.as_slice()),
            note_columns: to_strings(NOTE_COLUMNS),
        }
    }
}

impl Default for NotesWorkbookParser {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Human-readable byte size ("10MB", "512KB")
fn format_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    const KB: usize = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}
