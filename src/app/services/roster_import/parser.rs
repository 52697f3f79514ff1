//! Roster sheet parser

use chrono::NaiveDate;
use tracing::info;

use super::record_parser::parse_student_row;
use crate::app::models::{RowError, RowOutcome, RowWarning, StudentCandidate};
use crate::app::services::spreadsheet::{HeaderValidator, SpreadsheetReader};
use crate::config::ImportConfig;
use crate::{Error, Result};

/// Result of parsing a roster sheet
#[derive(Debug, Clone, PartialEq)]
pub struct RosterParseReport {
    pub sheet_name: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub outcomes: Vec<RowOutcome<StudentCandidate>>,
}

impl RosterParseReport {
    pub fn from_outcomes(sheet_name: String, outcomes: Vec<RowOutcome<StudentCandidate>>) -> Self {
        Self {
            sheet_name,
            total_rows: outcomes.len(),
            valid_rows: outcomes.iter().filter(|o| o.success()).count(),
            outcomes,
        }
    }

    pub fn invalid_rows(&self) -> usize {
        self.total_rows - self.valid_rows
    }

    pub fn candidates(&self) -> impl Iterator<Item = (usize, &StudentCandidate)> + '_ {
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
}

/// Parser for roster sheets (`prenom`, `nom`, `email`, `numeroEtudiant`,
/// optional `dateNaissance`)
#[derive(Debug, Clone)]
pub struct RosterWorkbookParser {
    reader: SpreadsheetReader,
    headers: HeaderValidator,
    today: NaiveDate,
}

impl RosterWorkbookParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            reader: SpreadsheetReader::new(config),
            headers: HeaderValidator::roster(),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Anchor birth date and student number checks on a fixed date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn parse(&self, buffer: &[u8]) -> Result<RosterParseReport> {
        let sheet = self.reader.read(buffer)?;
        let mapping = self
            .headers
            .validate(&sheet.headers)
            .map_err(Error::structural)?;

        let outcomes = sheet
            .rows
            .iter()
            .map(|row| parse_student_row(row, &mapping, self.today))
            .collect();
        let report = RosterParseReport::from_outcomes(sheet.sheet_name, outcomes);

        info!(
            "Parsed roster sheet: {} valid of {} rows",
            report.valid_rows, report.total_rows
        );
        Ok(report)
    }
}
