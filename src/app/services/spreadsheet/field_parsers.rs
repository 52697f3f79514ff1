//! Field parsing utilities for spreadsheet rows
//!
//! Pure cell → typed value functions. Errors are returned as
//! [`RowErrorKind`] so the row validators can attach the row number.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use super::column_mapping::HeaderMap;
use super::reader::RawRow;
use crate::app::models::{
    Email, Field, GradeComponent, RowErrorKind, RowOutcome, StudentNumber, round_to_hundredths,
};
use crate::constants::grading::{MAX_GRADE, MIN_GRADE};
use crate::constants::{BIRTH_DATE_MAX_YEARS_AHEAD, BIRTH_DATE_MAX_YEARS_BACK};

/// Date layouts accepted for birth dates given as text
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Get a trimmed, non-empty field value
pub fn get_optional_field<'a>(
    row: &'a RawRow,
    mapping: &HeaderMap,
    column_name: &str,
) -> Option<&'a str> {
    mapping
        .get_index(column_name)
        .and_then(|index| row.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Get a required field, recording a missing-field error on the row when
/// it is absent or blank
pub fn get_required_field<'a, T>(
    row: &'a RawRow,
    mapping: &HeaderMap,
    column_name: &str,
    field: Field,
    outcome: &mut RowOutcome<T>,
) -> Option<&'a str> {
    let value = get_optional_field(row, mapping, column_name);
    if value.is_none() {
        outcome.error(RowErrorKind::MissingField(field));
    }
    value
}

/// Grade after coercion, with the pre-rounding value when rounding changed it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedGrade {
    pub value: f64,
    pub rounded_from: Option<f64>,
}

/// Parse a grade cell on the 0–20 scale
///
/// The first comma is read as a decimal separator (`"15,5"` → 15.5). The value
/// must parse completely as a finite number, lie in `[0, 20]`, and is rounded
/// to two decimals.
pub fn parse_grade(raw: &str, component: GradeComponent) -> Result<ParsedGrade, RowErrorKind> {
    let normalized = raw.trim().replacen(',', ".", 1);
    let value = normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowErrorKind::InvalidNumber {
            field: component,
            raw: raw.trim().to_string(),
        })?;

    if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return Err(RowErrorKind::OutOfRange {
            field: component,
            value,
        });
    }

    let rounded = round_to_hundredths(value);
    Ok(ParsedGrade {
        value: rounded,
        rounded_from: (rounded != value).then_some(value),
    })
}

pub fn parse_email(raw: &str) -> Result<Email, RowErrorKind> {
    Email::parse(raw).map_err(|reason| RowErrorKind::InvalidEmail {
        raw: raw.trim().to_string(),
        reason,
    })
}

pub fn parse_student_number(raw: &str, current_year: i32) -> Result<StudentNumber, RowErrorKind> {
    StudentNumber::parse_for_year(raw, current_year).map_err(|reason| {
        RowErrorKind::InvalidStudentNumber {
            raw: raw.trim().to_string(),
            reason,
        }
    })
}

/// Parse a birth date given as an Excel serial number or as text
///
/// Accepted years run from `today.year() - 100` to `today.year() + 10`.
pub fn parse_birth_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, RowErrorKind> {
    let value = raw.trim();
    let invalid = |reason: &str| RowErrorKind::InvalidBirthDate {
        raw: value.to_string(),
        reason: reason.to_string(),
    };

    let date = match value.parse::<f64>() {
        Ok(serial) => excel_serial_to_date(serial).ok_or_else(|| invalid("invalid serial date"))?,
        Err(_) => parse_date_text(value).ok_or_else(|| invalid("unrecognized date format"))?,
    };

    let min_year = today.year() - BIRTH_DATE_MAX_YEARS_BACK;
    let max_year = today.year() + BIRTH_DATE_MAX_YEARS_AHEAD;
    if !(min_year..=max_year).contains(&date.year()) {
        return Err(invalid(&format!(
            "year must be between {} and {}",
            min_year, max_year
        )));
    }

    Ok(date)
}

/// Convert an Excel serial day number (1900 date system) to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
