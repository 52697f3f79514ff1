//! Identifier value objects: email addresses and student numbers
//!
//! Both are validated on construction and normalized for comparison
//! (emails lower-cased, student-number lookups case-insensitive).

use crate::constants::{EMAIL_MAX_LENGTH, STUDENT_NUMBER_MAX_LENGTH, STUDENT_NUMBER_MIN_YEAR};
use chrono::Datelike;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static STUDENT_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\w+$").expect("student number pattern compiles"));

/// Reason an identifier was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("value is empty")]
    Empty,

    #[error("must be at most {max} characters")]
    TooLong { max: usize },

    #[error("invalid format")]
    InvalidFormat,

    #[error("year {year} must be between {min} and {max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
}

/// Validated, lower-cased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if normalized.chars().count() > EMAIL_MAX_LENGTH {
            return Err(IdentifierError::TooLong {
                max: EMAIL_MAX_LENGTH,
            });
        }
        if !EMAIL_PATTERN.is_match(&normalized) {
            return Err(IdentifierError::InvalidFormat);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated student number: four-digit enrolment year followed by a serial
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StudentNumber(String);

impl StudentNumber {
    /// Validate against the current calendar year
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        Self::parse_for_year(raw, chrono::Local::now().year())
    }

    /// Validate with an explicit reference year; the enrolment year may be
    /// at most one year ahead of it
    pub fn parse_for_year(raw: &str, current_year: i32) -> Result<Self, IdentifierError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if value.chars().count() > STUDENT_NUMBER_MAX_LENGTH {
            return Err(IdentifierError::TooLong {
                max: STUDENT_NUMBER_MAX_LENGTH,
            });
        }
        if !value.is_ascii() || !STUDENT_NUMBER_PATTERN.is_match(value) {
            return Err(IdentifierError::InvalidFormat);
        }

        let year: i32 = value[..4]
            .parse()
            .map_err(|_| IdentifierError::InvalidFormat)?;
        let max_year = current_year + 1;
        if !(STUDENT_NUMBER_MIN_YEAR..=max_year).contains(&year) {
            return Err(IdentifierError::YearOutOfRange {
                year,
                min: STUDENT_NUMBER_MIN_YEAR,
                max: max_year,
            });
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StudentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let email = Email::parse("  Ahmed.BenAli@Esprit.TN ").unwrap();
        assert_eq!(email.as_str(), "ahmed.benali@esprit.tn");
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(Email::parse("   "), Err(IdentifierError::Empty));
        assert_eq!(Email::parse("no-at-sign.tn"), Err(IdentifierError::InvalidFormat));
        assert_eq!(Email::parse("a@b"), Err(IdentifierError::InvalidFormat));
        assert_eq!(Email::parse("a b@c.tn"), Err(IdentifierError::InvalidFormat));

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(IdentifierError::TooLong { max: 254 })
        );
    }

    #[test]
    fn test_student_number_accepts_year_prefix() {
        let numero = StudentNumber::parse_for_year("2021001234", 2025).unwrap();
        assert_eq!(numero.as_str(), "2021001234");
        assert_eq!(
            StudentNumber::parse_for_year(" 2024ABc9 ", 2025)
                .unwrap()
                .as_str(),
            "2024ABc9"
        );
    }

    #[test]
    fn test_student_number_rejections() {
        assert_eq!(
            StudentNumber::parse_for_year("ABC123", 2025),
            Err(IdentifierError::InvalidFormat)
        );
        assert_eq!(
            StudentNumber::parse_for_year("2021", 2025),
            Err(IdentifierError::InvalidFormat)
        );
        assert_eq!(
            StudentNumber::parse_for_year("2021-0001", 2025),
            Err(IdentifierError::InvalidFormat)
        );
        assert_eq!(
            StudentNumber::parse_for_year("202100000000000000001", 2025),
            Err(IdentifierError::TooLong { max: 20 })
        );
    }

    #[test]
    fn test_student_number_year_window() {
        assert!(StudentNumber::parse_for_year("2026000001", 2025).is_ok());
        assert_eq!(
            StudentNumber::parse_for_year("2027000001", 2025),
            Err(IdentifierError::YearOutOfRange {
                year: 2027,
                min: 2000,
                max: 2026
            })
        );
        assert!(matches!(
            StudentNumber::parse_for_year("1999000001", 2025),
            Err(IdentifierError::YearOutOfRange { .. })
        ));
    }
}
