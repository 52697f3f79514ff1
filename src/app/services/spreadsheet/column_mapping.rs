//! Header normalization and validation
//!
//! Headers are matched case-insensitively after trimming. A [`HeaderValidator`]
//! describes one import's column contract and reports every structural
//! problem at once rather than stopping at the first.

use std::collections::HashMap;

use crate::app::models::StructuralError;
use crate::constants::{
    NOTE_COLUMNS, NOTES_OPTIONAL_COLUMNS, NOTES_REQUIRED_COLUMNS, ROSTER_OPTIONAL_COLUMNS,
    ROSTER_REQUIRED_COLUMNS,
};

/// Normalize a header cell for matching
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Normalized column name → column index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    name_to_index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Build the map from raw header cells; blank headers are ignored and the
    /// first occurrence of a repeated name wins
    pub fn analyze(headers: &[String]) -> Self {
        let mut name_to_index = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let name = normalize_header(header);
            if !name.is_empty() {
                name_to_index.entry(name).or_insert(index);
            }
        }
        Self { name_to_index }
    }

    /// Get the index for a normalized column name
    pub fn get_index(&self, column_name: &str) -> Option<usize> {
        self.name_to_index.get(column_name).copied()
    }

    /// Check if a column exists in the mapping
    pub fn has_column(&self, column_name: &str) -> bool {
        self.name_to_index.contains_key(column_name)
    }

    pub fn len(&self) -> usize {
        self.name_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_index.is_empty()
    }
}

/// Result of checking a header row against a column contract
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCheck {
    pub mapping: HeaderMap,
    /// Non-blank normalized headers, in sheet order
    pub found: Vec<String>,
    /// Required columns that are absent
    pub missing: Vec<String>,
    pub errors: Vec<StructuralError>,
}

impl HeaderCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Column contract of one import type
#[derive(Debug, Clone, Copy)]
pub struct HeaderValidator {
    required: &'static [&'static str],
    optional: &'static [&'static str],
    /// At least one of these must be present (empty means no constraint)
    at_least_one_of: &'static [&'static str],
}

impl HeaderValidator {
    /// Grade sheets: names and student number plus at least one grade column
    pub fn notes() -> Self {
        Self {
            required: NOTES_REQUIRED_COLUMNS,
            optional: NOTES_OPTIONAL_COLUMNS,
            at_least_one_of: NOTE_COLUMNS,
        }
    }

    /// Roster sheets: names, email and student number
    pub fn roster() -> Self {
        Self {
            required: ROSTER_REQUIRED_COLUMNS,
            optional: ROSTER_OPTIONAL_COLUMNS,
            at_least_one_of: &[],
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        self.required
    }

    pub fn optional_columns(&self) -> &'static [&'static str] {
        self.optional
    }

    /// Check headers, collecting every problem
    pub fn check(&self, headers: &[String]) -> HeaderCheck {
        let mapping = HeaderMap::analyze(headers);
        let found: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h))
            .filter(|h| !h.is_empty())
            .collect();

        let mut errors = Vec::new();

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|column| !mapping.has_column(column))
            .map(|column| column.to_string())
            .collect();
        errors.extend(missing.iter().map(|column| StructuralError::MissingColumn {
            column: column.clone(),
        }));

        if !self.at_least_one_of.is_empty()
            && !self.at_least_one_of.iter().any(|c| mapping.has_column(c))
        {
            errors.push(StructuralError::NoNoteColumn);
        }

        let duplicates = duplicate_headers(&found);
        if !duplicates.is_empty() {
            errors.push(StructuralError::DuplicateHeaders {
                headers: duplicates,
            });
        }

        HeaderCheck {
            mapping,
            found,
            missing,
            errors,
        }
    }

    /// Validate headers, returning the mapping or every structural error
    pub fn validate(&self, headers: &[String]) -> Result<HeaderMap, Vec<StructuralError>> {
        let check = self.check(headers);
        if check.is_valid() {
            Ok(check.mapping)
        } else {
            Err(check.errors)
        }
    }
}

/// Names appearing more than once, each listed once in order of first repeat
fn duplicate_headers(found: &[String]) -> Vec<String> {
    let mut seen = HashMap::new();
    let mut duplicates = Vec::new();
    for name in found {
        let count = seen.entry(name.as_str()).or_insert(0usize);
        *count += 1;
        if *count == 2 {
            duplicates.push(name.clone());
        }
    }
    duplicates
}
