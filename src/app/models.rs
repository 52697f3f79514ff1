//! Data models for grade and roster imports
//!
//! This module contains the records exchanged between the pipeline stages and
//! the persistence collaborators: students, notes, subjects and classes as
//! stored, plus the typed candidates produced by row validation.
//!
//! Submodules hold the grading rules ([`grading`]), identifier value objects
//! ([`identifiers`]) and the typed diagnostics reported per row and per sheet
//! ([`messages`]).

pub mod grading;
pub mod identifiers;
pub mod messages;

pub use grading::{FinalGrade, GradeBand, GradeLetter, NoteConfig, round_to_hundredths};
pub use identifiers::{Email, IdentifierError, StudentNumber};
pub use messages::{
    Field, RowError, RowErrorKind, RowOutcome, RowWarning, RowWarningKind, StructuralError,
};

use crate::constants::columns;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Grade Components
// =============================================================================

/// One of the three graded components of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeComponent {
    /// Continuous assessment (contrôle continu)
    Cc,
    /// Practical work (travaux pratiques)
    Tp,
    /// Final exam (devoir)
    Dv,
}

impl GradeComponent {
    pub const ALL: [GradeComponent; 3] = [Self::Cc, Self::Tp, Self::Dv];

    /// Normalized column name carrying this component
    pub fn column(self) -> &'static str {
        match self {
            Self::Cc => columns::NOTE_CC,
            Self::Tp => columns::NOTE_TP,
            Self::Dv => columns::NOTE_DV,
        }
    }

    /// Column label as written in templates and messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Cc => "noteCC",
            Self::Tp => "noteTP",
            Self::Dv => "noteDV",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Tp => "TP",
            Self::Dv => "DV",
        }
    }
}

impl fmt::Display for GradeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-component grade values; absent components are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentGrades {
    pub note_cc: Option<f64>,
    pub note_tp: Option<f64>,
    pub note_dv: Option<f64>,
}

impl ComponentGrades {
    pub fn new(note_cc: Option<f64>, note_tp: Option<f64>, note_dv: Option<f64>) -> Self {
        Self {
            note_cc,
            note_tp,
            note_dv,
        }
    }

    pub fn get(&self, component: GradeComponent) -> Option<f64> {
        match component {
            GradeComponent::Cc => self.note_cc,
            GradeComponent::Tp => self.note_tp,
            GradeComponent::Dv => self.note_dv,
        }
    }

    pub fn set(&mut self, component: GradeComponent, value: Option<f64>) {
        match component {
            GradeComponent::Cc => self.note_cc = value,
            GradeComponent::Tp => self.note_tp = value,
            GradeComponent::Dv => self.note_dv = value,
        }
    }

    /// True when no component carries a value
    pub fn is_empty(&self) -> bool {
        GradeComponent::ALL.iter().all(|c| self.get(*c).is_none())
    }

    /// Values from `self`, falling back to `previous` for absent components
    pub fn merged_over(&self, previous: &ComponentGrades) -> ComponentGrades {
        ComponentGrades {
            note_cc: self.note_cc.or(previous.note_cc),
            note_tp: self.note_tp.or(previous.note_tp),
            note_dv: self.note_dv.or(previous.note_dv),
        }
    }
}

// =============================================================================
// Stored Records
// =============================================================================

/// Student as held by the student repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// Student number; lookups compare it case-insensitively
    pub numero: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Whether the student belongs to the given class
    pub fn is_in_class(&self, class_id: i64) -> bool {
        self.class_id == Some(class_id)
    }
}

/// Grade record of one student in one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<i64>,
    #[serde(flatten)]
    pub grades: ComponentGrades,
    /// Weighted final grade; `None` while a weighted component is missing
    #[serde(default)]
    pub note_finale: Option<f64>,
}

impl Note {
    pub fn is_passed(&self) -> bool {
        FinalGrade::from_value(self.note_finale).is_passing()
    }

    pub fn grade_letter(&self) -> GradeLetter {
        GradeLetter::from_grade(self.note_finale)
    }
}

/// Subject with its grading weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_config: Option<NoteConfig>,
}

/// School class (group of students)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Validated Candidates
// =============================================================================

/// Grade row that passed validation and awaits reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub firstname: String,
    pub lastname: String,
    pub numero: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub grades: ComponentGrades,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn grade(&self, component: GradeComponent) -> Option<f64> {
        self.grades.get(component)
    }

    pub fn has_any_grade(&self) -> bool {
        !self.grades.is_empty()
    }
}

/// Roster row that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentCandidate {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub numero: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl StudentCandidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}
