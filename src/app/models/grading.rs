//! Grading rules: per-subject component weights, final grades, bands and letters

use super::GradeComponent;
use crate::constants::grading::{
    EXCELLENT_THRESHOLD, GOOD_THRESHOLD, LETTER_A, LETTER_B, LETTER_C, LETTER_D, PASSING_GRADE,
    WEIGHT_TOLERANCE, WEIGHT_TOTAL,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rounds a value to two decimal places
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Component weights of a subject, in percent
///
/// Every weight lies in `[0, 100]` and the three add up to 100 (within 0.01).
/// Construction through [`NoteConfig::new`] or deserialization enforces both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNoteConfig")]
pub struct NoteConfig {
    percentage_cc: f64,
    percentage_tp: f64,
    percentage_dv: f64,
}

#[derive(Deserialize)]
struct RawNoteConfig {
    percentage_cc: f64,
    #[serde(default)]
    percentage_tp: f64,
    percentage_dv: f64,
}

impl TryFrom<RawNoteConfig> for NoteConfig {
    type Error = Error;

    fn try_from(raw: RawNoteConfig) -> Result<Self> {
        NoteConfig::new(raw.percentage_cc, raw.percentage_tp, raw.percentage_dv)
    }
}

impl NoteConfig {
    /// Create a validated configuration
    pub fn new(percentage_cc: f64, percentage_tp: f64, percentage_dv: f64) -> Result<Self> {
        for (component, weight) in [
            (GradeComponent::Cc, percentage_cc),
            (GradeComponent::Tp, percentage_tp),
            (GradeComponent::Dv, percentage_dv),
        ] {
            if !weight.is_finite() || !(0.0..=100.0).contains(&weight) {
                return Err(Error::invalid_note_config(format!(
                    "{} percentage must be between 0 and 100, got {}",
                    component.short_name(),
                    weight
                )));
            }
        }

        let total = percentage_cc + percentage_tp + percentage_dv;
        if (total - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
            return Err(Error::invalid_note_config(format!(
                "Total percentage must equal 100%, got {}%",
                total
            )));
        }

        Ok(Self {
            percentage_cc,
            percentage_tp,
            percentage_dv,
        })
    }

    /// Two-component configuration without practical work
    pub fn standard(percentage_cc: f64) -> Result<Self> {
        Self::new(percentage_cc, 0.0, WEIGHT_TOTAL - percentage_cc)
    }

    /// Three-component configuration; the exam takes the remainder
    pub fn with_tp(percentage_cc: f64, percentage_tp: f64) -> Result<Self> {
        Self::new(
            percentage_cc,
            percentage_tp,
            WEIGHT_TOTAL - percentage_cc - percentage_tp,
        )
    }

    pub fn weight(&self, component: GradeComponent) -> f64 {
        match component {
            GradeComponent::Cc => self.percentage_cc,
            GradeComponent::Tp => self.percentage_tp,
            GradeComponent::Dv => self.percentage_dv,
        }
    }

    pub fn has_tp_component(&self) -> bool {
        self.percentage_tp > 0.0
    }

    /// Components contributing to the final grade, with their weights
    pub fn weighted_components(&self) -> impl Iterator<Item = (GradeComponent, f64)> + '_ {
        GradeComponent::ALL
            .into_iter()
            .map(|c| (c, self.weight(c)))
            .filter(|(_, weight)| *weight > 0.0)
    }

    /// Human-readable weight summary, e.g. `CC: 40%, DV: 60%`
    pub fn description(&self) -> String {
        self.weighted_components()
            .map(|(c, w)| format!("{}: {}%", c.short_name(), w))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for NoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Weighted final grade of one student in one subject
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FinalGrade {
    /// Rounded to two decimals; `None` when a weighted component is missing
    pub value: Option<f64>,
    /// Weighted components that had no value
    pub missing: Vec<GradeComponent>,
}

impl FinalGrade {
    pub fn from_value(value: Option<f64>) -> Self {
        Self {
            value,
            missing: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.value.is_some()
    }

    /// Undefined grades never pass
    pub fn is_passing(&self) -> bool {
        self.value.is_some_and(|v| v >= PASSING_GRADE)
    }

    pub fn band(&self) -> Option<GradeBand> {
        self.value.map(GradeBand::from_grade)
    }

    pub fn letter(&self) -> GradeLetter {
        GradeLetter::from_grade(self.value)
    }
}

/// Reporting band of a final grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    Excellent,
    Good,
    Passable,
    Insufficient,
}

impl GradeBand {
    pub fn from_grade(grade: f64) -> Self {
        if grade >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if grade >= GOOD_THRESHOLD {
            Self::Good
        } else if grade >= PASSING_GRADE {
            Self::Passable
        } else {
            Self::Insufficient
        }
    }
}

/// Letter grade of a stored final grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLetter {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl GradeLetter {
    pub fn from_grade(grade: Option<f64>) -> Self {
        match grade {
            None => Self::NotAvailable,
            Some(g) if g >= LETTER_A => Self::A,
            Some(g) if g >= LETTER_B => Self::B,
            Some(g) if g >= LETTER_C => Self::C,
            Some(g) if g >= LETTER_D => Self::D,
            Some(_) => Self::F,
        }
    }
}

impl fmt::Display for GradeLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
            Self::NotAvailable => "N/A",
        };
        f.write_str(letter)
    }
}
