//! Weighted final grade computation
//!
//! The final grade is the weighted sum of every component whose weight is
//! positive, rounded to two decimals. If any weighted component has no value
//! the final grade is undefined and the missing components are reported as
//! completion gaps.

use tracing::trace;

use crate::app::models::{ComponentGrades, FinalGrade, GradeComponent, NoteConfig, round_to_hundredths};

/// Computes final grades for one subject
#[derive(Debug, Clone, Copy)]
pub struct GradeCalculator {
    config: NoteConfig,
}

impl GradeCalculator {
    pub fn new(config: NoteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NoteConfig {
        &self.config
    }

    /// Compute the final grade from per-component values
    pub fn calculate(&self, grades: &ComponentGrades) -> FinalGrade {
        let mut total = 0.0;
        let mut missing = Vec::new();

        for (component, weight) in self.config.weighted_components() {
            match grades.get(component) {
                Some(value) => total += value * weight / 100.0,
                None => missing.push(component),
            }
        }

        let value = missing.is_empty().then(|| round_to_hundredths(total));
        trace!("Final grade {:?} (missing: {:?})", value, missing);

        FinalGrade { value, missing }
    }

    /// Whether a supplied component carries no weight for this subject
    pub fn is_unweighted(&self, component: GradeComponent) -> bool {
        self.config.weight(component) <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grades(cc: Option<f64>, tp: Option<f64>, dv: Option<f64>) -> ComponentGrades {
        ComponentGrades::new(cc, tp, dv)
    }

    #[test]
    fn test_two_component_grade_is_exact() {
        let calculator = GradeCalculator::new(NoteConfig::new(40.0, 0.0, 60.0).unwrap());
        let final_grade = calculator.calculate(&grades(Some(10.0), None, Some(10.0)));

        assert_eq!(final_grade.value, Some(10.0));
        assert!(final_grade.missing.is_empty());
        assert!(final_grade.is_passing());
    }

    #[test]
    fn test_three_component_grade() {
        let calculator = GradeCalculator::new(NoteConfig::with_tp(30.0, 30.0).unwrap());
        let final_grade = calculator.calculate(&grades(Some(15.5), Some(14.0), Some(16.0)));

        // 4.65 + 4.2 + 6.4
        assert_eq!(final_grade.value, Some(15.25));
    }

    #[test]
    fn test_result_is_rounded_to_hundredths() {
        let calculator = GradeCalculator::new(NoteConfig::new(33.33, 33.33, 33.34).unwrap());
        let final_grade = calculator.calculate(&grades(Some(11.0), Some(12.0), Some(13.0)));

        // 3.6663 + 3.9996 + 4.3342 = 12.0001
        assert_eq!(final_grade.value, Some(12.0));
    }

    #[test]
    fn test_missing_weighted_component_leaves_grade_undefined() {
        let calculator = GradeCalculator::new(NoteConfig::with_tp(30.0, 30.0).unwrap());
        let final_grade = calculator.calculate(&grades(Some(12.0), None, Some(14.0)));

        assert_eq!(final_grade.value, None);
        assert_eq!(final_grade.missing, vec![GradeComponent::Tp]);
        assert!(!final_grade.is_passing());
    }

    /// A grade for a zero-weight component does not influence the result
    #[test]
    fn test_unweighted_component_is_ignored() {
        let calculator = GradeCalculator::new(NoteConfig::standard(40.0).unwrap());
        let with_tp = calculator.calculate(&grades(Some(8.0), Some(20.0), Some(9.0)));
        let without_tp = calculator.calculate(&grades(Some(8.0), None, Some(9.0)));

        assert_eq!(with_tp, without_tp);
        assert_eq!(with_tp.value, Some(8.6));
        assert!(calculator.is_unweighted(GradeComponent::Tp));
        assert!(!with_tp.is_passing());
    }

    #[test]
    fn test_single_component_subject() {
        let calculator = GradeCalculator::new(NoteConfig::new(0.0, 0.0, 100.0).unwrap());
        let final_grade = calculator.calculate(&grades(None, None, Some(17.25)));
        assert_eq!(final_grade.value, Some(17.25));
        assert_eq!(final_grade.letter().to_string(), "A");
    }
}
