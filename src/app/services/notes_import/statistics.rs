//! Import statistics and result aggregation
//!
//! [`ResultAggregator`] collects the fate of every row (parsed, skipped,
//! saved, failed) and folds it into the public [`ImportSummary`].

use serde::Serialize;

use super::reconciliation::{ImportInstruction, ImportTarget, SkipReason};
use super::report::NotesParseReport;
use crate::app::models::{
    ComponentGrades, FinalGrade, GradeBand, Note, RowError, RowErrorKind, round_to_hundredths,
};
use crate::app::services::batch_coordinator::BatchResult;

/// Note written by the import, as reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedNote {
    pub id: i64,
    pub row: usize,
    pub student_id: i64,
    pub student_full_name: String,
    pub student_numero: String,
    #[serde(flatten)]
    pub grades: ComponentGrades,
    pub note_finale: Option<f64>,
    pub grade_letter: String,
    pub is_passed: bool,
    pub is_updated: bool,
    pub is_created: bool,
}

impl ImportedNote {
    /// Pair a saved note with the instruction that produced it
    pub fn from_saved(instruction: &ImportInstruction, note: &Note) -> Self {
        let (student_full_name, student_numero) = instruction
            .student
            .as_ref()
            .map(|s| (s.full_name(), s.numero.clone()))
            .unwrap_or_else(|| {
                (
                    instruction.candidate.full_name(),
                    instruction.candidate.numero.clone(),
                )
            });
        let is_updated = instruction.target == ImportTarget::Update;

        Self {
            id: note.id,
            row: instruction.row,
            student_id: note.student_id,
            student_full_name,
            student_numero,
            grades: note.grades,
            note_finale: note.note_finale,
            grade_letter: note.grade_letter().to_string(),
            is_passed: note.is_passed(),
            is_updated,
            is_created: !is_updated,
        }
    }
}

/// What happened to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Created,
    Updated,
    /// Would be created (validation-only run)
    WouldCreate,
    /// Would be updated (validation-only run)
    WouldUpdate,
    Skipped,
    Failed,
}

/// Per-row processing detail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedNoteRow {
    pub row: usize,
    pub student_id: Option<i64>,
    pub student_firstname: String,
    pub student_lastname: String,
    pub student_email: Option<String>,
    pub student_numero: String,
    #[serde(flatten)]
    pub grades: ComponentGrades,
    pub is_existing_student: bool,
    pub is_existing_note: bool,
    pub final_grade: Option<f64>,
    pub action: RowAction,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProcessedNoteRow {
    fn from_instruction(instruction: &ImportInstruction, action: RowAction) -> Self {
        let candidate = &instruction.candidate;
        Self {
            row: instruction.row,
            student_id: instruction.student.as_ref().map(|s| s.id),
            student_firstname: candidate.firstname.clone(),
            student_lastname: candidate.lastname.clone(),
            student_email: candidate.email.clone(),
            student_numero: candidate.numero.clone(),
            grades: candidate.grades,
            is_existing_student: instruction.student.is_some(),
            is_existing_note: instruction.existing_note.is_some(),
            final_grade: instruction.final_grade.value,
            action,
            errors: instruction.errors.iter().map(|e| e.kind.to_string()).collect(),
            warnings: instruction.warnings.iter().map(|w| w.kind.to_string()).collect(),
        }
    }
}

/// Count of evaluated notes per grade band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    pub excellent: usize,
    pub good: usize,
    pub passable: usize,
    pub insufficient: usize,
}

impl GradeDistribution {
    pub fn add(&mut self, band: GradeBand) {
        match band {
            GradeBand::Excellent => self.excellent += 1,
            GradeBand::Good => self.good += 1,
            GradeBand::Passable => self.passable += 1,
            GradeBand::Insufficient => self.insufficient += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.passable + self.insufficient
    }
}

/// Grades and final grade of one note feeding the statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedNote {
    pub grades: ComponentGrades,
    pub note_finale: Option<f64>,
}

/// Grade statistics over the notes written (or planned) by an import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStatistics {
    pub average_cc: Option<f64>,
    pub average_tp: Option<f64>,
    pub average_dv: Option<f64>,
    pub average_final: Option<f64>,
    /// Passing notes over notes with a defined final grade, in percent
    pub pass_rate: f64,
    /// Notes with a defined final grade over valid rows, in percent
    pub completion_rate: f64,
    pub distribution: GradeDistribution,
}

impl ImportStatistics {
    pub fn calculate(notes: &[GradedNote], valid_rows: usize) -> Self {
        let average = |values: Vec<f64>| {
            (!values.is_empty())
                .then(|| round_to_hundredths(values.iter().sum::<f64>() / values.len() as f64))
        };

        let finals: Vec<f64> = notes.iter().filter_map(|n| n.note_finale).collect();
        let passing = finals
            .iter()
            .filter(|v| FinalGrade::from_value(Some(**v)).is_passing())
            .count();

        let mut distribution = GradeDistribution::default();
        for value in &finals {
            distribution.add(GradeBand::from_grade(*value));
        }

        Self {
            average_cc: average(notes.iter().filter_map(|n| n.grades.note_cc).collect()),
            average_tp: average(notes.iter().filter_map(|n| n.grades.note_tp).collect()),
            average_dv: average(notes.iter().filter_map(|n| n.grades.note_dv).collect()),
            pass_rate: percentage(passing, finals.len()),
            completion_rate: percentage(finals.len(), valid_rows),
            average_final: average(finals),
            distribution,
        }
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to_hundredths(part as f64 / whole as f64 * 100.0)
    }
}

/// Public result of a grade import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    /// At least one note was created or updated (or would be, when validating)
    pub success: bool,
    pub message: String,
    pub validate_only: bool,
    pub cancelled: bool,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// Rows that reached persistence (or would have)
    pub processed_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub skipped_duplicates: usize,
    pub created_notes: usize,
    pub updated_notes: usize,
    pub students_not_found: usize,
    pub has_tp_component: bool,
    pub statistics: ImportStatistics,
    pub imported_notes: Vec<ImportedNote>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub processing_details: Vec<ProcessedNoteRow>,
    pub batches: Vec<BatchResult<Note>>,
}

/// Accumulates row fates into an [`ImportSummary`]
#[derive(Debug, Default)]
pub struct ResultAggregator {
    validate_only: bool,
    total_rows: usize,
    valid_rows: usize,
    has_tp_component: bool,
    processed_rows: usize,
    failed_imports: usize,
    skipped_duplicates: usize,
    created_notes: usize,
    updated_notes: usize,
    students_not_found: usize,
    imported_notes: Vec<ImportedNote>,
    graded: Vec<GradedNote>,
    errors: Vec<RowError>,
    parse_errors: Vec<String>,
    warnings: Vec<String>,
    details: Vec<ProcessedNoteRow>,
}

impl ResultAggregator {
    /// Start from the parse report; its row errors and warnings are carried over
    pub fn new(report: &NotesParseReport, validate_only: bool) -> Self {
        Self {
            validate_only,
            total_rows: report.total_rows,
            valid_rows: report.valid_rows,
            has_tp_component: report.has_tp_component,
            parse_errors: report.error_messages(),
            warnings: report.warning_messages(),
            ..Self::default()
        }
    }

    /// Row that produced no write
    pub fn record_skip(&mut self, instruction: &ImportInstruction) {
        match instruction.target {
            ImportTarget::Skip(SkipReason::StudentNotFound) => {
                self.students_not_found += 1;
                self.failed_imports += 1;
            }
            ImportTarget::Skip(SkipReason::NoteExists | SkipReason::RepeatedRow) => {
                self.skipped_duplicates += 1
            }
            ImportTarget::Create | ImportTarget::Update => {}
        }
        self.push_messages(instruction);
        let action = if instruction.errors.is_empty() {
            RowAction::Skipped
        } else {
            RowAction::Failed
        };
        self.details
            .push(ProcessedNoteRow::from_instruction(instruction, action));
    }

    /// Row whose write was persisted
    pub fn record_saved(&mut self, instruction: &ImportInstruction, note: &Note) {
        self.processed_rows += 1;
        let action = if instruction.target == ImportTarget::Update {
            self.updated_notes += 1;
            RowAction::Updated
        } else {
            self.created_notes += 1;
            RowAction::Created
        };
        self.push_messages(instruction);
        self.graded.push(GradedNote {
            grades: note.grades,
            note_finale: note.note_finale,
        });
        self.imported_notes
            .push(ImportedNote::from_saved(instruction, note));
        let mut detail = ProcessedNoteRow::from_instruction(instruction, action);
        detail.final_grade = note.note_finale;
        self.details.push(detail);
    }

    /// Row that would be written by a real run
    pub fn record_planned(&mut self, instruction: &ImportInstruction) {
        self.processed_rows += 1;
        let action = if instruction.target == ImportTarget::Update {
            self.updated_notes += 1;
            RowAction::WouldUpdate
        } else {
            self.created_notes += 1;
            RowAction::WouldCreate
        };
        self.push_messages(instruction);
        self.graded.push(GradedNote {
            grades: instruction.grades,
            note_finale: instruction.final_grade.value,
        });
        self.details
            .push(ProcessedNoteRow::from_instruction(instruction, action));
    }

    /// Row whose write failed or was never attempted
    pub fn record_failed(&mut self, instruction: &ImportInstruction, kind: RowErrorKind) {
        if kind != RowErrorKind::NotAttempted {
            self.processed_rows += 1;
        }
        self.failed_imports += 1;

        let mut failed = instruction.clone();
        failed.errors.push(RowError::new(instruction.row, kind));
        self.push_messages(&failed);
        self.details
            .push(ProcessedNoteRow::from_instruction(&failed, RowAction::Failed));
    }

    fn push_messages(&mut self, instruction: &ImportInstruction) {
        self.errors.extend(instruction.errors.iter().cloned());
        self.warnings
            .extend(instruction.warnings.iter().map(ToString::to_string));
    }

    /// Fold everything into the summary
    pub fn finish(mut self, batches: Vec<BatchResult<Note>>, cancelled: bool) -> ImportSummary {
        self.details.sort_by_key(|d| d.row);
        self.imported_notes.sort_by_key(|n| n.row);
        self.errors.sort_by_key(|e| e.row);

        let successful_imports = self.created_notes + self.updated_notes;
        let statistics = ImportStatistics::calculate(&self.graded, self.valid_rows);
        let success = successful_imports > 0;
        let message = self.message(successful_imports, cancelled);

        let mut errors = self.parse_errors;
        errors.extend(self.errors.iter().map(ToString::to_string));

        ImportSummary {
            success,
            message,
            validate_only: self.validate_only,
            cancelled,
            total_rows: self.total_rows,
            valid_rows: self.valid_rows,
            invalid_rows: self.total_rows - self.valid_rows,
            processed_rows: self.processed_rows,
            successful_imports,
            failed_imports: self.failed_imports,
            skipped_duplicates: self.skipped_duplicates,
            created_notes: self.created_notes,
            updated_notes: self.updated_notes,
            students_not_found: self.students_not_found,
            has_tp_component: self.has_tp_component,
            statistics,
            imported_notes: self.imported_notes,
            errors,
            warnings: self.warnings,
            processing_details: self.details,
            batches,
        }
    }

    fn message(&self, successful: usize, cancelled: bool) -> String {
        let mut message = if self.validate_only {
            format!(
                "Validation completed: {} notes would be created, {} updated",
                self.created_notes, self.updated_notes
            )
        } else if successful > 0 {
            format!("Successfully imported {} notes", successful)
        } else {
            "No notes were imported".to_string()
        };
        if self.failed_imports > 0 {
            message.push_str(&format!(" ({} failed)", self.failed_imports));
        }
        if cancelled {
            message.push_str(". Import was cancelled before all batches ran");
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(cc: Option<f64>, dv: Option<f64>, finale: Option<f64>) -> GradedNote {
        GradedNote {
            grades: ComponentGrades::new(cc, None, dv),
            note_finale: finale,
        }
    }

    #[test]
    fn test_rates_use_distinct_denominators() {
        let notes = vec![
            graded(Some(12.0), Some(14.0), Some(13.2)),
            graded(Some(6.0), Some(8.0), Some(7.2)),
            graded(Some(10.0), None, None),
        ];
        let stats = ImportStatistics::calculate(&notes, 4);

        // 1 of 2 evaluated notes passes
        assert_eq!(stats.pass_rate, 50.0);
        // 2 evaluated notes over 4 valid rows
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.average_cc, Some(9.33));
        assert_eq!(stats.average_dv, Some(11.0));
        assert_eq!(stats.average_tp, None);
        assert_eq!(stats.average_final, Some(10.2));
        assert_eq!(stats.distribution.good, 1);
        assert_eq!(stats.distribution.insufficient, 1);
        assert_eq!(stats.distribution.total(), 2);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = ImportStatistics::calculate(&[], 0);
        assert_eq!(stats.pass_rate, 0.0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.average_final, None);
    }
}
