//! Create / update / skip decisions for validated grade rows
//!
//! [`Reconciler::decide`] is pure: the importer looks up the student and the
//! existing note, then hands both in. The decision table is:
//!
//! | student   | existing note | overwrite | decision                  |
//! |-----------|---------------|-----------|---------------------------|
//! | not found | -             | -         | skip, student not found   |
//! | found     | none          | -         | create                    |
//! | found     | present       | false     | skip, note already exists |
//! | found     | present       | true      | update (merged grades)    |
//!
//! A student reached by an earlier row of the same sheet is skipped through
//! [`Reconciler::repeated`]; only the first row for a student is written.

use tracing::debug;

use crate::app::models::{
    Candidate, ComponentGrades, FinalGrade, Note, RowError, RowErrorKind, RowWarning,
    RowWarningKind, Student,
};
use crate::app::services::grade_calculator::GradeCalculator;
use crate::app::services::repositories::{NewNote, NoteWrite};

/// Why a row produces no write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No student with this number (in the requested class)
    StudentNotFound,
    /// A note exists and overwriting is disabled
    NoteExists,
    /// An earlier row of the sheet already targets the same student
    RepeatedRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    Create,
    Update,
    Skip(SkipReason),
}

/// Planned action for one validated row
#[derive(Debug, Clone, PartialEq)]
pub struct ImportInstruction {
    pub row: usize,
    pub target: ImportTarget,
    pub candidate: Candidate,
    pub student: Option<Student>,
    pub existing_note: Option<Note>,
    /// Grades to store: the candidate's, over the existing note's on update
    pub grades: ComponentGrades,
    pub final_grade: FinalGrade,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

impl ImportInstruction {
    pub fn is_actionable(&self) -> bool {
        matches!(self.target, ImportTarget::Create | ImportTarget::Update)
    }

    /// Note id when updating
    pub fn existing_note_id(&self) -> Option<i64> {
        self.existing_note.as_ref().map(|n| n.id)
    }

    /// Persistence write for actionable instructions
    pub fn to_write(&self, subject_id: i64, teacher_id: Option<i64>) -> Option<NoteWrite> {
        let student = self.student.as_ref()?;
        match self.target {
            ImportTarget::Create => Some(NoteWrite::Create(NewNote {
                student_id: student.id,
                subject_id,
                teacher_id,
                grades: self.grades,
                note_finale: self.final_grade.value,
            })),
            ImportTarget::Update => {
                let existing = self.existing_note.as_ref()?;
                Some(NoteWrite::Update(Note {
                    id: existing.id,
                    student_id: student.id,
                    subject_id,
                    teacher_id: teacher_id.or(existing.teacher_id),
                    grades: self.grades,
                    note_finale: self.final_grade.value,
                }))
            }
            ImportTarget::Skip(_) => None,
        }
    }
}

/// Decides what to do with each validated row of one import
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    calculator: GradeCalculator,
    overwrite_existing: bool,
    class_id: Option<i64>,
}

impl Reconciler {
    pub fn new(calculator: GradeCalculator, overwrite_existing: bool, class_id: Option<i64>) -> Self {
        Self {
            calculator,
            overwrite_existing,
            class_id,
        }
    }

    /// Whether a looked-up student is eligible for this import
    pub fn accepts_student(&self, student: &Student) -> bool {
        self.class_id.is_none_or(|class_id| student.is_in_class(class_id))
    }

    /// Decide the action for one row
    ///
    /// `student` is the result of the number lookup; a student outside the
    /// requested class is treated as not found. `existing` is the student's
    /// current note in the subject, if any.
    pub fn decide(
        &self,
        row: usize,
        candidate: &Candidate,
        student: Option<&Student>,
        existing: Option<&Note>,
    ) -> ImportInstruction {
        let mut instruction = ImportInstruction {
            row,
            target: ImportTarget::Create,
            candidate: candidate.clone(),
            student: None,
            existing_note: None,
            grades: candidate.grades,
            final_grade: FinalGrade::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        };

        let Some(student) = student.filter(|s| self.accepts_student(s)) else {
            debug!("Row {}: student {} not found", row, candidate.numero);
            instruction.target = ImportTarget::Skip(SkipReason::StudentNotFound);
            instruction.errors.push(RowError::new(
                row,
                RowErrorKind::StudentNotFound {
                    numero: candidate.numero.clone(),
                },
            ));
            return instruction;
        };
        instruction.student = Some(student.clone());

        if let Some(existing) = existing {
            instruction.existing_note = Some(existing.clone());
            if !self.overwrite_existing {
                debug!("Row {}: note exists, skipping", row);
                instruction.target = ImportTarget::Skip(SkipReason::NoteExists);
                instruction
                    .warnings
                    .push(RowWarning::new(row, RowWarningKind::NoteAlreadyExists));
                return instruction;
            }
            instruction.target = ImportTarget::Update;
            instruction.grades = candidate.grades.merged_over(&existing.grades);
        }

        if candidate.grades.note_tp.is_some() && !self.calculator.config().has_tp_component() {
            instruction
                .warnings
                .push(RowWarning::new(row, RowWarningKind::TpNotConfigured));
        }

        instruction.final_grade = self.calculator.calculate(&instruction.grades);
        if !instruction.final_grade.is_complete() && !instruction.grades.is_empty() {
            instruction.warnings.push(RowWarning::new(
                row,
                RowWarningKind::IncompleteGrade {
                    missing: instruction.final_grade.missing.clone(),
                },
            ));
        }

        debug!(
            "Row {}: {:?} for student {} (final grade {:?})",
            row, instruction.target, student.id, instruction.final_grade.value
        );
        instruction
    }

    /// Skip a row whose student was already handled earlier in the sheet
    pub fn repeated(&self, row: usize, candidate: &Candidate, student: &Student) -> ImportInstruction {
        debug!("Row {}: student {} repeats an earlier row", row, student.id);
        ImportInstruction {
            row,
            target: ImportTarget::Skip(SkipReason::RepeatedRow),
            candidate: candidate.clone(),
            student: Some(student.clone()),
            existing_note: None,
            grades: candidate.grades,
            final_grade: FinalGrade::default(),
            errors: Vec::new(),
            warnings: vec![RowWarning::new(
                row,
                RowWarningKind::DuplicateStudent {
                    student: student.full_name(),
                },
            )],
        }
    }
}
