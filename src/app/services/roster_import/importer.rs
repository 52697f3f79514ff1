//! End-to-end roster import

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::parser::{RosterParseReport, RosterWorkbookParser};
use crate::app::models::{
    RowError, RowErrorKind, RowWarning, RowWarningKind, Student, StudentCandidate,
};
use crate::app::services::batch_coordinator::{BatchCoordinator, BatchResult};
use crate::app::services::repositories::{
    ClassRepository, NewStudent, StudentRepository, StudentWrite,
};
use crate::config::ImportConfig;
use crate::{Error, Result};

/// Parameters of one roster import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStudentsRequest {
    /// Class every imported student is placed in
    pub class_id: i64,
    pub overwrite_existing: bool,
}

impl ImportStudentsRequest {
    pub fn new(class_id: i64) -> Self {
        Self {
            class_id,
            overwrite_existing: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentAction {
    Created,
    Updated,
}

/// Student written by the import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedStudent {
    pub id: i64,
    pub row: usize,
    pub full_name: String,
    pub email: String,
    pub numero: String,
    pub action: StudentAction,
}

/// Outcome of a roster import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterImportSummary {
    pub success: bool,
    pub message: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub skipped_duplicates: usize,
    pub created: usize,
    pub updated: usize,
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub imported_students: Vec<ImportedStudent>,
}

/// Queued student write with the row it came from
#[derive(Debug, Clone)]
struct PlannedWrite {
    row: usize,
    action: StudentAction,
    write: StudentWrite,
}

/// Roster import pipeline over the repository traits
pub struct RosterImporter {
    students: Arc<dyn StudentRepository>,
    classes: Arc<dyn ClassRepository>,
    parser: RosterWorkbookParser,
    config: ImportConfig,
    cancellation: Option<CancellationToken>,
}

impl RosterImporter {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        classes: Arc<dyn ClassRepository>,
        config: ImportConfig,
    ) -> Self {
        Self {
            students,
            classes,
            parser: RosterWorkbookParser::new(&config),
            config,
            cancellation: None,
        }
    }

    pub fn with_store<S>(store: Arc<S>, config: ImportConfig) -> Self
    where
        S: StudentRepository + ClassRepository + 'static,
    {
        Self::new(store.clone(), store, config)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Anchor date validation on a fixed day
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.parser = self.parser.with_today(today);
        self
    }

    /// Import a roster sheet into the requested class
    pub async fn execute(
        &self,
        buffer: &[u8],
        request: &ImportStudentsRequest,
    ) -> Result<RosterImportSummary> {
        let class = self
            .classes
            .find_class(request.class_id)
            .await?
            .ok_or_else(|| Error::class_not_found(request.class_id))?;
        info!("Importing roster into class '{}'", class.name);

        let report = self.parser.parse(buffer)?;
        let mut errors: Vec<RowError> = report.errors().cloned().collect();
        let mut warnings: Vec<RowWarning> = report.warnings().cloned().collect();
        let mut skipped = 0;

        let queue = self
            .plan(&report, request, &mut warnings, &mut skipped)
            .await?;

        let mut coordinator = BatchCoordinator::new(self.config.batch_size);
        if let Some(token) = &self.cancellation {
            coordinator = coordinator.with_cancellation(token.clone());
        }
        let batch_size = coordinator.batch_size();

        let run = coordinator
            .run(
                queue.clone(),
                |chunk: Vec<PlannedWrite>, _| {
                    let students = Arc::clone(&self.students);
                    let writes: Vec<StudentWrite> = chunk.into_iter().map(|p| p.write).collect();
                    async move {
                        let saved = students.save_batch(writes).await?;
                        Ok(BatchResult::completed(0, saved))
                    }
                },
                |_, _, _| {},
            )
            .await;

        let mut imported = Vec::new();
        let mut write_failures = 0;
        for result in &run.results {
            let start = (result.batch_number - 1) * batch_size;
            let end = (start + batch_size).min(queue.len());
            for (index, planned) in queue[start..end].iter().enumerate() {
                match result.outputs.get(index) {
                    Some(student) if !result.is_failure() => {
                        imported.push(imported_student(planned, student))
                    }
                    _ => {
                        write_failures += 1;
                        errors.push(RowError::new(
                            planned.row,
                            RowErrorKind::PersistenceFailed {
                                message: result.errors.join("; "),
                            },
                        ));
                    }
                }
            }
        }
        if run.cancelled {
            warn!("Roster import cancelled; {} rows not attempted", run.unattempted);
            write_failures += run.unattempted;
            for planned in &queue[queue.len() - run.unattempted..] {
                errors.push(RowError::new(planned.row, RowErrorKind::NotAttempted));
            }
        }

        errors.sort_by_key(|e| e.row);
        warnings.sort_by_key(|w| w.row);

        let created = imported
            .iter()
            .filter(|s| s.action == StudentAction::Created)
            .count();
        let successful = imported.len();
        // Rejected rows count once however many errors they carry
        let failed = report.invalid_rows() + write_failures;
        let summary = RosterImportSummary {
            success: successful > 0,
            message: summary_message(successful, failed, skipped),
            total_rows: report.total_rows,
            valid_rows: report.valid_rows,
            successful_imports: successful,
            failed_imports: failed,
            skipped_duplicates: skipped,
            created,
            updated: successful - created,
            cancelled: run.cancelled,
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
            imported_students: imported,
        };

        info!("{}", summary.message);
        Ok(summary)
    }

    /// Decide create, update or skip for every accepted row
    async fn plan(
        &self,
        report: &RosterParseReport,
        request: &ImportStudentsRequest,
        warnings: &mut Vec<RowWarning>,
        skipped: &mut usize,
    ) -> Result<Vec<PlannedWrite>> {
        let mut seen_emails = HashSet::new();
        let mut seen_numbers = HashSet::new();
        let mut queue = Vec::new();

        for (row, candidate) in report.candidates() {
            let email_key = candidate.email.to_lowercase();
            let number_key = candidate.numero.to_uppercase();
            if seen_emails.contains(&email_key) || seen_numbers.contains(&number_key) {
                debug!("Row {}: repeats an earlier row of the sheet", row);
                warnings.push(RowWarning::new(
                    row,
                    RowWarningKind::DuplicateStudent {
                        student: candidate.full_name(),
                    },
                ));
                *skipped += 1;
                continue;
            }
            seen_emails.insert(email_key);
            seen_numbers.insert(number_key);

            let existing = match self.students.find_by_email(&candidate.email).await? {
                Some(student) => Some(student),
                None => self.students.find_by_number(&candidate.numero).await?,
            };

            match existing {
                Some(student) if !request.overwrite_existing => {
                    debug!("Row {}: student {} already exists", row, student.id);
                    warnings.push(RowWarning::new(
                        row,
                        RowWarningKind::DuplicateStudent {
                            student: student.full_name(),
                        },
                    ));
                    *skipped += 1;
                }
                Some(student) => queue.push(PlannedWrite {
                    row,
                    action: StudentAction::Updated,
                    write: StudentWrite::Update(updated_student(
                        student,
                        candidate,
                        request.class_id,
                    )),
                }),
                None => queue.push(PlannedWrite {
                    row,
                    action: StudentAction::Created,
                    write: StudentWrite::Create(NewStudent {
                        firstname: candidate.firstname.clone(),
                        lastname: candidate.lastname.clone(),
                        email: candidate.email.clone(),
                        numero: candidate.numero.clone(),
                        class_id: Some(request.class_id),
                        birth_date: candidate.birth_date,
                    }),
                }),
            }
        }
        Ok(queue)
    }
}

/// Existing student overwritten by the row; a missing birth date keeps the
/// stored one
fn updated_student(existing: Student, candidate: &StudentCandidate, class_id: i64) -> Student {
    Student {
        id: existing.id,
        firstname: candidate.firstname.clone(),
        lastname: candidate.lastname.clone(),
        email: candidate.email.clone(),
        numero: candidate.numero.clone(),
        class_id: Some(class_id),
        birth_date: candidate.birth_date.or(existing.birth_date),
    }
}

fn imported_student(planned: &PlannedWrite, student: &Student) -> ImportedStudent {
    ImportedStudent {
        id: student.id,
        row: planned.row,
        full_name: student.full_name(),
        email: student.email.clone(),
        numero: student.numero.clone(),
        action: planned.action,
    }
}

fn summary_message(imported: usize, failed: usize, skipped: usize) -> String {
    if imported == 0 {
        return format!(
            "Import failed. No students were imported. {} failed, {} skipped.",
            failed, skipped
        );
    }

    let mut message = format!(
        "Import completed successfully. {} students imported.",
        imported
    );
    if failed > 0 {
        message.push_str(&format!(" {} failed.", failed));
    }
    if skipped > 0 {
        message.push_str(&format!(" {} duplicates skipped.", skipped));
    }
    message
}
