//! End-to-end grade import
//!
//! Resolves the subject context, parses the sheet, reconciles every accepted
//! row against the repositories and persists the resulting writes in batches.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::parser::NotesWorkbookParser;
use super::reconciliation::{ImportInstruction, Reconciler};
use super::statistics::{ImportSummary, ResultAggregator};
use crate::app::models::{Note, RowErrorKind};
use crate::app::services::batch_coordinator::{BatchCoordinator, BatchResult};
use crate::app::services::grade_calculator::GradeCalculator;
use crate::app::services::progress::{ImportStage, ProgressCallback, ProgressTracker};
use crate::app::services::repositories::{
    ClassRepository, NoteRepository, StudentRepository, SubjectRepository,
};
use crate::config::ImportConfig;
use crate::{Error, Result};

/// Parameters of one grade import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportNotesRequest {
    pub subject_id: i64,
    /// Restrict student matching to this class
    pub class_id: Option<i64>,
    /// Recorded on created notes and on updates
    pub teacher_id: Option<i64>,
    pub overwrite_existing: bool,
    /// Run every stage except persistence
    pub validate_only: bool,
}

impl ImportNotesRequest {
    pub fn new(subject_id: i64) -> Self {
        Self {
            subject_id,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn with_teacher(mut self, teacher_id: i64) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn with_validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }
}

/// Grade import pipeline over the repository traits
pub struct NotesImporter {
    students: Arc<dyn StudentRepository>,
    notes: Arc<dyn NoteRepository>,
    subjects: Arc<dyn SubjectRepository>,
    classes: Arc<dyn ClassRepository>,
    parser: NotesWorkbookParser,
    config: ImportConfig,
    cancellation: Option<CancellationToken>,
}

impl NotesImporter {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        notes: Arc<dyn NoteRepository>,
        subjects: Arc<dyn SubjectRepository>,
        classes: Arc<dyn ClassRepository>,
        config: ImportConfig,
    ) -> Self {
        Self {
            students,
            notes,
            subjects,
            classes,
            parser: NotesWorkbookParser::new(config.clone()),
            config,
            cancellation: None,
        }
    }

    /// Importer backed by a single store implementing every repository
    pub fn with_store<S>(store: Arc<S>, config: ImportConfig) -> Self
    where
        S: StudentRepository + NoteRepository + SubjectRepository + ClassRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store, config)
    }

    /// Stop between batches once the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Validate student numbers against a fixed reference year
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.parser = self.parser.with_current_year(year);
        self
    }

    pub fn parser(&self) -> &NotesWorkbookParser {
        &self.parser
    }

    /// Import a grade sheet
    ///
    /// Fails before touching any row when the subject, its note configuration
    /// or the requested class is unknown, or when the sheet is structurally
    /// invalid. Everything after that is reported in the summary.
    pub async fn execute(
        &self,
        buffer: &[u8],
        request: &ImportNotesRequest,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<ImportSummary> {
        let mut tracker = ProgressTracker::new(on_progress, self.config.progress_interval_rows);
        tracker.report(ImportStage::Parsing, 5.0, "Starting import process...");

        let subject = self
            .subjects
            .find_subject(request.subject_id)
            .await?
            .ok_or_else(|| Error::subject_not_found(request.subject_id))?;
        if let Some(class_id) = request.class_id {
            self.classes
                .find_class(class_id)
                .await?
                .ok_or_else(|| Error::class_not_found(class_id))?;
        }
        let note_config = self
            .subjects
            .get_note_config(subject.id)
            .await?
            .ok_or_else(|| Error::note_config_not_found(subject.id))?;

        info!(
            "Importing grades for subject '{}' ({})",
            subject.name, note_config
        );

        tracker.set_window(5, 40);
        let report = self.parser.parse_tracked(buffer, &mut tracker)?;

        tracker.set_window(40, 60);
        tracker.report(ImportStage::Processing, 0.0, "Processing student data...");

        let reconciler = Reconciler::new(
            GradeCalculator::new(note_config),
            request.overwrite_existing,
            request.class_id,
        );
        let mut aggregator = ResultAggregator::new(&report, request.validate_only);
        let mut queue = Vec::new();
        let mut seen_students = HashSet::new();

        let candidates: Vec<_> = report.candidates().collect();
        let total = candidates.len();
        for (index, (row, candidate)) in candidates.into_iter().enumerate() {
            tracker.report_row(
                ImportStage::Processing,
                index,
                total,
                0.0,
                100.0,
                format!("Processing row {} of {}", index + 1, total),
            );

            let student = self.students.find_by_number(&candidate.numero).await?;
            let accepted = student.as_ref().filter(|s| reconciler.accepts_student(s));
            // Notes are written after this loop, so a second row for the same
            // student would not see the note queued by the first one
            if let Some(s) = accepted {
                if !seen_students.insert(s.id) {
                    aggregator.record_skip(&reconciler.repeated(row, candidate, s));
                    continue;
                }
            }
            let existing = match accepted {
                Some(s) => {
                    self.notes
                        .find_by_student_and_subject(s.id, subject.id)
                        .await?
                }
                None => None,
            };

            let instruction = reconciler.decide(row, candidate, student.as_ref(), existing.as_ref());
            if instruction.is_actionable() {
                queue.push(instruction);
            } else {
                aggregator.record_skip(&instruction);
            }
        }

        let summary = if request.validate_only {
            for instruction in &queue {
                aggregator.record_planned(instruction);
            }
            aggregator.finish(Vec::new(), false)
        } else {
            tracker.set_window(60, 90);
            self.save(queue, request, aggregator, &mut tracker).await
        };

        tracker.complete(if summary.success {
            "Import completed successfully"
        } else {
            "Import completed with no notes imported"
        });

        info!(
            "Grade import finished: {} created, {} updated, {} skipped, {} failed",
            summary.created_notes,
            summary.updated_notes,
            summary.skipped_duplicates,
            summary.failed_imports
        );
        Ok(summary)
    }

    /// Persist queued writes chunk by chunk
    async fn save(
        &self,
        queue: Vec<ImportInstruction>,
        request: &ImportNotesRequest,
        mut aggregator: ResultAggregator,
        tracker: &mut ProgressTracker<'_>,
    ) -> ImportSummary {
        let mut coordinator = BatchCoordinator::new(self.config.batch_size);
        if let Some(token) = &self.cancellation {
            coordinator = coordinator.with_cancellation(token.clone());
        }
        let batch_size = coordinator.batch_size();

        let run = coordinator
            .run(
                queue.clone(),
                |chunk: Vec<ImportInstruction>, _| {
                    let notes = Arc::clone(&self.notes);
                    let writes: Vec<_> = chunk
                        .iter()
                        .filter_map(|i| i.to_write(request.subject_id, request.teacher_id))
                        .collect();
                    async move {
                        let saved = notes.save_batch(writes).await?;
                        Ok(BatchResult::completed(0, saved))
                    }
                },
                |result, done, total| {
                    tracker.report(
                        ImportStage::Saving,
                        done as f64 / total as f64 * 100.0,
                        format!(
                            "Saved batch {} of {} ({} notes)",
                            done, total, result.successful
                        ),
                    );
                },
            )
            .await;
        debug!(
            "{} notes saved in {} batches",
            run.successful(),
            run.results.len()
        );

        for result in &run.results {
            let start = (result.batch_number - 1) * batch_size;
            let end = (start + batch_size).min(queue.len());
            let chunk = &queue[start..end];

            if result.is_failure() {
                let message = result.errors.join("; ");
                for instruction in chunk {
                    aggregator.record_failed(
                        instruction,
                        RowErrorKind::PersistenceFailed {
                            message: message.clone(),
                        },
                    );
                }
                continue;
            }

            record_saved_chunk(&mut aggregator, chunk, &result.outputs);
        }

        if run.cancelled {
            warn!("Import cancelled; {} rows not attempted", run.unattempted);
            for instruction in &queue[queue.len() - run.unattempted..] {
                aggregator.record_failed(instruction, RowErrorKind::NotAttempted);
            }
        }

        let cancelled = run.cancelled;
        aggregator.finish(run.results, cancelled)
    }
}

/// Match saved notes to their instructions; a short result marks the
/// remaining rows as failed
fn record_saved_chunk(aggregator: &mut ResultAggregator, chunk: &[ImportInstruction], saved: &[Note]) {
    for (index, instruction) in chunk.iter().enumerate() {
        match saved.get(index) {
            Some(note) => aggregator.record_saved(instruction, note),
            None => aggregator.record_failed(
                instruction,
                RowErrorKind::PersistenceFailed {
                    message: "note was not returned by the repository".to_string(),
                },
            ),
        }
    }
}
