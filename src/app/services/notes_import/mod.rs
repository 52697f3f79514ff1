//! Bulk import of student grades from spreadsheet uploads
//!
//! A grade sheet carries one row per student with the student's names and
//! number, an optional email and up to three grade columns (`noteCC`,
//! `noteTP`, `noteDV`). Rows are validated independently; a bad row never
//! stops the others.
//!
//! ## Architecture
//!
//! - [`parser`] - Decoding, header checks and row validation with progress
//! - [`record_parser`] - One raw row → candidate or row-scoped errors
//! - [`reconciliation`] - Create / update / skip decision per candidate
//! - [`importer`] - Subject context, repository lookups and batched persistence
//! - [`statistics`] - Result aggregation, grade statistics and the public summary
//! - [`report`] - Parse, preview and validation result structures
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use grade_import::app::services::notes_import::{ImportNotesRequest, NotesImporter};
//! use grade_import::app::services::repositories::InMemoryStore;
//! use grade_import::ImportConfig;
//!
//! # async fn example(store: Arc<InMemoryStore>, buffer: Vec<u8>) -> grade_import::Result<()> {
//! let importer = NotesImporter::with_store(store, ImportConfig::default());
//! let request = ImportNotesRequest::new(1).with_class(3).with_overwrite(true);
//! let summary = importer.execute(&buffer, &request, None).await?;
//!
//! println!("{} created, {} updated, {} failed",
//!          summary.created_notes,
//!          summary.updated_notes,
//!          summary.failed_imports);
//! # Ok(())
//! # }
//! ```

pub mod importer;
pub mod parser;
pub mod reconciliation;
pub mod record_parser;
pub mod report;
pub mod statistics;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use importer::{ImportNotesRequest, NotesImporter};
pub use parser::NotesWorkbookParser;
pub use reconciliation::{ImportInstruction, ImportTarget, Reconciler, SkipReason};
pub use report::{FileFormatInfo, NoteValidation, NotesParseReport, NotesPreview};
pub use statistics::{
    GradeDistribution, GradedNote, ImportStatistics, ImportSummary, ImportedNote, ProcessedNoteRow,
    ResultAggregator, RowAction,
};
