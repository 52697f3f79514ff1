//! Bulk import of students from roster spreadsheets
//!
//! A roster sheet lists one student per row (`prenom`, `nom`, `email`,
//! `numeroEtudiant`, optional `dateNaissance`). Every accepted row becomes a
//! student of the requested class unless it matches an existing student by
//! email or number.
//!
//! ## Architecture
//!
//! - [`record_parser`] - One raw row → student candidate, birth date decoding
//! - [`parser`] - Decoding and header checks for roster sheets
//! - [`importer`] - Duplicate detection, class placement and batched writes

pub mod importer;
pub mod parser;
pub mod record_parser;

#[cfg(test)]
mod tests;

pub use importer::{
    ImportStudentsRequest, ImportedStudent, RosterImportSummary, RosterImporter, StudentAction,
};
pub use parser::{RosterParseReport, RosterWorkbookParser};
