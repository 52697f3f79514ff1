//! Test utilities for roster imports

use chrono::NaiveDate;
use std::sync::Arc;

use crate::app::models::{ClassInfo, Student};
use crate::app::services::repositories::{InMemoryStore, SchoolData};
use crate::app::services::roster_import::RosterImporter;
use crate::app::services::spreadsheet::tests::create_test_xlsx;
use crate::config::ImportConfig;

mod importer_tests;

pub const ROSTER_HEADER: &[&str] = &["prenom", "nom", "email", "numeroEtudiant", "dateNaissance"];

pub const CLASS_A: i64 = 1;
pub const CLASS_B: i64 = 2;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

/// School with two classes and one enrolled student in class A
pub fn create_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new(SchoolData {
        classes: vec![
            ClassInfo {
                id: CLASS_A,
                name: "3A".into(),
            },
            ClassInfo {
                id: CLASS_B,
                name: "3B".into(),
            },
        ],
        students: vec![Student {
            id: 1,
            firstname: "Ahmed".into(),
            lastname: "Ben Ali".into(),
            email: "ahmed.benali@esprit.tn".into(),
            numero: "2021ABC123".into(),
            class_id: Some(CLASS_A),
            birth_date: NaiveDate::from_ymd_opt(2002, 5, 4),
        }],
        ..SchoolData::default()
    }))
}

pub fn create_importer(store: Arc<InMemoryStore>, config: ImportConfig) -> RosterImporter {
    RosterImporter::with_store(store, config).with_today(today())
}

/// Roster sheet with the standard header followed by `rows`
pub fn create_roster_xlsx(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut all = vec![ROSTER_HEADER.to_vec()];
    all.extend(rows.iter().cloned());
    create_test_xlsx(&all, false)
}
