//! Test utilities for grade imports
//!
//! Provides an in-memory school with two classes and three subjects, plus a
//! note repository wrapper that fails selected batches.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app::models::{ClassInfo, Note, NoteConfig, Student, Subject};
use crate::app::services::notes_import::NotesImporter;
use crate::app::services::repositories::{
    InMemoryStore, NewNote, NoteRepository, NoteWrite, SchoolData,
};
use crate::config::ImportConfig;
use crate::{Error, Result};

mod record_parser_tests;

/// Reference year for student number validation
pub const TEST_YEAR: i32 = 2025;

/// Subject weighted CC 40 / DV 60, no TP
pub const SUBJECT_NO_TP: i64 = 1;
/// Subject weighted CC 30 / TP 30 / DV 40
pub const SUBJECT_WITH_TP: i64 = 2;
/// Subject without a grading configuration
pub const SUBJECT_UNCONFIGURED: i64 = 3;

pub const CLASS_A: i64 = 1;
pub const CLASS_B: i64 = 2;

pub fn create_student(id: i64, numero: &str, class_id: i64) -> Student {
    Student {
        id,
        firstname: format!("Prenom{}", id),
        lastname: format!("Nom{}", id),
        email: format!("student{}@esprit.tn", id),
        numero: numero.to_string(),
        class_id: Some(class_id),
        birth_date: None,
    }
}

/// Student number of the n-th generated student
pub fn numero(n: usize) -> String {
    format!("2021{:06}", n)
}

/// School with `students` students in class A plus one student in class B
/// (`2023XYZ001`)
pub fn create_school_data(students: usize) -> SchoolData {
    let mut all: Vec<Student> = (1..=students)
        .map(|n| create_student(n as i64, &numero(n), CLASS_A))
        .collect();
    all.push(create_student(1000, "2023XYZ001", CLASS_B));

    SchoolData {
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
        subjects: vec![
            Subject {
                id: SUBJECT_NO_TP,
                name: "Algorithmique".into(),
                note_config: Some(NoteConfig::new(40.0, 0.0, 60.0).unwrap()),
            },
            Subject {
                id: SUBJECT_WITH_TP,
                name: "Reseaux".into(),
                note_config: Some(NoteConfig::with_tp(30.0, 30.0).unwrap()),
            },
            Subject {
                id: SUBJECT_UNCONFIGURED,
                name: "Projet".into(),
                note_config: None,
            },
        ],
        students: all,
        notes: Vec::new(),
    }
}

pub fn create_store(students: usize) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new(create_school_data(students)))
}

pub fn create_importer(store: Arc<InMemoryStore>, config: ImportConfig) -> NotesImporter {
    NotesImporter::with_store(store, config).with_current_year(TEST_YEAR)
}

/// Grade row for the n-th generated student
pub fn grade_row(n: usize, cc: &str, tp: &str, dv: &str) -> Vec<String> {
    vec![
        format!("Prenom{}", n),
        format!("Nom{}", n),
        numero(n),
        format!("student{}@esprit.tn", n),
        cc.to_string(),
        tp.to_string(),
        dv.to_string(),
    ]
}

/// Borrow owned rows as the `&str` rows the fixture builders take
pub fn as_str_rows(rows: &[Vec<String>]) -> Vec<Vec<&str>> {
    rows.iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect()
}

/// Note repository that fails `save_batch` on the given 1-based calls
pub struct FailingNoteStore {
    inner: Arc<InMemoryStore>,
    fail_on: Vec<usize>,
    calls: AtomicUsize,
}

impl FailingNoteStore {
    pub fn new(inner: Arc<InMemoryStore>, fail_on: Vec<usize>) -> Self {
        Self {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteRepository for FailingNoteStore {
    async fn find_by_student_and_subject(
        &self,
        student_id: i64,
        subject_id: i64,
    ) -> Result<Option<Note>> {
        self.inner
            .find_by_student_and_subject(student_id, subject_id)
            .await
    }

    async fn find_by_subject(&self, subject_id: i64) -> Result<Vec<Note>> {
        self.inner.find_by_subject(subject_id).await
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        self.inner.create(note).await
    }

    async fn update(&self, note: Note) -> Result<Note> {
        self.inner.update(note).await
    }

    async fn save_batch(&self, writes: Vec<NoteWrite>) -> Result<Vec<Note>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(Error::repository("database unavailable"));
        }
        NoteRepository::save_batch(self.inner.as_ref(), writes).await
    }
}
