//! Persistence collaborators used by the import pipeline
//!
//! The pipeline never talks to storage directly; it goes through these
//! narrow async traits. Transaction discipline belongs to the implementation:
//! `save_batch` is expected to apply a whole chunk or nothing.
//!
//! [`InMemoryStore`] implements every trait over a JSON-serializable
//! [`SchoolData`] snapshot and backs both the tests and the command-line tool.

pub mod in_memory;

pub use in_memory::{InMemoryStore, SchoolData};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::app::models::{ClassInfo, ComponentGrades, Note, NoteConfig, Student, Subject};

/// Student to be inserted; the repository assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub numero: String,
    pub class_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
}

/// Note to be inserted; the repository assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    pub student_id: i64,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub grades: ComponentGrades,
    pub note_finale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudentWrite {
    Create(NewStudent),
    Update(Student),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteWrite {
    Create(NewNote),
    Update(Note),
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Look up a student by number, ignoring case
    async fn find_by_number(&self, numero: &str) -> Result<Option<Student>>;

    /// Look up a student by email, ignoring case
    async fn find_by_email(&self, email: &str) -> Result<Option<Student>>;

    async fn find_by_class(&self, class_id: i64) -> Result<Vec<Student>>;

    /// Apply a chunk of writes; returns the stored students in write order
    async fn save_batch(&self, writes: Vec<StudentWrite>) -> Result<Vec<Student>>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn find_by_student_and_subject(
        &self,
        student_id: i64,
        subject_id: i64,
    ) -> Result<Option<Note>>;

    async fn find_by_subject(&self, subject_id: i64) -> Result<Vec<Note>>;

    async fn create(&self, note: NewNote) -> Result<Note>;

    async fn update(&self, note: Note) -> Result<Note>;

    /// Apply a chunk of writes; returns the stored notes in write order
    ///
    /// The default applies writes one by one and stops at the first failure;
    /// implementations with transactions should override it.
    async fn save_batch(&self, writes: Vec<NoteWrite>) -> Result<Vec<Note>> {
        let mut saved = Vec::with_capacity(writes.len());
        for write in writes {
            let note = match write {
                NoteWrite::Create(new_note) => self.create(new_note).await?,
                NoteWrite::Update(note) => self.update(note).await?,
            };
            saved.push(note);
        }
        Ok(saved)
    }
}

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>>;

    async fn get_note_config(&self, subject_id: i64) -> Result<Option<NoteConfig>> {
        Ok(self
            .find_subject(subject_id)
            .await?
            .and_then(|subject| subject.note_config))
    }
}

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn find_class(&self, class_id: i64) -> Result<Option<ClassInfo>>;
}
