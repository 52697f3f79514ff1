//! In-memory repositories over a JSON snapshot

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    ClassRepository, NewNote, NewStudent, NoteRepository, NoteWrite, StudentRepository,
    StudentWrite, SubjectRepository,
};
use crate::app::models::{ClassInfo, Note, Student, Subject};
use crate::{Error, Result};

/// Everything the import pipeline reads or writes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolData {
    pub classes: Vec<ClassInfo>,
    pub subjects: Vec<Subject>,
    pub students: Vec<Student>,
    pub notes: Vec<Note>,
}

impl SchoolData {
    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
        let data: Self = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} students, {} subjects, {} notes from {}",
            data.students.len(),
            data.subjects.len(),
            data.notes.len(),
            path.display()
        );
        Ok(data)
    }

    /// Write the snapshot as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))
    }

    fn next_student_id(&self) -> i64 {
        self.students.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    fn next_note_id(&self) -> i64 {
        self.notes.iter().map(|n| n.id).max().unwrap_or(0) + 1
    }
}

/// Repository implementation holding a [`SchoolData`] behind a lock
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<SchoolData>,
}

impl InMemoryStore {
    pub fn new(data: SchoolData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SchoolData {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl StudentRepository for InMemoryStore {
    async fn find_by_number(&self, numero: &str) -> Result<Option<Student>> {
        let key = numero.trim().to_lowercase();
        let data = self.data.read().await;
        Ok(data
            .students
            .iter()
            .find(|s| s.numero.to_lowercase() == key)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        let key = email.trim().to_lowercase();
        let data = self.data.read().await;
        Ok(data
            .students
            .iter()
            .find(|s| s.email.to_lowercase() == key)
            .cloned())
    }

    async fn find_by_class(&self, class_id: i64) -> Result<Vec<Student>> {
        let data = self.data.read().await;
        Ok(data
            .students
            .iter()
            .filter(|s| s.is_in_class(class_id))
            .cloned()
            .collect())
    }

    async fn save_batch(&self, writes: Vec<StudentWrite>) -> Result<Vec<Student>> {
        let mut data = self.data.write().await;

        // Check every update target before touching anything
        for write in &writes {
            if let StudentWrite::Update(student) = write {
                if !data.students.iter().any(|s| s.id == student.id) {
                    return Err(Error::repository(format!(
                        "Student {} does not exist",
                        student.id
                    )));
                }
            }
        }

        let mut saved = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                StudentWrite::Create(new_student) => {
                    let student = student_from_new(data.next_student_id(), new_student);
                    data.students.push(student.clone());
                    saved.push(student);
                }
                StudentWrite::Update(student) => {
                    if let Some(existing) = data.students.iter_mut().find(|s| s.id == student.id) {
                        *existing = student.clone();
                    }
                    saved.push(student);
                }
            }
        }
        Ok(saved)
    }
}

fn student_from_new(id: i64, new_student: NewStudent) -> Student {
    Student {
        id,
        firstname: new_student.firstname,
        lastname: new_student.lastname,
        email: new_student.email,
        numero: new_student.numero,
        class_id: new_student.class_id,
        birth_date: new_student.birth_date,
    }
}

fn note_from_new(id: i64, new_note: NewNote) -> Note {
    Note {
        id,
        student_id: new_note.student_id,
        subject_id: new_note.subject_id,
        teacher_id: new_note.teacher_id,
        grades: new_note.grades,
        note_finale: new_note.note_finale,
    }
}

#[async_trait]
impl NoteRepository for InMemoryStore {
    async fn find_by_student_and_subject(
        &self,
        student_id: i64,
        subject_id: i64,
    ) -> Result<Option<Note>> {
        let data = self.data.read().await;
        Ok(data
            .notes
            .iter()
            .find(|n| n.student_id == student_id && n.subject_id == subject_id)
            .cloned())
    }

    async fn find_by_subject(&self, subject_id: i64) -> Result<Vec<Note>> {
        let data = self.data.read().await;
        Ok(data
            .notes
            .iter()
            .filter(|n| n.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        let mut data = self.data.write().await;
        let note = note_from_new(data.next_note_id(), note);
        data.notes.push(note.clone());
        Ok(note)
    }

    async fn update(&self, note: Note) -> Result<Note> {
        let mut data = self.data.write().await;
        let existing = data
            .notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or_else(|| Error::repository(format!("Note {} does not exist", note.id)))?;
        *existing = note.clone();
        Ok(note)
    }

    async fn save_batch(&self, writes: Vec<NoteWrite>) -> Result<Vec<Note>> {
        let mut data = self.data.write().await;

        for write in &writes {
            if let NoteWrite::Update(note) = write {
                if !data.notes.iter().any(|n| n.id == note.id) {
                    return Err(Error::repository(format!("Note {} does not exist", note.id)));
                }
            }
        }

        let mut saved = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                NoteWrite::Create(new_note) => {
                    let note = note_from_new(data.next_note_id(), new_note);
                    data.notes.push(note.clone());
                    saved.push(note);
                }
                NoteWrite::Update(note) => {
                    if let Some(existing) = data.notes.iter_mut().find(|n| n.id == note.id) {
                        *existing = note.clone();
                    }
                    saved.push(note);
                }
            }
        }
        Ok(saved)
    }
}

#[async_trait]
impl SubjectRepository for InMemoryStore {
    async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        let data = self.data.read().await;
        Ok(data.subjects.iter().find(|s| s.id == subject_id).cloned())
    }
}

#[async_trait]
impl ClassRepository for InMemoryStore {
    async fn find_class(&self, class_id: i64) -> Result<Option<ClassInfo>> {
        let data = self.data.read().await;
        Ok(data.classes.iter().find(|c| c.id == class_id).cloned())
    }
}
