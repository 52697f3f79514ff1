//! Pre-filled grade sheet templates
//!
//! Builds the header and one row per student of a class for a subject, with
//! existing grades filled in on request, and renders it as an `.xlsx`
//! workbook that the grade import accepts unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::{debug, info};

use crate::app::models::{ComponentGrades, GradeComponent};
use crate::app::services::repositories::{
    ClassRepository, NoteRepository, StudentRepository, SubjectRepository,
};
use crate::constants::{TEMPLATE_SAMPLE_ROWS, columns};
use crate::{Error, Result};

const WORKSHEET_NAME: &str = "Notes";

/// Sample row cell positions in [`TEMPLATE_SAMPLE_ROWS`]
const SAMPLE_EMAIL: usize = 3;
const SAMPLE_TP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TemplateRequest {
    pub subject_id: i64,
    pub class_id: i64,
    pub include_existing_notes: bool,
    pub include_student_emails: bool,
}

impl TemplateRequest {
    pub fn new(subject_id: i64, class_id: i64) -> Self {
        Self {
            subject_id,
            class_id,
            ..Self::default()
        }
    }

    pub fn with_existing_notes(mut self, include: bool) -> Self {
        self.include_existing_notes = include;
        self
    }

    pub fn with_student_emails(mut self, include: bool) -> Self {
        self.include_student_emails = include;
        self
    }
}

/// One student line of a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateStudentRow {
    pub firstname: String,
    pub lastname: String,
    pub numero: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub grades: ComponentGrades,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateData {
    pub filename: String,
    pub headers: Vec<String>,
    /// Example rows matching `headers`
    pub sample_data: Vec<Vec<String>>,
    pub students: Vec<TemplateStudentRow>,
    pub has_tp_component: bool,
    pub subject_name: String,
    pub class_name: String,
}

/// Cell value written to the workbook
#[derive(Debug, Clone, PartialEq)]
enum TemplateCell {
    Text(String),
    Number(f64),
    Empty,
}

impl TemplateData {
    fn includes_email(&self) -> bool {
        self.headers.iter().any(|h| h == columns::EMAIL)
    }

    fn student_cells(&self, student: &TemplateStudentRow) -> Vec<TemplateCell> {
        let mut cells = vec![
            TemplateCell::Text(student.firstname.clone()),
            TemplateCell::Text(student.lastname.clone()),
            TemplateCell::Text(student.numero.clone()),
        ];
        if self.includes_email() {
            cells.push(
                student
                    .email
                    .clone()
                    .map_or(TemplateCell::Empty, TemplateCell::Text),
            );
        }
        for component in self.components() {
            cells.push(
                student
                    .grades
                    .get(component)
                    .map_or(TemplateCell::Empty, TemplateCell::Number),
            );
        }
        cells
    }

    fn components(&self) -> Vec<GradeComponent> {
        GradeComponent::ALL
            .into_iter()
            .filter(|c| *c != GradeComponent::Tp || self.has_tp_component)
            .collect()
    }

    /// Render the header and student rows as a single-sheet workbook
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(WORKSHEET_NAME)?;

        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
            worksheet.set_column_width(col as u16, 18)?;
        }

        for (index, student) in self.students.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in self.student_cells(student).into_iter().enumerate() {
                match cell {
                    TemplateCell::Text(text) => {
                        worksheet.write_string(row, col as u16, text)?;
                    }
                    TemplateCell::Number(value) => {
                        worksheet.write_number(row, col as u16, value)?;
                    }
                    TemplateCell::Empty => {}
                }
            }
        }

        let buffer = workbook.save_to_buffer()?;
        debug!(
            "Rendered template '{}' ({} bytes, {} students)",
            self.filename,
            buffer.len(),
            self.students.len()
        );
        Ok(buffer)
    }
}

/// Builds grade sheet templates from the repositories
pub struct TemplateGenerator {
    students: Arc<dyn StudentRepository>,
    notes: Arc<dyn NoteRepository>,
    subjects: Arc<dyn SubjectRepository>,
    classes: Arc<dyn ClassRepository>,
    today: NaiveDate,
}

impl TemplateGenerator {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        notes: Arc<dyn NoteRepository>,
        subjects: Arc<dyn SubjectRepository>,
        classes: Arc<dyn ClassRepository>,
    ) -> Self {
        Self {
            students,
            notes,
            subjects,
            classes,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: StudentRepository + NoteRepository + SubjectRepository + ClassRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Date stamped into the file name
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn generate(&self, request: &TemplateRequest) -> Result<TemplateData> {
        let subject = self
            .subjects
            .find_subject(request.subject_id)
            .await?
            .ok_or_else(|| Error::subject_not_found(request.subject_id))?;
        let class = self
            .classes
            .find_class(request.class_id)
            .await?
            .ok_or_else(|| Error::class_not_found(request.class_id))?;
        let note_config = self
            .subjects
            .get_note_config(subject.id)
            .await?
            .ok_or_else(|| Error::note_config_not_found(subject.id))?;
        let has_tp = note_config.has_tp_component();

        let mut headers = vec![
            columns::FIRSTNAME.to_string(),
            columns::LASTNAME.to_string(),
            columns::STUDENT_NUMBER.to_string(),
        ];
        if request.include_student_emails {
            headers.push(columns::EMAIL.to_string());
        }
        headers.extend(
            GradeComponent::ALL
                .into_iter()
                .filter(|c| *c != GradeComponent::Tp || has_tp)
                .map(|c| c.label().to_string()),
        );

        let existing: HashMap<i64, ComponentGrades> = if request.include_existing_notes {
            self.notes
                .find_by_subject(subject.id)
                .await?
                .into_iter()
                .map(|note| (note.student_id, note.grades))
                .collect()
        } else {
            HashMap::new()
        };

        let mut students = Vec::new();
        for student in self.students.find_by_class(class.id).await? {
            let grades = existing.get(&student.id).copied().unwrap_or_default();
            students.push(TemplateStudentRow {
                email: request
                    .include_student_emails
                    .then(|| student.email.clone()),
                firstname: student.firstname,
                lastname: student.lastname,
                numero: student.numero,
                grades: if has_tp {
                    grades
                } else {
                    ComponentGrades::new(grades.note_cc, None, grades.note_dv)
                },
            });
        }

        let sample_data = TEMPLATE_SAMPLE_ROWS
            .iter()
            .map(|sample| {
                sample
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != SAMPLE_EMAIL || request.include_student_emails)
                    .filter(|(i, _)| *i != SAMPLE_TP || has_tp)
                    .map(|(_, cell)| cell.to_string())
                    .collect()
            })
            .collect();

        let filename = format!(
            "notes_import_{}_{}_{}.xlsx",
            subject.name,
            class.name,
            self.today.format("%Y-%m-%d")
        );
        info!(
            "Generated template {} with {} students",
            filename,
            students.len()
        );

        Ok(TemplateData {
            filename,
            headers,
            sample_data,
            students,
            has_tp_component: has_tp,
            subject_name: subject.name,
            class_name: class.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{ClassInfo, Note, NoteConfig, Student, Subject};
    use crate::app::services::repositories::{InMemoryStore, SchoolData};
    use crate::app::services::spreadsheet::SpreadsheetReader;
    use crate::config::ImportConfig;

    fn create_store() -> Arc<InMemoryStore> {
        let student = |id: i64, numero: &str| Student {
            id,
            firstname: format!("Prenom{}", id),
            lastname: format!("Nom{}", id),
            email: format!("student{}@esprit.tn", id),
            numero: numero.to_string(),
            class_id: Some(1),
            birth_date: None,
        };
        Arc::new(InMemoryStore::new(SchoolData {
            classes: vec![ClassInfo {
                id: 1,
                name: "3A".into(),
            }],
            subjects: vec![
                Subject {
                    id: 1,
                    name: "Algo".into(),
                    note_config: Some(NoteConfig::new(40.0, 0.0, 60.0).unwrap()),
                },
                Subject {
                    id: 2,
                    name: "Reseaux".into(),
                    note_config: Some(NoteConfig::new(30.0, 30.0, 40.0).unwrap()),
                },
            ],
            students: vec![student(1, "2021000001"), student(2, "2021000002")],
            notes: vec![Note {
                id: 1,
                student_id: 1,
                subject_id: 2,
                teacher_id: None,
                grades: ComponentGrades::new(Some(12.0), Some(14.0), Some(15.0)),
                note_finale: Some(13.8),
            }],
        }))
    }

    fn generator() -> TemplateGenerator {
        TemplateGenerator::with_store(create_store())
            .with_today(NaiveDate::from_ymd_opt(2025, 10, 3).unwrap())
    }

    #[tokio::test]
    async fn test_headers_follow_subject_configuration() {
        let without_tp = generator()
            .generate(&TemplateRequest::new(1, 1))
            .await
            .unwrap();
        assert_eq!(
            without_tp.headers,
            vec!["prenom", "nom", "numeroetudiant", "noteCC", "noteDV"]
        );
        assert_eq!(
            without_tp.sample_data[0],
            vec!["Ahmed", "Ben Ali", "2021001234", "15.5", "16.0"]
        );
        assert_eq!(without_tp.filename, "notes_import_Algo_3A_2025-10-03.xlsx");

        let with_tp = generator()
            .generate(&TemplateRequest::new(2, 1).with_student_emails(true))
            .await
            .unwrap();
        assert_eq!(
            with_tp.headers,
            vec!["prenom", "nom", "numeroetudiant", "email", "noteCC", "noteTP", "noteDV"]
        );
        assert_eq!(with_tp.sample_data[1].len(), 7);
        assert_eq!(
            with_tp.students[0].email.as_deref(),
            Some("student1@esprit.tn")
        );
    }

    #[tokio::test]
    async fn test_existing_notes_are_filled_on_request() {
        let request = TemplateRequest::new(2, 1);

        let blank = generator().generate(&request).await.unwrap();
        assert!(blank.students.iter().all(|s| s.grades.is_empty()));

        let filled = generator()
            .generate(&request.with_existing_notes(true))
            .await
            .unwrap();
        assert_eq!(
            filled.students[0].grades,
            ComponentGrades::new(Some(12.0), Some(14.0), Some(15.0))
        );
        assert!(filled.students[1].grades.is_empty());
    }

    #[tokio::test]
    async fn test_missing_context_is_an_error() {
        let result = generator().generate(&TemplateRequest::new(1, 9)).await;
        assert!(matches!(result, Err(Error::ClassNotFound { class_id: 9 })));

        let result = generator().generate(&TemplateRequest::new(9, 1)).await;
        assert!(matches!(result, Err(Error::SubjectNotFound { subject_id: 9 })));
    }

    #[tokio::test]
    async fn test_workbook_reads_back_through_the_importer_reader() {
        let template = generator()
            .generate(&TemplateRequest::new(2, 1).with_existing_notes(true))
            .await
            .unwrap();
        let buffer = template.to_xlsx().unwrap();

        let sheet = SpreadsheetReader::new(&ImportConfig::default())
            .read(&buffer)
            .unwrap();
        assert_eq!(sheet.sheet_name, "Notes");
        assert_eq!(sheet.headers, template.headers);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get(3), Some("12"));
        assert_eq!(sheet.rows[1].get(2), Some("2021000002"));
    }
}
