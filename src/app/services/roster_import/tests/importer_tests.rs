//! Tests for the end-to-end roster import

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::Error;
use crate::app::services::roster_import::{ImportStudentsRequest, StudentAction};

#[tokio::test]
async fn test_new_students_are_created_in_the_class() {
    let store = create_store();
    let importer = create_importer(store.clone(), ImportConfig::default());
    let buffer = create_roster_xlsx(&[
        vec!["Fatima", "Zahra", "Fatima.Zahra@esprit.tn", "2022DEF456", "2003-02-10"],
        vec!["Youssef", "Trabelsi", "youssef.t@esprit.tn", "2022GHI789", ""],
    ]);

    let summary = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_B))
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(
        summary.message,
        "Import completed successfully. 2 students imported."
    );
    assert_eq!(summary.imported_students[0].email, "fatima.zahra@esprit.tn");
    assert_eq!(summary.imported_students[0].action, StudentAction::Created);

    let students = store.snapshot().await.students;
    assert_eq!(students.len(), 3);
    assert!(students[1..].iter().all(|s| s.class_id == Some(CLASS_B)));
    assert_eq!(students[1].birth_date, NaiveDate::from_ymd_opt(2003, 2, 10));
}

#[tokio::test]
async fn test_existing_student_is_skipped_without_overwrite() {
    let store = create_store();
    let importer = create_importer(store.clone(), ImportConfig::default());
    // Same number as the enrolled student, different email
    let buffer = create_roster_xlsx(&[vec![
        "Ahmed",
        "Ben Ali",
        "other@esprit.tn",
        "2021abc123",
        "",
    ]]);

    let summary = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_B))
        .await
        .unwrap();

    assert!(!summary.success);
    assert_eq!(summary.skipped_duplicates, 1);
    assert_eq!(
        summary.warnings,
        vec!["Row 2: Skipped duplicate: Ahmed Ben Ali".to_string()]
    );
    assert_eq!(
        summary.message,
        "Import failed. No students were imported. 0 failed, 1 skipped."
    );
    assert_eq!(store.snapshot().await.students[0].class_id, Some(CLASS_A));
}

#[tokio::test]
async fn test_overwrite_moves_student_and_keeps_birth_date() {
    let store = create_store();
    let importer = create_importer(store.clone(), ImportConfig::default());
    let buffer = create_roster_xlsx(&[vec![
        "Ahmed",
        "Ben Ali Jr",
        "ahmed.benali@esprit.tn",
        "2021ABC123",
        "",
    ]]);

    let summary = importer
        .execute(
            &buffer,
            &ImportStudentsRequest::new(CLASS_B).with_overwrite(true),
        )
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.imported_students[0].id, 1);
    assert_eq!(summary.imported_students[0].action, StudentAction::Updated);

    let students = store.snapshot().await.students;
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].lastname, "Ben Ali Jr");
    assert_eq!(students[0].class_id, Some(CLASS_B));
    assert_eq!(students[0].birth_date, NaiveDate::from_ymd_opt(2002, 5, 4));
}

#[tokio::test]
async fn test_repeated_rows_within_the_sheet_are_skipped() {
    let store = create_store();
    let importer = create_importer(store.clone(), ImportConfig::default());
    let buffer = create_roster_xlsx(&[
        vec!["Fatima", "Zahra", "fatima@esprit.tn", "2022DEF456", ""],
        vec!["Fatima", "Zahra", "FATIMA@esprit.tn", "2022XYZ000", ""],
    ]);

    let summary = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_A))
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped_duplicates, 1);
    assert_eq!(
        summary.message,
        "Import completed successfully. 1 students imported. 1 duplicates skipped."
    );
}

#[tokio::test]
async fn test_invalid_rows_are_reported_and_others_imported() {
    let store = create_store();
    let importer = create_importer(store.clone(), ImportConfig::default());
    let buffer = create_roster_xlsx(&[
        vec!["Fatima", "Zahra", "not-an-email", "2022DEF456", ""],
        vec!["Youssef", "Trabelsi", "youssef.t@esprit.tn", "2022GHI789", "2050-01-01"],
        vec!["Sana", "Mejri", "sana.m@esprit.tn", "2022JKL012", "12/11/2004"],
    ]);

    let summary = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_A))
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.valid_rows, 1);
    assert_eq!(summary.successful_imports, 1);
    assert_eq!(summary.failed_imports, 2);
    assert!(summary.errors[0].starts_with("Row 2: Invalid email 'not-an-email'"));
    assert!(summary.errors[1].starts_with("Row 3: Invalid birth date '2050-01-01'"));
    assert_eq!(
        summary.message,
        "Import completed successfully. 1 students imported. 2 failed."
    );
}

#[tokio::test]
async fn test_unknown_class_is_an_error() {
    let importer = create_importer(create_store(), ImportConfig::default());
    let buffer = create_roster_xlsx(&[vec!["A", "B", "a@b.tn", "2022DEF456", ""]]);

    let result = importer
        .execute(&buffer, &ImportStudentsRequest::new(42))
        .await;
    assert!(matches!(result, Err(Error::ClassNotFound { class_id: 42 })));
}

#[tokio::test]
async fn test_missing_email_column_is_structural() {
    let importer = create_importer(create_store(), ImportConfig::default());
    let buffer = create_test_xlsx(
        &[
            vec!["prenom", "nom", "numeroEtudiant"],
            vec!["A", "B", "2022DEF456"],
        ],
        false,
    );

    let error = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_A))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Invalid spreadsheet structure: Missing required column: email");
}

#[tokio::test]
async fn test_cancelled_roster_import_writes_nothing() {
    let store = create_store();
    let token = CancellationToken::new();
    token.cancel();
    let importer =
        create_importer(store.clone(), ImportConfig::default()).with_cancellation(token);
    let buffer = create_roster_xlsx(&[vec!["A", "B", "a@b.tn", "2022DEF456", ""]]);

    let summary = importer
        .execute(&buffer, &ImportStudentsRequest::new(CLASS_A))
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(
        summary.errors,
        vec!["Row 2: Not attempted: import was cancelled".to_string()]
    );
    assert_eq!(store.snapshot().await.students.len(), 1);
}
