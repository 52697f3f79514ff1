//! Tests for grade row validation

use super::TEST_YEAR;
use crate::app::models::{Field, GradeComponent, RowErrorKind, RowWarningKind};
use crate::app::services::notes_import::record_parser::parse_note_row;
use crate::app::services::spreadsheet::HeaderMap;
use crate::app::services::spreadsheet::tests::{NOTES_HEADER, create_raw_row, headers};

fn mapping() -> HeaderMap {
    HeaderMap::analyze(&headers(NOTES_HEADER))
}

#[test]
fn test_valid_row_produces_candidate() {
    let row = create_raw_row(
        2,
        &["Ahmed", "Ben Ali", "2021ABC123", "Ahmed.BenAli@Esprit.tn", "15.5", "", "16"],
    );
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert!(outcome.success());
    assert!(outcome.warnings.is_empty());
    let candidate = outcome.record.unwrap();
    assert_eq!(candidate.numero, "2021ABC123");
    assert_eq!(candidate.email.as_deref(), Some("ahmed.benali@esprit.tn"));
    assert_eq!(candidate.grade(GradeComponent::Cc), Some(15.5));
    assert_eq!(candidate.grade(GradeComponent::Tp), None);
    assert_eq!(candidate.grade(GradeComponent::Dv), Some(16.0));
}

#[test]
fn test_comma_decimal_is_accepted() {
    let row = create_raw_row(3, &["Ahmed", "Ben Ali", "2021ABC123", "", "15,5", "", ""]);
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert_eq!(outcome.record.unwrap().grades.note_cc, Some(15.5));
}

#[test]
fn test_every_problem_on_the_row_is_reported() {
    let row = create_raw_row(4, &["", "  ", "2021ABC123", "not-an-email", "21", "abc", ""]);
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert!(!outcome.success());
    assert!(outcome.record.is_none());
    let kinds: Vec<_> = outcome.errors.iter().map(|e| &e.kind).collect();
    assert_eq!(kinds.len(), 5);
    assert_eq!(kinds[0], &RowErrorKind::MissingField(Field::Firstname));
    assert_eq!(kinds[1], &RowErrorKind::MissingField(Field::Lastname));
    assert!(matches!(kinds[2], RowErrorKind::InvalidEmail { .. }));
    assert_eq!(
        outcome.errors[3].to_string(),
        "Row 4: noteCC value '21' is out of range (0-20)"
    );
    assert_eq!(
        outcome.errors[4].to_string(),
        "Row 4: Invalid noteTP value 'abc' - must be a number"
    );
}

#[test]
fn test_invalid_student_number_is_an_error() {
    let row = create_raw_row(2, &["Ahmed", "Ben Ali", "ABC", "", "12", "", "12"]);
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert!(matches!(
        outcome.errors[0].kind,
        RowErrorKind::InvalidStudentNumber { .. }
    ));
}

#[test]
fn test_row_without_grades_only_warns() {
    let row = create_raw_row(7, &["Ahmed", "Ben Ali", "2021ABC123"]);
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert!(outcome.success());
    assert_eq!(
        outcome.warnings[0].kind,
        RowWarningKind::NoNotes {
            student: "Ahmed Ben Ali".into()
        }
    );
    assert_eq!(
        outcome.warnings[0].to_string(),
        "Row 7: No notes provided for student Ahmed Ben Ali"
    );
}

#[test]
fn test_rounding_is_reported_as_warning() {
    let row = create_raw_row(2, &["Ahmed", "Ben Ali", "2021ABC123", "", "12.346", "", "14"]);
    let outcome = parse_note_row(&row, &mapping(), TEST_YEAR);

    assert!(outcome.success());
    assert_eq!(outcome.record.as_ref().unwrap().grades.note_cc, Some(12.35));
    assert!(matches!(
        outcome.warnings[0].kind,
        RowWarningKind::Rounded {
            field: GradeComponent::Cc,
            ..
        }
    ));
}
