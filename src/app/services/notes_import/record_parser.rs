//! Grade row validation
//!
//! Turns one [`RawRow`] into a [`Candidate`] or a set of row-scoped errors.
//! Every problem on the row is collected, not just the first.

use tracing::trace;

use crate::app::models::{
    Candidate, ComponentGrades, Field, GradeComponent, RowOutcome, RowWarningKind,
};
use crate::app::services::spreadsheet::HeaderMap;
use crate::app::services::spreadsheet::RawRow;
use crate::app::services::spreadsheet::field_parsers::{
    get_optional_field, get_required_field, parse_email, parse_grade, parse_student_number,
};
use crate::constants::columns;

/// Validate one grade row
///
/// Missing names or student number, malformed identifiers and unusable grade
/// cells are errors. Rounded grades and a row without any grade are warnings
/// only; such rows still produce a candidate.
pub fn parse_note_row(row: &RawRow, mapping: &HeaderMap, current_year: i32) -> RowOutcome<Candidate> {
    let mut outcome = RowOutcome::new(row.row);

    let firstname = get_required_field(row, mapping, columns::FIRSTNAME, Field::Firstname, &mut outcome);
    let lastname = get_required_field(row, mapping, columns::LASTNAME, Field::Lastname, &mut outcome);
    let numero = get_required_field(
        row,
        mapping,
        columns::STUDENT_NUMBER,
        Field::StudentNumber,
        &mut outcome,
    )
    .and_then(|raw| match parse_student_number(raw, current_year) {
        Ok(number) => Some(number.into_inner()),
        Err(kind) => {
            outcome.error(kind);
            None
        }
    });

    let email = get_optional_field(row, mapping, columns::EMAIL).and_then(|raw| {
        match parse_email(raw) {
            Ok(email) => Some(email.into_inner()),
            Err(kind) => {
                outcome.error(kind);
                None
            }
        }
    });

    let mut grades = ComponentGrades::default();
    for component in GradeComponent::ALL {
        let Some(raw) = get_optional_field(row, mapping, component.column()) else {
            continue;
        };
        match parse_grade(raw, component) {
            Ok(parsed) => {
                if let Some(original) = parsed.rounded_from {
                    outcome.warn(RowWarningKind::Rounded {
                        field: component,
                        original,
                        rounded: parsed.value,
                    });
                }
                grades.set(component, Some(parsed.value));
            }
            Err(kind) => outcome.error(kind),
        }
    }

    if !outcome.errors.is_empty() {
        trace!("Row {} rejected with {} errors", row.row, outcome.errors.len());
        return outcome;
    }

    let (Some(firstname), Some(lastname), Some(numero)) = (firstname, lastname, numero) else {
        return outcome;
    };

    let candidate = Candidate {
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        numero,
        email,
        grades,
    };

    if !candidate.has_any_grade() {
        outcome.warn(RowWarningKind::NoNotes {
            student: candidate.full_name(),
        });
    }

    outcome.record = Some(candidate);
    outcome
}
