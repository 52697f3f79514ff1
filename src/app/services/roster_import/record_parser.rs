//! Roster row validation

use chrono::{Datelike, NaiveDate};

use crate::app::models::{Field, RowErrorKind, RowOutcome, StudentCandidate};
use crate::app::services::spreadsheet::field_parsers::{
    get_optional_field, get_required_field, parse_birth_date, parse_email, parse_student_number,
};
use crate::app::services::spreadsheet::{HeaderMap, RawRow};
use crate::constants::columns;

/// Validate one roster row; `today` anchors the birth date and student
/// number year ranges
pub fn parse_student_row(
    row: &RawRow,
    mapping: &HeaderMap,
    today: NaiveDate,
) -> RowOutcome<StudentCandidate> {
    let mut outcome = RowOutcome::new(row.row);

    let firstname =
        get_required_field(row, mapping, columns::FIRSTNAME, Field::Firstname, &mut outcome);
    let lastname = get_required_field(row, mapping, columns::LASTNAME, Field::Lastname, &mut outcome);
    let email = get_required_field(row, mapping, columns::EMAIL, Field::Email, &mut outcome)
        .and_then(|raw| parse_email(raw).map_err(|kind| outcome.error(kind)).ok());
    let numero = get_required_field(
        row,
        mapping,
        columns::STUDENT_NUMBER,
        Field::StudentNumber,
        &mut outcome,
    )
    .and_then(|raw| {
        parse_student_number(raw, today.year())
            .map_err(|kind| outcome.error(kind))
            .ok()
    });
    let birth_date = get_optional_field(row, mapping, columns::BIRTH_DATE)
        .and_then(|raw| parse_birth_date(raw, today).map_err(|kind| outcome.error(kind)).ok());

    if let (true, Some(firstname), Some(lastname), Some(email), Some(numero)) = (
        outcome.errors.is_empty(),
        firstname,
        lastname,
        email,
        numero,
    ) {
        outcome.record = Some(StudentCandidate {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email: email.into_inner(),
            numero: numero.into_inner(),
            birth_date,
        });
    }
    outcome
}
