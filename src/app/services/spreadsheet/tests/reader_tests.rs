//! Tests for workbook and CSV decoding

use super::*;
use crate::Error;
use crate::app::models::StructuralError;
use crate::app::services::spreadsheet::{SheetFormat, SpreadsheetReader};
use crate::config::ImportConfig;

fn reader() -> SpreadsheetReader {
    SpreadsheetReader::new(&ImportConfig::default())
}

fn structural(result: crate::Result<crate::app::services::spreadsheet::RawSheet>) -> Vec<StructuralError> {
    match result {
        Err(Error::Structural { errors }) => errors,
        other => panic!("expected structural error, got {:?}", other),
    }
}

#[test]
fn test_format_detection() {
    let xlsx = create_test_xlsx(&[vec!["a"]], false);
    assert_eq!(SheetFormat::detect(&xlsx), SheetFormat::OpenXml);
    assert_eq!(
        SheetFormat::detect(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0x00]),
        SheetFormat::Legacy
    );
    assert_eq!(SheetFormat::detect(b"prenom,nom"), SheetFormat::Delimited);
}

#[test]
fn test_read_xlsx_rows_and_numbers() {
    let buffer = create_notes_xlsx(&[valid_notes_row("2021001234")]);
    let sheet = reader().read(&buffer).unwrap();

    assert_eq!(sheet.format, SheetFormat::OpenXml);
    assert_eq!(sheet.headers[2], "numeroEtudiant");
    assert_eq!(sheet.rows.len(), 1);

    let row = &sheet.rows[0];
    assert_eq!(row.row, 2);
    // Numeric cells keep their digits and drop a zero fraction
    assert_eq!(row.get(2), Some("2021001234"));
    assert_eq!(row.get(4), Some("15.5"));
    assert_eq!(row.get(5), Some("14"));
}

/// Blank rows are skipped but later rows keep their sheet row number
#[test]
fn test_blank_rows_are_dropped() {
    let buffer = create_test_xlsx(
        &[
            NOTES_HEADER.to_vec(),
            valid_notes_row("2021000001"),
            vec![],
            valid_notes_row("2021000002"),
        ],
        true,
    );
    let sheet = reader().read(&buffer).unwrap();

    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(sheet.rows[0].row, 2);
    assert_eq!(sheet.rows[1].row, 4);
}

#[test]
fn test_empty_buffer_is_empty_file() {
    assert_eq!(structural(reader().read(&[])), vec![StructuralError::EmptyFile]);
}

#[test]
fn test_empty_worksheet_is_empty_file() {
    let buffer = create_test_xlsx(&[], false);
    assert_eq!(structural(reader().read(&buffer)), vec![StructuralError::EmptyFile]);
}

#[test]
fn test_header_only_has_no_data_rows() {
    let buffer = create_test_xlsx(&[NOTES_HEADER.to_vec()], false);
    assert_eq!(structural(reader().read(&buffer)), vec![StructuralError::NoDataRows]);
}

#[test]
fn test_too_many_rows() {
    let reader = SpreadsheetReader::new(&ImportConfig::default().with_max_rows(2));
    let buffer = create_notes_xlsx(&[
        valid_notes_row("2021000001"),
        valid_notes_row("2021000002"),
        valid_notes_row("2021000003"),
    ]);

    assert_eq!(
        structural(reader.read(&buffer)),
        vec![StructuralError::TooManyRows { found: 3, max: 2 }]
    );
}

#[test]
fn test_file_too_large() {
    let reader = SpreadsheetReader::new(&ImportConfig::default().with_max_file_size_bytes(8));
    let errors = structural(reader.read(b"prenom,nom,numeroetudiant"));
    assert!(matches!(errors[0], StructuralError::FileTooLarge { max: 8, .. }));
}

#[test]
fn test_corrupt_workbook_is_workbook_error() {
    let mut buffer = b"PK\x03\x04".to_vec();
    buffer.extend_from_slice(&[0u8; 64]);
    assert!(matches!(reader().read(&buffer), Err(Error::Workbook { .. })));
}

#[test]
fn test_non_utf8_text_is_rejected() {
    let buffer = [0xFFu8, 0xFE, 0x00, 0x41, 0x80];
    assert!(matches!(reader().read(&buffer), Err(Error::Workbook { .. })));
}

#[test]
fn test_read_csv_with_comma_delimiter() {
    let csv = "prenom,nom,numeroEtudiant,noteCC\nAhmed,Ben Ali,2021001234,15.5\n";
    let sheet = reader().read(csv.as_bytes()).unwrap();

    assert_eq!(sheet.format, SheetFormat::Delimited);
    assert_eq!(sheet.headers.len(), 4);
    assert_eq!(sheet.rows[0].row, 2);
    assert_eq!(sheet.rows[0].get(3), Some("15.5"));
}

/// Semicolon exports keep comma decimals intact
#[test]
fn test_read_csv_with_semicolon_delimiter_and_bom() {
    let csv = "\u{feff}prenom;nom;numeroEtudiant;noteCC\nAhmed;Ben Ali;2021001234;15,5\n\n";
    let sheet = reader().read(csv.as_bytes()).unwrap();

    assert_eq!(sheet.headers[0], "prenom");
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0].get(3), Some("15,5"));
}

#[test]
fn test_cell_to_string_variants() {
    use crate::app::services::spreadsheet::reader::cell_to_string;
    use calamine::Data;

    assert_eq!(cell_to_string(&Data::Empty), "");
    assert_eq!(cell_to_string(&Data::Float(16.0)), "16");
    assert_eq!(cell_to_string(&Data::Float(15.75)), "15.75");
    assert_eq!(cell_to_string(&Data::Int(12)), "12");
    assert_eq!(cell_to_string(&Data::Bool(true)), "true");
    assert_eq!(cell_to_string(&Data::String(" x ".into())), " x ");
}
