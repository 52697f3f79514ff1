//! Test utilities for spreadsheet decoding
//!
//! Workbook fixtures are generated in memory with rust_xlsxwriter so every
//! test exercises the real calamine decoding path.

use rust_xlsxwriter::Workbook;

use crate::app::services::spreadsheet::RawRow;

mod reader_tests;

/// Standard grade sheet header
pub const NOTES_HEADER: &[&str] = &["prenom", "nom", "numeroEtudiant", "email", "noteCC", "noteTP", "noteDV"];

/// Build an `.xlsx` buffer; cells that parse as numbers are written as
/// numeric cells when `numeric` is set, everything else as text
pub fn create_test_xlsx(rows: &[Vec<&str>], numeric: bool) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (row_index, row) in rows.iter().enumerate() {
        for (col_index, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let (r, c) = (row_index as u32, col_index as u16);
            match value.parse::<f64>() {
                Ok(number) if numeric => {
                    worksheet.write_number(r, c, number).unwrap();
                }
                _ => {
                    worksheet.write_string(r, c, *value).unwrap();
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Grade sheet with the standard header followed by `rows`
pub fn create_notes_xlsx(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut all = vec![NOTES_HEADER.to_vec()];
    all.extend(rows.iter().cloned());
    create_test_xlsx(&all, true)
}

/// A valid grade row for the given student number
pub fn valid_notes_row(numero: &str) -> Vec<&str> {
    vec![
        "Ahmed",
        "Ben Ali",
        numero,
        "ahmed.benali@esprit.tn",
        "15.5",
        "14",
        "16",
    ]
}

/// Build a raw row from string cells
pub fn create_raw_row(row: usize, cells: &[&str]) -> RawRow {
    RawRow::new(row, cells.iter().map(|c| c.to_string()).collect())
}

/// Header cells as owned strings
pub fn headers(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
