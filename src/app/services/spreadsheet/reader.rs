//! Spreadsheet buffer decoding
//!
//! Binary workbooks (`.xlsx`, `.ods`, `.xls`) are decoded with calamine; any
//! other buffer is treated as delimited UTF-8 text. Only the first worksheet
//! is read. Entirely blank rows are dropped; the first non-blank row is the
//! header and the remaining non-blank rows are data rows, numbered by their
//! 1-based position in the sheet.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use tracing::{debug, info};

use crate::app::models::StructuralError;
use crate::config::ImportConfig;
use crate::{Error, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &str = "\u{feff}";

/// Container format detected from the buffer's leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// ZIP-based workbook (`.xlsx`, `.ods`)
    OpenXml,
    /// Legacy OLE workbook (`.xls`)
    Legacy,
    /// Comma or semicolon separated text
    Delimited,
}

impl SheetFormat {
    pub fn detect(buffer: &[u8]) -> Self {
        if buffer.starts_with(ZIP_MAGIC) {
            Self::OpenXml
        } else if buffer.starts_with(OLE_MAGIC) {
            Self::Legacy
        } else {
            Self::Delimited
        }
    }
}

/// One data row with its 1-based sheet row number
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(row: usize, cells: Vec<String>) -> Self {
        Self { row, cells }
    }

    /// Cell at a column index; short rows yield `None`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Decoded first worksheet: raw header cells plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub sheet_name: String,
    pub format: SheetFormat,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Decodes upload buffers and enforces the sheet-level limits
#[derive(Debug, Clone)]
pub struct SpreadsheetReader {
    max_file_size_bytes: usize,
    max_rows: usize,
}

impl SpreadsheetReader {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes,
            max_rows: config.max_rows,
        }
    }

    /// Decode the buffer into a header and data rows
    ///
    /// Fails with [`Error::Structural`] when the buffer is empty or too large,
    /// has no worksheet, holds no non-blank row, has no data row below the
    /// header, or has more data rows than allowed. Undecodable workbooks fail
    /// with [`Error::Workbook`].
    pub fn read(&self, buffer: &[u8]) -> Result<RawSheet> {
        if buffer.is_empty() {
            return Err(Error::structural(vec![StructuralError::EmptyFile]));
        }
        if buffer.len() > self.max_file_size_bytes {
            return Err(Error::structural(vec![StructuralError::FileTooLarge {
                size: buffer.len(),
                max: self.max_file_size_bytes,
            }]));
        }

        let format = SheetFormat::detect(buffer);
        debug!("Detected sheet format {:?} ({} bytes)", format, buffer.len());

        let (sheet_name, grid) = match format {
            SheetFormat::OpenXml | SheetFormat::Legacy => read_workbook(buffer)?,
            SheetFormat::Delimited => read_delimited(buffer)?,
        };

        let mut non_blank = grid.into_iter().filter(|row| !row.is_blank());
        let header = non_blank
            .next()
            .ok_or_else(|| Error::structural(vec![StructuralError::EmptyFile]))?;
        let rows: Vec<RawRow> = non_blank.collect();

        if rows.is_empty() {
            return Err(Error::structural(vec![StructuralError::NoDataRows]));
        }
        if rows.len() > self.max_rows {
            return Err(Error::structural(vec![StructuralError::TooManyRows {
                found: rows.len(),
                max: self.max_rows,
            }]));
        }

        info!(
            "Read sheet '{}': {} columns, {} data rows",
            sheet_name,
            header.cells.len(),
            rows.len()
        );

        Ok(RawSheet {
            sheet_name,
            format,
            headers: header.cells,
            rows,
        })
    }
}

/// Decode the first worksheet of a binary workbook
fn read_workbook(buffer: &[u8]) -> Result<(String, Vec<RawRow>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(buffer))
        .map_err(|e| Error::workbook(format!("Failed to open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::structural(vec![StructuralError::NoWorksheets]))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::workbook(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    // Ranges start at the first used cell, not necessarily A1
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let grid = range
        .rows()
        .enumerate()
        .map(|(offset, cells)| {
            let mut values = vec![String::new(); first_col];
            values.extend(cells.iter().map(cell_to_string));
            RawRow::new(first_row + offset + 1, values)
        })
        .collect();

    Ok((sheet_name, grid))
}

/// Decode delimited UTF-8 text; `;` is used when the first line has
/// semicolons but no commas
fn read_delimited(buffer: &[u8]) -> Result<(String, Vec<RawRow>)> {
    let text = std::str::from_utf8(buffer).map_err(|_| {
        Error::workbook("Unsupported file format: expected an Excel workbook or UTF-8 text")
    })?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| Error::csv_parsing(format!("Failed to read line {}", index + 1), Some(e)))?;
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        grid.push(RawRow::new(
            row,
            record.iter().map(|cell| cell.to_string()).collect(),
        ));
    }

    Ok(("CSV".to_string(), grid))
}

fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first_line.contains(';') && !first_line.contains(',') {
        b';'
    } else {
        b','
    }
}

/// Render a workbook cell the way it would read in a CSV export
///
/// Integral floats drop the fractional part so numeric student numbers keep
/// their digits; date cells become their Excel serial number.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}
