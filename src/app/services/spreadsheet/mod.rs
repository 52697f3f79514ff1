//! Spreadsheet decoding shared by the grade and roster imports
//!
//! This module turns an uploaded byte buffer into a header row plus ordered
//! raw data rows, checks the header against an import's column requirements,
//! and provides the pure cell coercers used by the row validators.
//!
//! ## Architecture
//!
//! - [`reader`] - Format sniffing, workbook/CSV decoding and sheet-level limits
//! - [`column_mapping`] - Header normalization, name→index map and header validation
//! - [`field_parsers`] - Cell → typed value coercion (grades, emails, student numbers, dates)
//!
//! ## Usage
//!
//! ```rust
//! use grade_import::app::services::spreadsheet::{HeaderValidator, SpreadsheetReader};
//! use grade_import::ImportConfig;
//!
//! # fn example(buffer: &[u8]) -> grade_import::Result<()> {
//! let reader = SpreadsheetReader::new(&ImportConfig::default());
//! let sheet = reader.read(buffer)?;
//! let mapping = HeaderValidator::notes()
//!     .validate(&sheet.headers)
//!     .map_err(grade_import::Error::structural)?;
//!
//! println!("{} data rows, {} columns", sheet.rows.len(), mapping.len());
//! # Ok(())
//! # }
//! ```

pub mod column_mapping;
pub mod field_parsers;
pub mod reader;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::{HeaderCheck, HeaderMap, HeaderValidator};
pub use reader::{RawRow, RawSheet, SheetFormat, SpreadsheetReader};
