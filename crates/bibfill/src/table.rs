//! Identifier input and result tables.
//!
//! Input is a header-less table whose first column holds one identifier per
//! row. A batch produces up to three CSV exports, stamped with the run date:
//!
//! | file                                     | content                           | written      |
//! |------------------------------------------|-----------------------------------|--------------|
//! | `books_metadata_found_<date>.csv`        | header + one row per found record | always       |
//! | `books_metadata_not_found_<date>.csv`    | one identifier per row, no header | if non-empty |
//! | `books_metadata_errors_<date>.csv`       | `ISBN,Error` header + rows        | if non-empty |

use std::{fs::File, io};

use chrono::NaiveDate;

use super::*;
use crate::coordinator::{ErrorEntry, Report};

/// The kinds of export a batch produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
  /// Records with a match
  Found,
  /// Identifiers without a match
  NotFound,
  /// Identifiers whose record carries an error
  Errors,
}

impl Export {
  /// Date-stamped file name for this export.
  pub fn file_name(&self, date: NaiveDate) -> String {
    let kind = match self {
      Export::Found => "found",
      Export::NotFound => "not_found",
      Export::Errors => "errors",
    };
    format!("books_metadata_{kind}_{}.csv", date.format("%Y-%m-%d"))
  }
}

/// Paths written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFiles {
  /// The found-records table
  pub found:     PathBuf,
  /// The not-found list, if any identifier was not found
  pub not_found: Option<PathBuf>,
  /// The error table, if any record carried an error
  pub errors:    Option<PathBuf>,
}

/// Reads identifiers from the first column of a header-less table file.
pub fn read_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
  let path = path.as_ref();
  debug!("Reading identifiers from {}", path.display());
  parse_identifiers(File::open(path)?)
}

/// Reads identifiers from the first column of header-less CSV data.
///
/// Cells are trimmed and blank ones dropped; everything after the first column
/// is ignored.
pub fn parse_identifiers(reader: impl io::Read) -> Result<Vec<String>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let mut identifiers = Vec::new();
  for row in reader.records() {
    let row = row?;
    if let Some(cell) = row.get(0).filter(|cell| !cell.is_empty()) {
      identifiers.push(cell.to_string());
    }
  }
  trace!("Read {} identifiers", identifiers.len());
  Ok(identifiers)
}

/// Columns used by the found table: every field present in at least one record.
pub fn found_columns<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<Field> {
  let records: Vec<&Record> = records.into_iter().collect();
  Field::ALL
    .into_iter()
    .filter(|field| records.iter().any(|record| record.get(*field).is_some()))
    .collect()
}

/// Writes found records with a header row. Not-found records are skipped.
pub fn write_found<'a, W: io::Write>(
  writer: W,
  records: impl IntoIterator<Item = &'a Record>,
) -> Result<()> {
  let records: Vec<&Record> =
    records.into_iter().filter(|record| !record.is_not_found()).collect();
  let columns = found_columns(records.iter().copied());

  let mut writer = csv::Writer::from_writer(writer);
  if !columns.is_empty() {
    writer.write_record(columns.iter().map(Field::as_str))?;
  }
  for record in records {
    writer.write_record(columns.iter().map(|field| record.get(*field).unwrap_or_default()))?;
  }
  writer.flush()?;
  Ok(())
}

/// Writes one identifier per row, without a header.
pub fn write_not_found<W: io::Write>(writer: W, identifiers: &[String]) -> Result<()> {
  let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
  for identifier in identifiers {
    writer.write_record([identifier])?;
  }
  writer.flush()?;
  Ok(())
}

/// Writes the error table with an `ISBN,Error` header.
pub fn write_errors<W: io::Write>(writer: W, errors: &[ErrorEntry]) -> Result<()> {
  let mut writer = csv::Writer::from_writer(writer);
  writer.write_record(["ISBN", "Error"])?;
  for entry in errors {
    writer.write_record([&entry.isbn, &entry.error])?;
  }
  writer.flush()?;
  Ok(())
}

/// Writes the exports for `report` into `dir`, stamped with `date`.
pub fn export(report: &Report, dir: impl AsRef<Path>, date: NaiveDate) -> Result<ExportFiles> {
  let dir = dir.as_ref();
  std::fs::create_dir_all(dir)?;

  let found = dir.join(Export::Found.file_name(date));
  write_found(File::create(&found)?, &report.records)?;
  info!("Wrote {} found records to {}", report.found_count(), found.display());

  let not_found = if report.not_found.is_empty() {
    None
  } else {
    let path = dir.join(Export::NotFound.file_name(date));
    write_not_found(File::create(&path)?, &report.not_found)?;
    info!("Wrote {} not found identifiers to {}", report.not_found.len(), path.display());
    Some(path)
  };

  let errors = if report.errors.is_empty() {
    None
  } else {
    let path = dir.join(Export::Errors.file_name(date));
    write_errors(File::create(&path)?, &report.errors)?;
    info!("Wrote {} errors to {}", report.errors.len(), path.display());
    Some(path)
  };

  Ok(ExportFiles { found, not_found, errors })
}
