use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::ValueEnum;
use log::{debug, info};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;

use crate::scanning::record::{format_display_date, ScanRecord};

const SHEET_NAME: &str = "Scans";
const ALL_RECORDS_STEM: &str = "All-Scans";
const HEADERS: [&str; 4] = ["Date", "PartNo", "MRP", "Quantity"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No data to export.")]
    NoData,
    #[error("No data for selected date.")]
    NoDataForDate(NaiveDate),
    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Empty selections are reported to the user, not treated as failures.
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, ExportError::NoData | ExportError::NoDataForDate(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "PartNo")]
    pub part_no: String,
    #[serde(rename = "MRP")]
    pub mrp: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
}

impl From<&ScanRecord> for ExportRow {
    fn from(record: &ScanRecord) -> Self {
        ExportRow {
            date: record.display_date(),
            part_no: record.part_no().clone(),
            mrp: record.mrp().clone(),
            quantity: record.quantity(),
        }
    }
}

/// Rows for `date`, or for every record when no date is selected, in store
/// order.
pub fn select_rows(records: &[ScanRecord], date: Option<NaiveDate>) -> Result<Vec<ExportRow>, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }

    let rows: Vec<ExportRow> = records
        .iter()
        .filter(|record| date.map_or(true, |date| record.date() == date))
        .map(ExportRow::from)
        .collect();

    match date {
        Some(date) if rows.is_empty() => Err(ExportError::NoDataForDate(date)),
        _ => Ok(rows),
    }
}

/// `<DD-MM-YYYY>.<ext>` for a selected date, `All-Scans.<ext>` otherwise.
pub fn export_file_name(date: Option<NaiveDate>, format: ExportFormat) -> String {
    let stem = date.map_or_else(|| ALL_RECORDS_STEM.to_string(), format_display_date);
    format!("{}.{}", stem, format.extension())
}

pub fn build_workbook(rows: &[ExportRow]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string(0, col, header)?;
    }

    for (row, record) in (1u32..).zip(rows) {
        worksheet.write_string(row, 0, record.date.as_str())?;
        worksheet.write_string(row, 1, record.part_no.as_str())?;
        worksheet.write_string(row, 2, record.mrp.as_str())?;
        worksheet.write_number(row, 3, record.quantity)?;
    }

    Ok(workbook)
}

pub fn write_csv(rows: &[ExportRow], output: impl Write) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(output);
    for row in rows {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;

    Ok(())
}

/// Writes the selected records into `out_dir` and returns the file path.
pub fn export_records(
    records: &[ScanRecord],
    date: Option<NaiveDate>,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let rows = select_rows(records, date)?;
    let path = out_dir.join(export_file_name(date, format));
    debug!("exporting rows, count={}, path={}", rows.len(), path.display());

    match format {
        ExportFormat::Xlsx => build_workbook(&rows)?.save(&path)?,
        ExportFormat::Csv => {
            let file = File::create(&path).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            write_csv(&rows, file)?;
        },
    }

    info!("exported scans, rows={}, path={}", rows.len(), path.display());

    Ok(path)
}
