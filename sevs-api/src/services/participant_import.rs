//! Bulk participant import from a spreadsheet
//!
//! The first worksheet is read with its first row as the header. Each data
//! row is upserted by reference number; barcodes are never touched, so a
//! re-import after badges were handed out keeps every binding. Row-level
//! problems are collected and the batch carries on.

use crate::db::participants::{self, ParticipantRecord};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use sevs_common::time::{now, to_millis};
use sevs_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{info, warn};
use uuid::Uuid;

/// One data row, keyed by header label
pub type RawRow = HashMap<String, String>;

/// Accepted header labels per field, spreadsheet label first
const REFERENCE_NO: &[&str] = &["Reference No.", "referenceNo", "ReferenceNo"];
const EMAIL: &[&str] = &["E-Mail", "email"];
const PREFIX: &[&str] = &["Prefix", "prefix"];
const NAME: &[&str] = &["Name", "name"];
const GENDER: &[&str] = &["Gender", "gender"];
const DESIGNATION: &[&str] = &["Designation", "designation"];
const INSTITUTION: &[&str] = &["Institution", "institution"];
const INSTITUTE_ADDRESS: &[&str] = &["Institute Address", "instituteAddress"];
const STATE: &[&str] = &["State", "state"];
const COUNTRY: &[&str] = &["Country", "country"];
const MOBILE_NO: &[&str] = &["Mobile No.", "mobileNo"];
const REGISTERED_CATEGORY: &[&str] = &["Registered Category", "registeredCategory"];
const PAPER_ID: &[&str] = &["Paper Id", "paperId"];
const REGISTRATION_DATE: &[&str] = &["Registration Date", "registrationDate"];
const TRANSACTION_ID: &[&str] = &["Transaction Id", "transactionId"];
const INVOICE_NO: &[&str] = &["Invoice No.", "invoiceNo"];
const AMOUNT_PAID: &[&str] = &["Amount Paid (INR)", "amountPaid"];

/// A row that could not be imported (rows are numbered from 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<RowError>,
}

/// Read the first worksheet of an .xlsx/.xls/.ods file into header-keyed rows
pub fn parse_workbook(bytes: Vec<u8>) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::Validation(format!("Unreadable spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Validation("Spreadsheet has no worksheets".to_string()))?
        .map_err(|e| Error::Validation(format!("Unreadable worksheet: {}", e)))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(rows_from_grid(grid))
}

/// Turn a header row plus data rows into keyed rows, skipping blank rows
pub fn rows_from_grid(grid: Vec<Vec<String>>) -> Vec<RawRow> {
    let mut lines = grid.into_iter();
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    lines
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.clone(), value))
                .collect()
        })
        .collect()
}

/// Map a raw row onto participant fields
pub fn record_from_row(row: &RawRow) -> std::result::Result<ParticipantRecord, String> {
    let reference_no = field(row, REFERENCE_NO);
    let email = field(row, EMAIL);
    if reference_no.is_empty() || email.is_empty() {
        return Err("Missing Reference No or E-Mail".to_string());
    }

    Ok(ParticipantRecord {
        reference_no,
        prefix: field(row, PREFIX),
        name: field(row, NAME),
        gender: field(row, GENDER),
        designation: field(row, DESIGNATION),
        institution: field(row, INSTITUTION),
        institute_address: field(row, INSTITUTE_ADDRESS),
        state: field(row, STATE),
        country: field(row, COUNTRY),
        email,
        mobile_no: field(row, MOBILE_NO),
        registered_category: field(row, REGISTERED_CATEGORY),
        paper_id: field(row, PAPER_ID),
        registration_date: field(row, REGISTRATION_DATE),
        transaction_id: field(row, TRANSACTION_ID),
        invoice_no: field(row, INVOICE_NO),
        amount_paid: parse_amount(&field(row, AMOUNT_PAID)),
    })
}

/// Upsert every row, collecting per-row failures
///
/// Only a store failure unrelated to the row's content (connection loss,
/// pool timeout) aborts the batch.
pub async fn import_rows(pool: &SqlitePool, rows: &[RawRow]) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;
        let record = match record_from_row(raw) {
            Ok(record) => record,
            Err(error) => {
                report.errors.push(RowError { row, error });
                continue;
            }
        };

        let new_id = Uuid::new_v4().to_string();
        match participants::upsert(pool, &new_id, &record, to_millis(now())).await {
            Ok(()) => report.imported += 1,
            Err(err) if err.as_database_error().is_some() => {
                warn!(row, reference_no = %record.reference_no, "Import row rejected: {}", err);
                let error = if sevs_common::error::is_unique_violation(&err) {
                    "E-Mail already used by another participant".to_string()
                } else {
                    "Row rejected by the database".to_string()
                };
                report.errors.push(RowError { row, error });
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(
        imported = report.imported,
        failed = report.errors.len(),
        "Participant import finished"
    );
    Ok(report)
}

fn field(row: &RawRow, labels: &[&str]) -> String {
    labels
        .iter()
        .filter_map(|label| row.get(*label))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Whole numbers without a trailing `.0` (phone numbers, reference numbers)
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
