//! Interpretation of uploaded worksheet rows.
//!
//! Rows arrive as plain text grids (one `Vec<String>` per sheet row, empty
//! cells as `""`); reading the spreadsheet container is the caller's job.

use crate::errors::SheetError;
use crate::model::{BatchMetadata, BulkUpdateRow, BulkUpdateSheet, DeviceUpload, SerialRow};

const CATEGORY_HEADERS: &[&str] = &["category"];
const MODEL_HEADERS: &[&str] = &["model name", "model_name", "model"];

/// First-column values that mark a header row in a serial list.
const SERIAL_HEADER_WORDS: &[&str] = &[
    "sn",
    "serial",
    "serial number",
    "sn_device",
    "device_sn",
    "category",
    "model name",
    "model_name",
    "model",
];

const BULK_SERIAL: &[&str] = &["serial", "sn", "sn_device", "serial number"];
const BULK_DEVICE_LABEL: &[&str] = &["frdc"];
const BULK_ITEMS_NUMBER: &[&str] = &["taskcode", "task code"];
const BULK_FULL_NAME: &[&str] = &["name", "full_name", "full name"];
const BULK_ADDRESS: &[&str] = &["address"];
const BULK_EMAIL: &[&str] = &["useremail", "email", "user email"];
const BULK_PHONE: &[&str] = &["userphone", "phone", "user phone"];

/// Decides whether a device upload is a batch metadata sheet or a serial
/// list and extracts its values.
pub fn interpret_device_upload(rows: &[Vec<String>]) -> Result<DeviceUpload, SheetError> {
    if let Some(header) = rows.first() {
        let header = normalized_header(header);
        let category_col = find_column(&header, CATEGORY_HEADERS);
        let model_col = find_column(&header, MODEL_HEADERS);
        if let (Some(category_col), Some(model_col)) = (category_col, model_col) {
            return Ok(DeviceUpload::Metadata(first_metadata_row(
                &rows[1..],
                category_col,
                model_col,
            )));
        }
    }

    let serials = collect_serials(rows);
    if serials.is_empty() {
        return Err(SheetError::NoSerials);
    }
    Ok(DeviceUpload::Serials(serials))
}

fn first_metadata_row(rows: &[Vec<String>], category_col: usize, model_col: usize) -> BatchMetadata {
    rows.iter()
        .map(|row| BatchMetadata {
            category: cell(row, category_col),
            model_name: cell(row, model_col),
        })
        .find(|meta| meta.category.is_some() || meta.model_name.is_some())
        .unwrap_or_default()
}

fn collect_serials(rows: &[Vec<String>]) -> Vec<SerialRow> {
    rows.iter()
        .filter_map(|row| {
            let serial = cell(row, 0)?;
            if SERIAL_HEADER_WORDS.contains(&serial.to_lowercase().as_str()) {
                return None;
            }
            Some(SerialRow::new(serial, cell(row, 1)))
        })
        .collect()
}

/// Maps a bulk-update sheet onto per-serial field updates. Rows without a
/// serial are counted as skipped.
pub fn interpret_bulk_update(rows: &[Vec<String>]) -> Result<BulkUpdateSheet, SheetError> {
    if rows.len() < 2 {
        return Err(SheetError::NoDataRows);
    }

    let header = normalized_header(&rows[0]);
    let serial_col =
        find_column(&header, BULK_SERIAL).ok_or(SheetError::MissingColumn("Serial"))?;
    let device_label_col = find_column(&header, BULK_DEVICE_LABEL);
    let items_number_col = find_column(&header, BULK_ITEMS_NUMBER);
    let full_name_col = find_column(&header, BULK_FULL_NAME);
    let address_col = find_column(&header, BULK_ADDRESS);
    let email_col = find_column(&header, BULK_EMAIL);
    let phone_col = find_column(&header, BULK_PHONE);

    let optional = |row: &Vec<String>, col: Option<usize>| col.and_then(|idx| cell(row, idx));

    let mut sheet = BulkUpdateSheet::default();
    for row in &rows[1..] {
        let Some(serial) = cell(row, serial_col) else {
            sheet.skipped += 1;
            continue;
        };

        sheet.rows.push(BulkUpdateRow {
            serial,
            device_label: optional(row, device_label_col),
            items_number: optional(row, items_number_col),
            full_name: optional(row, full_name_col),
            address: optional(row, address_col),
            email: optional(row, email_col),
            phone_number: optional(row, phone_col),
        });
    }

    Ok(sheet)
}

fn normalized_header(row: &[String]) -> Vec<String> {
    row.iter().map(|value| value.trim().to_lowercase()).collect()
}

/// Variants are tried in order; the first variant present wins.
fn find_column(header: &[String], variants: &[&str]) -> Option<usize> {
    variants
        .iter()
        .find_map(|variant| header.iter().position(|name| name == variant))
}

fn cell(row: &[String], idx: usize) -> Option<String> {
    row.get(idx)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
