//! Report generation: per-kind relevance filter and column projection over
//! device records, rendered as CSV or XLSX.

use std::fmt;
use std::str::FromStr;

use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReportError;
use crate::model::{DeviceField, DeviceRecord};

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const REPORT_SHEET_NAME: &str = "Report";

const JOIN_SEPARATOR: &str = "|";

/// Longest text an XLSX cell can hold. Both formats cut cells to it.
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    LabelCarton,
    DeviceLabel,
    AssetImport,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::LabelCarton,
        ReportKind::DeviceLabel,
        ReportKind::AssetImport,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::LabelCarton => "label-carton",
            ReportKind::DeviceLabel => "device-label",
            ReportKind::AssetImport => "asset-import",
        }
    }

    pub fn from_slug(slug: &str) -> Result<Self, ReportError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == slug)
            .ok_or_else(|| ReportError::UnknownReportKind(slug.to_string()))
    }

    fn schema(&self) -> &'static ReportSchema {
        match self {
            ReportKind::LabelCarton => &LABEL_CARTON,
            ReportKind::DeviceLabel => &DEVICE_LABEL,
            ReportKind::AssetImport => &ASSET_IMPORT,
        }
    }

    /// Header row, one entry per output column.
    pub fn headers(&self) -> Vec<String> {
        self.schema().columns.iter().map(Column::header).collect()
    }

    /// A record is relevant when any of the kind's filter fields is non-blank.
    pub fn includes(&self, record: &DeviceRecord) -> bool {
        self.schema()
            .relevance
            .iter()
            .any(|field| record.has_value(*field))
    }

    /// Filters and projects records into data rows, keeping input order.
    pub fn rows(&self, records: &[DeviceRecord]) -> Vec<Vec<String>> {
        let columns = self.schema().columns;
        records
            .iter()
            .filter(|record| self.includes(record))
            .map(|record| columns.iter().map(|column| column.cell(record)).collect())
            .collect()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slug(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ReportFormat {
    /// `csv` selects CSV; anything else, including no value, selects XLSX.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("csv") => ReportFormat::Csv,
            _ => ReportFormat::Xlsx,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => XLSX_CONTENT_TYPE,
            ReportFormat::Csv => CSV_CONTENT_TYPE,
        }
    }
}

/// Rendered report ready to be sent as a file download.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

enum Column {
    Field(DeviceField),
    /// Non-empty values of several fields joined with `|`.
    Joined(&'static [DeviceField]),
}

impl Column {
    fn header(&self) -> String {
        match self {
            Column::Field(field) => field.column_name().to_string(),
            Column::Joined(fields) => fields
                .iter()
                .map(DeviceField::column_name)
                .collect::<Vec<_>>()
                .join(JOIN_SEPARATOR),
        }
    }

    fn cell(&self, record: &DeviceRecord) -> String {
        let value = match self {
            Column::Field(field) => record.field(*field).unwrap_or_default().to_string(),
            Column::Joined(fields) => fields
                .iter()
                .filter_map(|field| record.field(*field))
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(JOIN_SEPARATOR),
        };
        truncate_cell(value)
    }
}

fn truncate_cell(mut value: String) -> String {
    if let Some((cut, _)) = value.char_indices().nth(MAX_CELL_CHARS) {
        value.truncate(cut);
    }
    value
}

struct ReportSchema {
    relevance: &'static [DeviceField],
    columns: &'static [Column],
}

static LABEL_CARTON: ReportSchema = ReportSchema {
    relevance: &[
        DeviceField::FullName,
        DeviceField::PhoneNumber,
        DeviceField::ItemsNumber,
        DeviceField::Address,
        DeviceField::WorkOrder,
        DeviceField::DeviceLabel,
    ],
    columns: &[
        Column::Field(DeviceField::FullName),
        Column::Field(DeviceField::PhoneNumber),
        Column::Joined(&[
            DeviceField::WorkOrder,
            DeviceField::DeviceLabel,
            DeviceField::Serial,
        ]),
        Column::Field(DeviceField::ItemsNumber),
        Column::Field(DeviceField::Address),
    ],
};

static DEVICE_LABEL: ReportSchema = ReportSchema {
    relevance: &[DeviceField::DeviceLabel],
    columns: &[Column::Field(DeviceField::DeviceLabel)],
};

static ASSET_IMPORT: ReportSchema = ReportSchema {
    relevance: &[
        DeviceField::ItemsNumber,
        DeviceField::Category,
        DeviceField::ModelName,
    ],
    columns: &[
        Column::Field(DeviceField::Serial),
        Column::Field(DeviceField::ItemsNumber),
        Column::Field(DeviceField::Category),
        Column::Field(DeviceField::ModelName),
    ],
};

/// Resolves a report kind slug and renders the report.
pub fn generate_report(
    kind_slug: &str,
    format: ReportFormat,
    records: &[DeviceRecord],
) -> Result<ReportOutput, ReportError> {
    let kind = ReportKind::from_slug(kind_slug)?;
    render_report(kind, format, records)
}

pub fn render_report(
    kind: ReportKind,
    format: ReportFormat,
    records: &[DeviceRecord],
) -> Result<ReportOutput, ReportError> {
    let headers = kind.headers();
    let rows = kind.rows(records);
    debug!(
        kind = kind.slug(),
        format = format.extension(),
        total = records.len(),
        included = rows.len(),
        "rendering report"
    );

    let bytes = match format {
        ReportFormat::Csv => write_csv(&headers, &rows)?,
        ReportFormat::Xlsx => write_xlsx(&headers, &rows)?,
    };

    Ok(ReportOutput {
        bytes,
        filename: format!("{}.{}", kind.slug(), format.extension()),
        content_type: format.content_type(),
    })
}

fn write_csv(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|err| ReportError::Csv(err.into_error().into()))
}

fn write_xlsx(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET_NAME)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            // Excel has no empty string cells; leave the cell blank.
            if value.is_empty() {
                continue;
            }
            worksheet.write_string(row_num, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
