// crates/warehouse-core/src/error.rs

use thiserror::Error;
use warehouse_parser::SheetError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown report type '{0}'")]
    UnknownReportKind(String),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX serialization failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Could not read workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Workbook does not contain any sheets")]
    NoSheets,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serial '{0}' already exists in this import")]
    DuplicateSerial(String),
}

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestionError {
    /// Problems with the uploaded file itself rather than with the service.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, IngestionError::Sheet(_) | IngestionError::Workbook(_))
    }
}
