use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("No serial numbers found")]
    NoSerials,

    #[error("No data rows found in sheet")]
    NoDataRows,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}
