pub mod db;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod reports;
pub mod store;
pub mod workbook;

pub use model::{DeviceField, DeviceRecord, ImportBatch};
pub use reports::{generate_report, render_report, ReportFormat, ReportKind, ReportOutput};
pub use store::{DeviceStore, MemoryDeviceStore, PgDeviceStore};
