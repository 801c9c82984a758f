//! Persistence of import batches and their devices.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warehouse_parser::{BatchMetadata, BulkUpdateRow, ParsedFields, SerialRow};

use crate::error::StoreError;
use crate::model::{DeviceRecord, ImportBatch};

pub use memory::MemoryDeviceStore;
pub use postgres::PgDeviceStore;

/// Every editable column of a device, written verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceReplacement {
    #[serde(rename = "sn_device")]
    pub serial: String,
    pub import_id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub work_order: Option<String>,
    pub device_label: Option<String>,
    pub items_number: Option<String>,
    pub address: Option<String>,
}

/// Fields derived from an operator's free-text user info edit.
///
/// The contact fields are overwritten from `parsed`; the serial only changes
/// when the text contained one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInfoUpdate {
    pub parsed: ParsedFields,
    pub items_number: Option<String>,
    pub address: Option<String>,
    pub raw_user_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceUpdate {
    Replace(DeviceReplacement),
    UserInfo(UserInfoUpdate),
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn create_import(&self, batch_tag: &str) -> Result<ImportBatch, StoreError>;

    /// Newest first.
    async fn list_imports(&self) -> Result<Vec<ImportBatch>, StoreError>;

    async fn rename_import(
        &self,
        id: i64,
        batch_tag: &str,
    ) -> Result<Option<ImportBatch>, StoreError>;

    /// Removes the batch together with its devices.
    async fn delete_import(&self, id: i64) -> Result<(), StoreError>;

    /// Devices of one batch in insertion order.
    async fn list_devices(&self, import_id: i64) -> Result<Vec<DeviceRecord>, StoreError>;

    async fn list_all_devices(&self) -> Result<Vec<DeviceRecord>, StoreError>;

    /// Inserts serials into a batch; a serial already present keeps its row
    /// and only takes the new items number when one was supplied.
    async fn upsert_serials(&self, import_id: i64, rows: &[SerialRow]) -> Result<usize, StoreError>;

    /// Writes category and model name onto every device of the batch.
    async fn apply_batch_metadata(
        &self,
        import_id: i64,
        metadata: &BatchMetadata,
    ) -> Result<u64, StoreError>;

    /// Fills supplied fields on every device carrying the row's serial,
    /// across all batches. Returns the number of device rows touched.
    async fn bulk_update(&self, rows: &[BulkUpdateRow]) -> Result<u64, StoreError>;

    async fn update_device(
        &self,
        id: i64,
        update: &DeviceUpdate,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    async fn delete_device(&self, id: i64) -> Result<(), StoreError>;
}
