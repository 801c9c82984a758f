use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use warehouse_parser::{BatchMetadata, BulkUpdateRow, SerialRow};

use super::{DeviceStore, DeviceUpdate};
use crate::error::StoreError;
use crate::model::{DeviceRecord, ImportBatch};

/// Process-local store with the same semantics as the Postgres one,
/// including one device per serial within an import. Backs the tests.
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    imports: Vec<ImportBatch>,
    devices: Vec<DeviceRecord>,
    last_import_id: i64,
    last_device_id: i64,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn fill(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn create_import(&self, batch_tag: &str) -> Result<ImportBatch, StoreError> {
        let mut state = self.state.write().await;
        state.last_import_id += 1;
        let batch = ImportBatch {
            id: state.last_import_id,
            batch_tag: batch_tag.to_string(),
            created_at: Utc::now(),
        };
        state.imports.push(batch.clone());
        Ok(batch)
    }

    async fn list_imports(&self) -> Result<Vec<ImportBatch>, StoreError> {
        let state = self.state.read().await;
        let mut imports = state.imports.clone();
        imports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(imports)
    }

    async fn rename_import(
        &self,
        id: i64,
        batch_tag: &str,
    ) -> Result<Option<ImportBatch>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state
            .imports
            .iter_mut()
            .find(|batch| batch.id == id)
            .map(|batch| {
                batch.batch_tag = batch_tag.to_string();
                batch.clone()
            }))
    }

    async fn delete_import(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.imports.retain(|batch| batch.id != id);
        state.devices.retain(|device| device.import_id != Some(id));
        Ok(())
    }

    async fn list_devices(&self, import_id: i64) -> Result<Vec<DeviceRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .iter()
            .filter(|device| device.import_id == Some(import_id))
            .cloned()
            .collect())
    }

    async fn list_all_devices(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        Ok(self.state.read().await.devices.clone())
    }

    async fn upsert_serials(&self, import_id: i64, rows: &[SerialRow]) -> Result<usize, StoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        for row in rows {
            let existing = state
                .devices
                .iter_mut()
                .find(|device| device.import_id == Some(import_id) && device.serial == row.serial);

            match existing {
                Some(device) => fill(&mut device.items_number, &row.items_number),
                None => {
                    state.last_device_id += 1;
                    let device = DeviceRecord {
                        id: state.last_device_id,
                        import_id: Some(import_id),
                        items_number: row.items_number.clone(),
                        created_at: Some(Utc::now()),
                        ..DeviceRecord::new(row.serial.clone())
                    };
                    state.devices.push(device);
                }
            }
        }

        Ok(rows.len())
    }

    async fn apply_batch_metadata(
        &self,
        import_id: i64,
        metadata: &BatchMetadata,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut updated = 0;
        for device in state
            .devices
            .iter_mut()
            .filter(|device| device.import_id == Some(import_id))
        {
            device.category.clone_from(&metadata.category);
            device.model_name.clone_from(&metadata.model_name);
            updated += 1;
        }
        Ok(updated)
    }

    async fn bulk_update(&self, rows: &[BulkUpdateRow]) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut updated = 0;

        for row in rows {
            for device in state
                .devices
                .iter_mut()
                .filter(|device| device.serial == row.serial)
            {
                fill(&mut device.device_label, &row.device_label);
                fill(&mut device.items_number, &row.items_number);
                fill(&mut device.full_name, &row.full_name);
                fill(&mut device.address, &row.address);
                fill(&mut device.email, &row.email);
                fill(&mut device.phone_number, &row.phone_number);
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn update_device(
        &self,
        id: i64,
        update: &DeviceUpdate,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let mut state = self.state.write().await;
        let Some(index) = state.devices.iter().position(|device| device.id == id) else {
            return Ok(None);
        };

        let current = &state.devices[index];
        let (target_import, target_serial) = match update {
            DeviceUpdate::Replace(replacement) => {
                (replacement.import_id, replacement.serial.clone())
            }
            DeviceUpdate::UserInfo(info) => (
                current.import_id,
                info.parsed
                    .serial
                    .clone()
                    .unwrap_or_else(|| current.serial.clone()),
            ),
        };
        if target_import.is_some()
            && state.devices.iter().any(|other| {
                other.id != id && other.import_id == target_import && other.serial == target_serial
            })
        {
            return Err(StoreError::DuplicateSerial(target_serial));
        }

        let device = &mut state.devices[index];
        match update {
            DeviceUpdate::Replace(replacement) => {
                device.serial.clone_from(&replacement.serial);
                device.import_id = replacement.import_id;
                device.full_name.clone_from(&replacement.full_name);
                device.email.clone_from(&replacement.email);
                device.phone_number.clone_from(&replacement.phone_number);
                device.work_order.clone_from(&replacement.work_order);
                device.device_label.clone_from(&replacement.device_label);
                device.items_number.clone_from(&replacement.items_number);
                device.address.clone_from(&replacement.address);
            }
            DeviceUpdate::UserInfo(info) => {
                device.full_name.clone_from(&info.parsed.full_name);
                device.email.clone_from(&info.parsed.email);
                device.phone_number.clone_from(&info.parsed.phone_number);
                device.work_order.clone_from(&info.parsed.work_order);
                device.device_label.clone_from(&info.parsed.device_label);
                if let Some(serial) = &info.parsed.serial {
                    device.serial.clone_from(serial);
                }
                device.items_number.clone_from(&info.items_number);
                device.address.clone_from(&info.address);
                device.raw_user_info.clone_from(&info.raw_user_info);
            }
        }

        Ok(Some(device.clone()))
    }

    async fn delete_device(&self, id: i64) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .devices
            .retain(|device| device.id != id);
        Ok(())
    }
}
