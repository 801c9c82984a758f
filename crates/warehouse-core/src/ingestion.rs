use serde::{Deserialize, Serialize};
use tracing::info;
use warehouse_parser::{
    interpret_bulk_update, interpret_device_upload, parse_user_info, DeviceUpload,
};

use crate::error::IngestionError;
use crate::store::{DeviceReplacement, DeviceStore, DeviceUpdate, UserInfoUpdate};
use crate::workbook::read_first_sheet;

/// JSON body of a device edit.
///
/// Carrying `sn_device` means the caller edits the columns directly;
/// otherwise the device is re-derived from `user_info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceEditRequest {
    pub user_info: Option<String>,
    pub items_number: Option<String>,
    pub address: Option<String>,
    pub sn_device: Option<String>,
    pub import_id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub work_order: Option<String>,
    pub device_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Inserted {
        inserted: usize,
    },
    Metadata {
        updated_devices: u64,
        category: Option<String>,
        model_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkUpdateOutcome {
    pub updated: u64,
    pub skipped: usize,
}

pub fn plan_device_update(request: DeviceEditRequest) -> DeviceUpdate {
    if let Some(serial) = request.sn_device {
        return DeviceUpdate::Replace(DeviceReplacement {
            serial,
            import_id: request.import_id,
            full_name: request.full_name,
            email: request.email,
            phone_number: request.phone_number,
            work_order: request.work_order,
            device_label: request.device_label,
            items_number: request.items_number,
            address: request.address,
        });
    }

    let raw_user_info = non_empty(request.user_info);
    DeviceUpdate::UserInfo(UserInfoUpdate {
        parsed: parse_user_info(raw_user_info.as_deref()),
        items_number: non_empty(request.items_number),
        address: non_empty(request.address),
        raw_user_info,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Applies an uploaded XLSX to a batch: either a serial list or a batch
/// metadata sheet.
pub async fn apply_device_upload(
    store: &dyn DeviceStore,
    import_id: i64,
    xlsx_bytes: &[u8],
) -> Result<UploadOutcome, IngestionError> {
    let rows = read_first_sheet(xlsx_bytes)?;

    match interpret_device_upload(&rows)? {
        DeviceUpload::Metadata(metadata) => {
            let updated_devices = store.apply_batch_metadata(import_id, &metadata).await?;
            info!(
                import_id,
                updated_devices,
                category = metadata.category.as_deref(),
                model_name = metadata.model_name.as_deref(),
                "applied batch metadata"
            );
            Ok(UploadOutcome::Metadata {
                updated_devices,
                category: metadata.category,
                model_name: metadata.model_name,
            })
        }
        DeviceUpload::Serials(serials) => {
            let inserted = store.upsert_serials(import_id, &serials).await?;
            info!(import_id, inserted, "uploaded device serials");
            Ok(UploadOutcome::Inserted { inserted })
        }
    }
}

/// Applies a bulk-update XLSX keyed by serial number.
pub async fn apply_bulk_update(
    store: &dyn DeviceStore,
    xlsx_bytes: &[u8],
) -> Result<BulkUpdateOutcome, IngestionError> {
    let rows = read_first_sheet(xlsx_bytes)?;
    let sheet = interpret_bulk_update(&rows)?;
    let updated = store.bulk_update(&sheet.rows).await?;

    info!(updated, skipped = sheet.skipped, "applied bulk device update");
    Ok(BulkUpdateOutcome {
        updated,
        skipped: sheet.skipped,
    })
}
