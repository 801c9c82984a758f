use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::debug;
use warehouse_parser::{BatchMetadata, BulkUpdateRow, SerialRow};

use super::{DeviceStore, DeviceUpdate};
use crate::db::DbPool;
use crate::error::StoreError;
use crate::model::{DeviceRecord, ImportBatch};

const IMPORT_COLUMNS: &str = "id, batch_tag, created_at";

const DEVICE_COLUMNS: &str = "id, import_id, sn_device, full_name, email, phone_number, \
     work_order, device_label, items_number, address, category, model_name, user_info_raw, \
     created_at";

#[derive(Clone)]
pub struct PgDeviceStore {
    pool: DbPool,
}

impl PgDeviceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn import_from_row(row: &PgRow) -> Result<ImportBatch, sqlx::Error> {
    Ok(ImportBatch {
        id: row.try_get("id")?,
        batch_tag: row.try_get("batch_tag")?,
        created_at: row.try_get("created_at")?,
    })
}

fn device_from_row(row: &PgRow) -> Result<DeviceRecord, sqlx::Error> {
    Ok(DeviceRecord {
        id: row.try_get("id")?,
        import_id: row.try_get("import_id")?,
        serial: row.try_get("sn_device")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        work_order: row.try_get("work_order")?,
        device_label: row.try_get("device_label")?,
        items_number: row.try_get("items_number")?,
        address: row.try_get("address")?,
        category: row.try_get("category")?,
        model_name: row.try_get("model_name")?,
        raw_user_info: row.try_get("user_info_raw")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Maps a hit on the per-import serial index to `DuplicateSerial`.
fn serial_conflict(err: sqlx::Error, serial: &str) -> StoreError {
    let duplicate = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation()
    );
    if duplicate {
        StoreError::DuplicateSerial(serial.to_string())
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn create_import(&self, batch_tag: &str) -> Result<ImportBatch, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO imports (batch_tag) VALUES ($1) RETURNING {IMPORT_COLUMNS}"
        ))
        .bind(batch_tag)
        .fetch_one(&self.pool)
        .await?;

        Ok(import_from_row(&row)?)
    }

    async fn list_imports(&self) -> Result<Vec<ImportBatch>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {IMPORT_COLUMNS} FROM imports ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| import_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn rename_import(
        &self,
        id: i64,
        batch_tag: &str,
    ) -> Result<Option<ImportBatch>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE imports SET batch_tag = $1 WHERE id = $2 RETURNING {IMPORT_COLUMNS}"
        ))
        .bind(batch_tag)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(import_from_row).transpose()?)
    }

    async fn delete_import(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM imports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_devices(&self, import_id: i64) -> Result<Vec<DeviceRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE import_id = $1 ORDER BY id ASC"
        ))
        .bind(import_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| device_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn list_all_devices(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| device_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn upsert_serials(&self, import_id: i64, rows: &[SerialRow]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO devices (sn_device, import_id, items_number)
                VALUES ($1, $2, $3)
                ON CONFLICT (import_id, sn_device) DO UPDATE
                SET items_number = COALESCE(EXCLUDED.items_number, devices.items_number)
                "#,
            )
            .bind(&row.serial)
            .bind(import_id)
            .bind(&row.items_number)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(import_id, count = rows.len(), "upserted serials");
        Ok(rows.len())
    }

    async fn apply_batch_metadata(
        &self,
        import_id: i64,
        metadata: &BatchMetadata,
    ) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE devices SET category = $1, model_name = $2 WHERE import_id = $3")
                .bind(&metadata.category)
                .bind(&metadata.model_name)
                .bind(import_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn bulk_update(&self, rows: &[BulkUpdateRow]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for row in rows {
            let result = sqlx::query(
                r#"
                UPDATE devices SET
                    device_label = COALESCE($2, device_label),
                    items_number = COALESCE($3, items_number),
                    full_name = COALESCE($4, full_name),
                    address = COALESCE($5, address),
                    email = COALESCE($6, email),
                    phone_number = COALESCE($7, phone_number)
                WHERE sn_device = $1
                "#,
            )
            .bind(&row.serial)
            .bind(&row.device_label)
            .bind(&row.items_number)
            .bind(&row.full_name)
            .bind(&row.address)
            .bind(&row.email)
            .bind(&row.phone_number)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn update_device(
        &self,
        id: i64,
        update: &DeviceUpdate,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let row = match update {
            DeviceUpdate::Replace(replacement) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE devices SET
                        sn_device = $1,
                        import_id = $2,
                        full_name = $3,
                        email = $4,
                        phone_number = $5,
                        work_order = $6,
                        device_label = $7,
                        items_number = $8,
                        address = $9
                    WHERE id = $10
                    RETURNING {DEVICE_COLUMNS}
                    "#
                ))
                .bind(&replacement.serial)
                .bind(replacement.import_id)
                .bind(&replacement.full_name)
                .bind(&replacement.email)
                .bind(&replacement.phone_number)
                .bind(&replacement.work_order)
                .bind(&replacement.device_label)
                .bind(&replacement.items_number)
                .bind(&replacement.address)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| serial_conflict(err, &replacement.serial))?
            }
            DeviceUpdate::UserInfo(info) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE devices SET
                        full_name = $1,
                        email = $2,
                        phone_number = $3,
                        work_order = $4,
                        device_label = $5,
                        sn_device = COALESCE($6, sn_device),
                        items_number = $7,
                        address = $8,
                        user_info_raw = $9
                    WHERE id = $10
                    RETURNING {DEVICE_COLUMNS}
                    "#
                ))
                .bind(&info.parsed.full_name)
                .bind(&info.parsed.email)
                .bind(&info.parsed.phone_number)
                .bind(&info.parsed.work_order)
                .bind(&info.parsed.device_label)
                .bind(&info.parsed.serial)
                .bind(&info.items_number)
                .bind(&info.address)
                .bind(&info.raw_user_info)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| {
                    serial_conflict(err, info.parsed.serial.as_deref().unwrap_or_default())
                })?
            }
        };

        Ok(row.as_ref().map(device_from_row).transpose()?)
    }

    async fn delete_device(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
