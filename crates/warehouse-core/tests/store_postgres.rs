use std::env;

use anyhow::Result;
use warehouse_core::db;
use warehouse_core::error::StoreError;
use warehouse_core::ingestion::{plan_device_update, DeviceEditRequest};
use warehouse_core::store::{DeviceReplacement, DeviceStore, DeviceUpdate, PgDeviceStore};
use warehouse_parser::{BatchMetadata, BulkUpdateRow, SerialRow};

#[tokio::test]
async fn postgres_store_roundtrip() -> Result<()> {
    let database_url = match env::var("WAREHOUSE_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping Postgres store test because WAREHOUSE_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let pool = db::connect(&database_url, 2).await?;
    db::run_migrations(&pool).await?;
    sqlx::query("TRUNCATE TABLE devices, imports RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;

    let store = PgDeviceStore::new(pool);
    let batch = store.create_import("PG-1").await?;

    let inserted = store
        .upsert_serials(
            batch.id,
            &[
                SerialRow::new("SN-1", Some("T-1".to_string())),
                SerialRow::new("SN-2", None),
            ],
        )
        .await?;
    assert_eq!(inserted, 2);

    // Conflicting serial keeps its row and its items number.
    store
        .upsert_serials(batch.id, &[SerialRow::new("SN-1", None)])
        .await?;
    let devices = store.list_devices(batch.id).await?;
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].items_number.as_deref(), Some("T-1"));

    let updated = store
        .apply_batch_metadata(
            batch.id,
            &BatchMetadata {
                category: Some("Laptop".to_string()),
                model_name: None,
            },
        )
        .await?;
    assert_eq!(updated, 2);

    let touched = store
        .bulk_update(&[BulkUpdateRow {
            serial: "SN-2".to_string(),
            device_label: Some("FRDC-2".to_string()),
            ..BulkUpdateRow::default()
        }])
        .await?;
    assert_eq!(touched, 1);

    let edit = plan_device_update(DeviceEditRequest {
        user_info: Some("Jane Doe|jane@x.com".to_string()),
        ..DeviceEditRequest::default()
    });
    let device = store
        .update_device(devices[1].id, &edit)
        .await?
        .expect("device exists");
    assert_eq!(device.serial, "SN-2");
    assert_eq!(device.email.as_deref(), Some("jane@x.com"));
    assert_eq!(device.category.as_deref(), Some("Laptop"));
    assert!(device.device_label.is_none());

    let clash = DeviceUpdate::Replace(DeviceReplacement {
        serial: "SN-1".to_string(),
        import_id: Some(batch.id),
        ..DeviceReplacement::default()
    });
    let err = store.update_device(devices[1].id, &clash).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateSerial(ref serial) if serial == "SN-1"));

    let renamed = store.rename_import(batch.id, "PG-1b").await?;
    assert_eq!(renamed.map(|b| b.batch_tag).as_deref(), Some("PG-1b"));
    assert!(store.rename_import(batch.id + 1000, "x").await?.is_none());

    store.delete_import(batch.id).await?;
    assert!(store.list_all_devices().await?.is_empty());
    assert!(store.list_imports().await?.is_empty());

    Ok(())
}
