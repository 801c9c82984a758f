use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use warehouse_core::ingestion::{
    apply_bulk_update, apply_device_upload, plan_device_update, BulkUpdateOutcome,
    DeviceEditRequest, UploadOutcome,
};
use warehouse_core::{render_report, DeviceRecord, ImportBatch, ReportFormat, ReportKind};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct BatchTagRequest {
    pub batch_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn create_import(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BatchTagRequest>,
) -> Result<(StatusCode, Json<ImportBatch>), ApiError> {
    let batch_tag = required_batch_tag(payload)?;
    let batch = state.store().create_import(&batch_tag).await?;
    info!(import_id = batch.id, batch_tag = %batch.batch_tag, "created import batch");
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn list_imports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImportBatch>>, ApiError> {
    Ok(Json(state.store().list_imports().await?))
}

pub async fn rename_import(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<BatchTagRequest>,
) -> Result<Json<ImportBatch>, ApiError> {
    let batch_tag = required_batch_tag(payload)?;
    state
        .store()
        .rename_import(id, &batch_tag)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Import not found".to_string()))
}

pub async fn delete_import(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store().delete_import(id).await?;
    info!(import_id = id, "deleted import batch");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_devices(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    Ok(Json(state.store().list_devices(id).await?))
}

pub async fn list_all_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    Ok(Json(state.store().list_all_devices().await?))
}

pub async fn upload_devices(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    let bytes = read_upload(multipart).await?;
    let outcome = apply_device_upload(state.store(), id, &bytes).await?;
    Ok(Json(outcome))
}

pub async fn bulk_update_devices(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BulkUpdateOutcome>, ApiError> {
    let bytes = read_upload(multipart).await?;
    let outcome = apply_bulk_update(state.store(), &bytes).await?;
    Ok(Json(outcome))
}

pub async fn update_device(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<DeviceEditRequest>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let update = plan_device_update(payload);
    state
        .store()
        .update_device(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))
}

pub async fn delete_device(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store().delete_device(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_report(
    State(state): State<AppState>,
    ApiPath((id, kind)): ApiPath<(i64, String)>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    // Resolve the kind before touching the store so a bad slug never costs a query.
    let kind = ReportKind::from_slug(&kind)?;
    let format = ReportFormat::from_query(query.format.as_deref());

    let devices = state.store().list_devices(id).await?;
    let output = render_report(kind, format, &devices)?;
    info!(import_id = id, %kind, bytes = output.bytes.len(), "rendered report");

    let disposition = format!("attachment; filename=\"{}\"", output.filename);
    Ok((
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response())
}

fn required_batch_tag(payload: BatchTagRequest) -> Result<String, ApiError> {
    payload
        .batch_tag
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| ApiError::BadRequest("batch_tag is required".to_string()))
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::BadRequest("No file uploaded".to_string()))
}
