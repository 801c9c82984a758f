use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tower::ServiceExt;
use warehouse::{router, AppState};
use warehouse_core::{DeviceStore, MemoryDeviceStore};
use warehouse_parser::{BulkUpdateRow, SerialRow};

const BOUNDARY: &str = "warehouse-test-boundary";

fn app() -> (Router, Arc<MemoryDeviceStore>) {
    let store = Arc::new(MemoryDeviceStore::new());
    let state = AppState::new(store.clone());
    (router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes()
        .to_vec();
    (status, headers, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"devices.xlsx\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn xlsx(grid: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row, cells) in grid.iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            worksheet
                .write_string(row as u32, col as u16, *value)
                .expect("write cell");
        }
    }
    workbook.save_to_buffer().expect("save workbook")
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "ok": true }));
}

#[tokio::test]
async fn create_import_trims_and_requires_tag() {
    let (app, _) = app();

    let (status, _, body) = send(
        &app,
        json_request("POST", "/imports", json!({ "batch_tag": "  B-7 " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(as_json(&body)["batch_tag"], "B-7");

    let (status, _, body) = send(
        &app,
        json_request("POST", "/imports", json!({ "batch_tag": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].is_string());

    let (_, _, body) = send(&app, get("/imports")).await;
    assert_eq!(as_json(&body).as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn rename_unknown_import_is_not_found() {
    let (app, _) = app();
    let (status, _, body) = send(
        &app,
        json_request("PUT", "/imports/42", json!({ "batch_tag": "B-42" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body)["error"], "Import not found");
}

#[tokio::test]
async fn csv_report_is_served_as_attachment() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();
    store
        .upsert_serials(batch.id, &[SerialRow::new("SN-1", None), SerialRow::new("SN-2", None)])
        .await
        .unwrap();
    store
        .bulk_update(&[BulkUpdateRow {
            serial: "SN-2".to_string(),
            device_label: Some("LBL-2".to_string()),
            ..BulkUpdateRow::default()
        }])
        .await
        .unwrap();

    let uri = format!("/imports/{}/reports/device-label?format=csv", batch.id);
    let (status, headers, body) = send(&app, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"device-label.csv\""
    );
    assert_eq!(body, b"device_label\nLBL-2\n");
}

#[tokio::test]
async fn report_defaults_to_xlsx() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();

    let uri = format!("/imports/{}/reports/asset-import", batch.id);
    let (status, headers, body) = send(&app, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"asset-import.xlsx\""
    );
    // XLSX is a zip container.
    assert!(body.starts_with(b"PK"));
}

#[tokio::test]
async fn unknown_report_kind_is_bad_request() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/imports/1/reports/bogus-kind")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["error"], "Unknown report type 'bogus-kind'");
}

#[tokio::test]
async fn serial_upload_lands_in_batch() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();
    let sheet = xlsx(&[&["Serial"], &["SN-1"], &["SN-2"]]);

    let uri = format!("/imports/{}/devices/upload", batch.id);
    let (status, _, body) = send(&app, multipart_request(&uri, "file", &sheet)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "inserted": 2 }));

    let (_, _, body) = send(&app, get(&format!("/imports/{}/devices", batch.id))).await;
    let devices = as_json(&body);
    assert_eq!(devices[0]["sn_device"], "SN-1");
    assert_eq!(devices[1]["sn_device"], "SN-2");
}

#[tokio::test]
async fn upload_without_file_field_is_bad_request() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();
    let sheet = xlsx(&[&["SN-1"]]);

    let uri = format!("/imports/{}/devices/upload", batch.id);
    let (status, _, body) = send(&app, multipart_request(&uri, "attachment", &sheet)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["error"], "No file uploaded");
}

#[tokio::test]
async fn bulk_update_without_serial_column_is_bad_request() {
    let (app, _) = app();
    let sheet = xlsx(&[&["Name", "Address"], &["Ann", "Dock 1"]]);

    let (status, _, body) = send(
        &app,
        multipart_request("/devices/bulk-update", "file", &sheet),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].is_string());
}

#[tokio::test]
async fn device_edit_parses_user_info() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();
    store
        .upsert_serials(batch.id, &[SerialRow::new("SN-1", None)])
        .await
        .unwrap();
    let id = store.list_devices(batch.id).await.unwrap()[0].id;

    let (status, _, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/devices/{id}"),
            json!({ "user_info": "Jane|jane@x.com|WO5", "address": "Dock 4" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let device = as_json(&body);
    assert_eq!(device["sn_device"], "SN-1");
    assert_eq!(device["full_name"], "Jane");
    assert_eq!(device["email"], "jane@x.com");
    assert_eq!(device["work_order"], "WO5");
    assert_eq!(device["address"], "Dock 4");
    assert_eq!(device["user_info_raw"], "Jane|jane@x.com|WO5");

    let (status, _, _) = send(
        &app,
        json_request("PUT", "/devices/999", json!({ "user_info": "Jane" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/devices/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.list_all_devices().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_path_and_body_get_json_errors() {
    let (app, _) = app();

    let (status, _, body) = send(&app, get("/imports/abc/devices")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/imports")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].is_string());
}

#[tokio::test]
async fn renaming_to_a_taken_serial_conflicts() {
    let (app, store) = app();
    let batch = store.create_import("B-1").await.unwrap();
    store
        .upsert_serials(batch.id, &[SerialRow::new("AAA11", None), SerialRow::new("BBB22", None)])
        .await
        .unwrap();
    let devices = store.list_devices(batch.id).await.unwrap();

    let (status, _, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/devices/{}", devices[1].id),
            json!({ "sn_device": "AAA11", "import_id": batch.id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        as_json(&body)["error"],
        "Serial 'AAA11' already exists in this import"
    );
    let serials: Vec<_> = store
        .list_devices(batch.id)
        .await
        .unwrap()
        .into_iter()
        .map(|device| device.serial)
        .collect();
    assert_eq!(serials, vec!["AAA11", "BBB22"]);
}
