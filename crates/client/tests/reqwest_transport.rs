//! Runs the production transport against an in-process axum server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use courier_client::progress::progress_channel;
use courier_client::store::MemoryStore;
use courier_client::{ApiClient, AuthClient, FileUploadApi, UserApi};
use courier_core::http::{NETWORK_ERROR_MESSAGE, TIMEOUT_MESSAGE};
use courier_core::{ApiConfig, RequestDescriptor};
use serde_json::{json, Value};

const REPORT_SIZE: usize = 200_000;

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "pw" {
        (
            StatusCode::OK,
            Json(json!({"token": "T1", "user": {"id": 1, "email": body["email"]}})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "bad credentials"})),
        )
    }
}

async fn profile(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some("Bearer T1");
    if authorized {
        (
            StatusCode::OK,
            Json(json!({"data": {"id": 1, "name": "Ada", "email": "ada@example.com"}})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({})))
    }
}

async fn upload(mut multipart: Multipart) -> Json<Value> {
    let mut file_name = None;
    let mut size = 0;
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(String::from) {
            Some(uploaded) => {
                file_name = Some(uploaded);
                size = field.bytes().await.unwrap().len();
            }
            None => {
                fields.insert(name, Value::String(field.text().await.unwrap()));
            }
        }
    }
    Json(json!({"id": "f1", "name": file_name, "size": size, "fields": fields}))
}

async fn report() -> String {
    "x".repeat(REPORT_SIZE)
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

async fn form(Form(fields): Form<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(fields)
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/user/profile", get(profile))
        .route("/api/upload", post(upload))
        .route("/api/files/report", get(report))
        .route("/api/slow", get(slow))
        .route("/api/form", post(form));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn client() -> ApiClient {
    ApiClient::new(ApiConfig::with_base_url(spawn_server().await)).unwrap()
}

#[tokio::test]
async fn login_token_is_sent_on_profile_fetch() {
    let api = client().await;
    let auth = AuthClient::new(api.clone(), Arc::new(MemoryStore::new()));

    let response = auth.login("ada@example.com", "pw").await;
    assert!(response.is_success());
    assert_eq!(response.status_code(), Some(200));
    assert!(auth.is_logged_in().await);

    let profile = UserApi::new(api).get_profile().await;
    assert_eq!(profile.data().map(|u| u.name.as_str()), Some("Ada"));
}

#[tokio::test]
async fn rejected_login_is_classified() {
    let api = client().await;
    let auth = AuthClient::new(api, Arc::new(MemoryStore::new()));

    let response = auth.login("ada@example.com", "nope").await;
    assert!(!response.is_success());
    assert_eq!(response.status_code(), Some(401));
    assert_eq!(response.message(), Some("Unauthorized. Please login again."));
}

#[tokio::test]
async fn multipart_upload_reaches_server_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, vec![b'a'; 150_000]).unwrap();

    let api = client().await;
    let (sink, mut ticks) = progress_channel();
    let response = FileUploadApi::new(api).upload_file(&path, Some(sink)).await;

    assert!(response.is_success(), "{:?}", response.message());
    let file = response.data().unwrap();
    assert_eq!(file.name.as_deref(), Some("notes.txt"));
    assert_eq!(file.size, Some(150_000));

    let mut last = 0;
    while let Some(tick) = ticks.try_recv() {
        assert!(tick.transferred >= last);
        last = tick.transferred;
        assert_eq!(tick.total, Some(150_000));
    }
    assert_eq!(last, 150_000);
}

#[tokio::test]
async fn download_streams_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out").join("report.txt");

    let api = client().await;
    let (sink, mut ticks) = progress_channel();
    let response = FileUploadApi::new(api)
        .download_file("/files/report", &destination, Some(sink))
        .await;

    assert!(response.is_success(), "{:?}", response.message());
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), REPORT_SIZE as u64);

    let mut last = None;
    while let Some(tick) = ticks.try_recv() {
        last = Some(tick);
    }
    assert_eq!(last.map(|t| t.transferred), Some(REPORT_SIZE as u64));
}

/// Serve one response that promises more body than it sends.
async fn spawn_truncating_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\n0123456789")
            .await
            .unwrap();
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn truncated_download_leaves_no_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("report.txt");

    let api = ApiClient::new(ApiConfig::with_base_url(spawn_truncating_server().await)).unwrap();
    let response = FileUploadApi::new(api)
        .download_file("/files/report", &destination, None)
        .await;

    assert!(!response.is_success());
    assert!(!destination.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn per_request_timeout_maps_to_408() {
    let api = client().await;
    let descriptor = RequestDescriptor::get("/slow")
        .timeout(Duration::from_millis(100))
        .build();

    let response = api.execute(&descriptor).await;
    assert_eq!(response.status_code(), Some(408));
    assert_eq!(response.message(), Some(TIMEOUT_MESSAGE));
}

#[tokio::test]
async fn url_encoded_form_is_decoded_by_server() {
    use courier_core::http::{FormDescriptor, FormEncoding};

    let api = client().await;
    let form = FormDescriptor::new("/form", FormEncoding::UrlEncoded)
        .field("name", "Ada Lovelace")
        .field("topic", "engines & math");

    let response = api.submit_form(&form).await;
    assert!(response.is_success(), "{:?}", response.message());
    assert_eq!(
        response.data(),
        Some(&json!({"name": "Ada Lovelace", "topic": "engines & math"}))
    );
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let api = client().await;
    let response = api.get("/nothing-here", false).await;
    assert_eq!(response.status_code(), Some(404));
    assert_eq!(response.message(), Some("Not found"));
}

#[tokio::test]
async fn closed_port_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ApiClient::new(ApiConfig::with_base_url(format!("http://{addr}/api"))).unwrap();
    let response = api.get("/anything", false).await;
    assert_eq!(response.status_code(), Some(0));
    assert_eq!(response.message(), Some(NETWORK_ERROR_MESSAGE));
}
