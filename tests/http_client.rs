//! HttpUploadClient against a local multipart endpoint.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::Router;
use flate2::read::GzDecoder;

use wigle_upload::model::{NetworkRecord, ObservationRecord};
use wigle_upload::storage::FallbackStorage;
use wigle_upload::upload::{Credentials, HttpUploadClient, UploadCoordinator, UploadOutcome};

#[derive(Debug, Default, Clone)]
struct Captured {
    texts: HashMap<String, String>,
    file_field: Option<String>,
    file_name: Option<String>,
    file_bytes: Vec<u8>,
}

type Shared = Arc<Mutex<Vec<Captured>>>;

async fn confirm_file(State(seen): State<Shared>, mut multipart: Multipart) -> String {
    let mut captured = Captured::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                captured.file_field = Some(name);
                captured.file_name = Some(file_name);
                captured.file_bytes = field.bytes().await.unwrap().to_vec();
            }
            None => {
                let value = field.text().await.unwrap();
                captured.texts.insert(name, value);
            }
        }
    }

    let authorized = captured.texts.get("password").map(String::as_str) == Some("letmein");
    seen.lock().unwrap().push(captured);

    if authorized {
        "Your file was uploaded successfully. Thanks!".to_string()
    } else {
        "Sorry, your password does not match login records".to_string()
    }
}

async fn start_server() -> (String, Shared) {
    let seen: Shared = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/gps/gps/main/confirmfile/", post(confirm_file))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/gps/gps/main/confirmfile/", addr), seen)
}

fn networks() -> Vec<NetworkRecord> {
    vec![NetworkRecord::new("00:11:22:33:44:55", "home", "[WPA2-PSK-CCMP]", 6).observe(
        ObservationRecord {
            timestamp_millis: 1_700_000_000_000,
            signal_level: -42,
            latitude: 51.0,
            longitude: -0.1,
        },
    )]
}

fn coordinator(endpoint: &str, dir: &tempfile::TempDir) -> UploadCoordinator {
    let client = HttpUploadClient::new(Duration::from_secs(10)).unwrap();
    let storage = FallbackStorage::new(dir.path().join("no-sdcard"), "wiglewifi", dir.path());
    UploadCoordinator::new(&networks(), Arc::new(client), Arc::new(storage), endpoint)
}

#[tokio::test]
async fn test_multipart_upload_round_trip() {
    let (endpoint, seen) = start_server().await;
    let dir = tempfile::tempdir().unwrap();

    let outcome = coordinator(&endpoint, &dir)
        .spawn(Credentials::new("bob", "letmein"))
        .outcome()
        .await;
    assert_eq!(outcome, UploadOutcome::Success);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];

    assert_eq!(req.file_field.as_deref(), Some("stumblefile"));
    assert!(req.file_name.as_deref().unwrap().starts_with("WigleWifi_"));
    assert_eq!(req.texts.get("observer").map(String::as_str), Some("bob"));
    assert_eq!(req.texts.get("password").map(String::as_str), Some("letmein"));

    let mut csv = String::new();
    GzDecoder::new(&req.file_bytes[..])
        .read_to_string(&mut csv)
        .unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(2).unwrap().ends_with(",6,-42,51.0,-0.1"));
}

#[tokio::test]
async fn test_rejected_login() {
    let (endpoint, _seen) = start_server().await;
    let dir = tempfile::tempdir().unwrap();

    let outcome = coordinator(&endpoint, &dir)
        .spawn(Credentials::new("bob", "nope"))
        .outcome()
        .await;
    assert_eq!(outcome, UploadOutcome::BadLogin);
}

#[tokio::test]
async fn test_unknown_route_body_is_fail() {
    let (endpoint, _seen) = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let wrong = endpoint.replace("confirmfile", "elsewhere");

    let outcome = coordinator(&wrong, &dir)
        .spawn(Credentials::new("bob", "letmein"))
        .outcome()
        .await;
    assert_eq!(outcome, UploadOutcome::Fail);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_exception() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let outcome = coordinator(&format!("http://{}/upload", addr), &dir)
        .spawn(Credentials::new("anonymous", ""))
        .outcome()
        .await;
    assert_eq!(outcome, UploadOutcome::Exception);
}
