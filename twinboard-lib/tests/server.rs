//! End-to-end tests for the machines API.
//!
//! Each test runs a real server on an ephemeral port, backed by an
//! in-memory store and a stub data-science service, and drives it through
//! [`MachinesClient`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use twinboard_lib::DataScienceClient;
use twinboard_lib::MachinesClient;
use twinboard_lib::client::PageQuery;
use twinboard_lib::model::MachinePatch;
use twinboard_lib::model::MachineStatus;
use twinboard_lib::server::AppState;
use twinboard_lib::server::Server;
use twinboard_lib::server::ServerConfig;
use twinboard_lib::store::MemoryMachineStore;

const DATASET: &str = r#"{
    "name": "Press",
    "unit": "bar",
    "fields": [
        {"name": "pressure", "nums": [{"value": 1.5, "createdAt": "2024-01-01T00:00:00Z"},
                                       {"value": "2.5", "createdAt": "2024-01-01T00:01:00Z"}]},
        {"name": "temperature", "nums": []}
    ]
}"#;

/// Stub data-science service answering every request with `body`.
async fn spawn_science(status: u16, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| async move {
                    assert_eq!(req.uri().path(), "/api/datascience");
                    let payload = req.into_body().collect().await.unwrap().to_bytes();
                    let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
                    assert!(json.get("jsonData").is_some());

                    let mut response = Response::new(Full::new(Bytes::from(body)));
                    *response.status_mut() = hyper::StatusCode::from_u16(status).unwrap();
                    Ok::<_, Infallible>(response)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

struct TestServer {
    client: MachinesClient,
    cancel: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn bind_server(science: SocketAddr) -> Server {
    let science = DataScienceClient::builder()
        .url(format!("http://{}", science))
        .build()
        .unwrap();
    let state = AppState::new(Arc::new(MemoryMachineStore::new()), science);
    Server::bind(ServerConfig::new("127.0.0.1:0".parse().unwrap()), state)
        .await
        .unwrap()
}

async fn spawn_server(science: SocketAddr) -> TestServer {
    let server = bind_server(science).await;
    let addr = server.local_addr().unwrap();

    let cancel = CancellationToken::new();
    tokio::spawn(server.run(cancel.clone()));

    TestServer {
        client: MachinesClient::new(&format!("http://{}", addr)).unwrap(),
        cancel,
    }
}

#[tokio::test]
async fn test_upload_then_read_back() {
    let science = spawn_science(200, r#"{"visualizationPath":"plots/press.png","summary":"ok"}"#).await;
    let server = spawn_server(science).await;

    let created = server
        .client
        .upload("Press", "press.json", DATASET.as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(created.name, "Press");
    assert_eq!(created.status, MachineStatus::Active);
    assert_eq!(created.metadata.data_points, 2);
    assert_eq!(created.metadata.fields, ["pressure", "temperature"]);
    assert_eq!(created.metadata.original_file_name, "press.json");
    assert_eq!(created.file_paths.visualizations[0].path, "plots/press.png");
    assert_eq!(created.file_paths.visualizations[0].kind, "timeSeries");

    let fetched = server.client.get(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let listed = server.client.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].last_updated, created.updated_at);
}

#[tokio::test]
async fn test_upload_accepts_envelope_response() {
    let science = spawn_science(
        200,
        r#"{"success":true,"result":["fitted","plots/env.png"]}"#,
    )
    .await;
    let server = spawn_server(science).await;

    let created = server
        .client
        .upload("Lathe", "lathe.json", DATASET.as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(created.file_paths.visualizations[0].path, "plots/env.png");
}

#[tokio::test]
async fn test_upload_failures() {
    let science = spawn_science(500, r#"{"error":"model crashed"}"#).await;
    let server = spawn_server(science).await;

    let err = server
        .client
        .upload("Press", "press.json", DATASET.as_bytes().to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert!(err.to_string().contains("Failed to create machine"));

    let err = server
        .client
        .upload("Press", "press.json", b"{not json".to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(500));

    let err = server
        .client
        .upload("  ", "press.json", DATASET.as_bytes().to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert!(err.to_string().contains("File and machine name are required"));

    assert!(server.client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_patch_and_missing_machine() {
    let science = spawn_science(200, r#"{"visualizationPath":"plots/p.png"}"#).await;
    let server = spawn_server(science).await;

    let created = server
        .client
        .upload("Press", "press.json", DATASET.as_bytes().to_vec())
        .await
        .unwrap();

    let patch = MachinePatch::default()
        .status(MachineStatus::Error)
        .accuracy(42.5);
    let updated = server.client.patch(created.id, &patch).await.unwrap();
    assert_eq!(updated.status, MachineStatus::Error);
    assert_eq!(updated.accuracy, Some(42.5));
    assert_eq!(updated.name, created.name);
    assert!(updated.updated_at >= created.updated_at);

    let err = server
        .client
        .patch(created.id, &MachinePatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(400));

    let err = server.client.get(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
    let err = server.client.patch(Uuid::new_v4(), &patch).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cursor_pages_over_http() {
    let science = spawn_science(200, r#"{"visualizationPath":"plots/p.png"}"#).await;
    let server = spawn_server(science).await;

    for i in 0..5 {
        server
            .client
            .upload(&format!("m{}", i), "m.json", DATASET.as_bytes().to_vec())
            .await
            .unwrap();
    }
    let all: Vec<Uuid> = server.client.list().await.unwrap().iter().map(|m| m.id).collect();

    let first = server.client.list_page(&PageQuery::first(2)).await.unwrap();
    assert_eq!(first.machines.len(), 2);
    assert!(first.has_next());
    assert!(!first.has_previous());

    let cursor = first.next_cursor.clone().unwrap();
    let second = server
        .client
        .list_page(&PageQuery::next(2, cursor))
        .await
        .unwrap();
    let cursor = second.next_cursor.clone().unwrap();
    let third = server
        .client
        .list_page(&PageQuery::next(2, cursor))
        .await
        .unwrap();
    assert_eq!(third.machines.len(), 1);
    assert!(!third.has_next());
    assert!(third.has_previous());

    let paged: Vec<Uuid> = [&first, &second, &third]
        .iter()
        .flat_map(|page| page.machines.iter().map(|m| m.id))
        .collect();
    assert_eq!(paged, all);

    let cursor = third.previous_cursor.clone().unwrap();
    let back = server
        .client
        .list_page(&PageQuery::previous(2, cursor))
        .await
        .unwrap();
    let back_ids: Vec<Uuid> = back.machines.iter().map(|m| m.id).collect();
    let second_ids: Vec<Uuid> = second.machines.iter().map(|m| m.id).collect();
    assert_eq!(back_ids, second_ids);
}

#[tokio::test]
async fn test_shutdown_waits_for_open_connections() {
    let science = spawn_science(200, "{}").await;
    let server = bind_server(science).await;
    let addr = server.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let running = tokio::spawn(server.run(cancel.clone()));

    // Keep-alive connection left open after its first response.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/machines HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut status = [0u8; 12];
    stream.read_exact(&mut status).await.unwrap();
    assert_eq!(&status, b"HTTP/1.1 200");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    let closed = tokio::time::timeout(Duration::from_millis(200), stream.read_to_end(&mut rest)).await;
    assert!(closed.is_ok(), "connection still open after run returned");
}
