//! Request routing and handlers.

use std::collections::HashMap;

use chrono::Utc;
use http_body_util::BodyExt;
use http_body_util::Full;
use http_body_util::LengthLimitError;
use http_body_util::Limited;
use hyper::Method;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Body;
use hyper::body::Bytes;
use hyper::header;
use hyper::header::HeaderValue;
use serde::Serialize;
use uuid::Uuid;

use super::AppState;
use super::multipart;
use crate::error::Error;
use crate::error::StoreError;
use crate::error::UploadError;
use crate::model::Machine;
use crate::model::MachineData;
use crate::model::MachinePatch;
use crate::model::MachineSummary;
use crate::model::NewMachine;
use crate::store::Cursor;
use crate::store::PageDirection;
use crate::store::PageRequest;

const FALLBACK_FILE_NAME: &str = "upload.json";

/// Handles one API request.
///
/// Never fails: every error becomes a JSON `{ "error": ... }` response.
pub async fn handle<B>(req: Request<B>, state: &AppState, max_body_bytes: usize) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = route(req, state, max_body_bytes).await;
    log::info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}

async fn route<B>(req: Request<B>, state: &AppState, max_body_bytes: usize) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let segments: Vec<String> = req
        .uri()
        .path()
        .trim_matches('/')
        .split('/')
        .map(str::to_string)
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (req.method().clone(), segments.as_slice()) {
        (Method::GET, ["api", "machines"]) => {
            let query = query_params(req.uri().query());
            list_machines(state, &query).await
        }
        (Method::POST, ["api", "machines"]) => {
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            match read_body(req, max_body_bytes).await {
                Ok(body) => create_machine(state, content_type.as_deref(), &body).await,
                Err(e) => upload_error_response(e),
            }
        }
        (_, ["api", "machines"]) => method_not_allowed(),
        (Method::GET, ["api", "machines", id]) => get_machine(state, id).await,
        (Method::PATCH, ["api", "machines", id]) => {
            let id = id.to_string();
            match read_body(req, max_body_bytes).await {
                Ok(body) => update_machine(state, &id, &body).await,
                Err(e) => upload_error_response(e),
            }
        }
        (_, ["api", "machines", _]) => method_not_allowed(),
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_machines(state: &AppState, query: &HashMap<String, String>) -> Response<Full<Bytes>> {
    let Some(limit) = query.get("limit") else {
        return match state.store.list().await {
            Ok(machines) => {
                let summaries: Vec<MachineSummary> =
                    machines.into_iter().map(MachineSummary::from).collect();
                json_response(StatusCode::OK, &summaries)
            }
            Err(e) => {
                log::error!("Error fetching machines: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch machines")
            }
        };
    };

    let request = match page_request(limit, query) {
        Ok(request) => request,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match state.store.list_page(request).await {
        Ok(page) => json_response(StatusCode::OK, &page.map(MachineSummary::from)),
        Err(e) => {
            log::error!("Error fetching machines: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch machines")
        }
    }
}

fn page_request(limit: &str, query: &HashMap<String, String>) -> Result<PageRequest, &'static str> {
    let limit: usize = limit
        .parse()
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or("Invalid limit")?;
    let cursor = query
        .get("cursor")
        .filter(|cursor| !cursor.is_empty())
        .map(|cursor| Cursor::decode(cursor))
        .transpose()
        .map_err(|_| "Invalid cursor")?;
    let direction = match query.get("direction").map(String::as_str) {
        None | Some("forward") => PageDirection::Forward,
        Some("backward") => PageDirection::Backward,
        Some(_) => return Err("Invalid direction"),
    };
    Ok(PageRequest {
        limit,
        cursor,
        direction,
    })
}

async fn get_machine(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    let Ok(id) = Uuid::parse_str(id) else {
        return error_response(StatusCode::NOT_FOUND, "Machine not found");
    };
    match state.store.get(id).await {
        Ok(Some(machine)) => json_response(StatusCode::OK, &machine),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Machine not found"),
        Err(e) => {
            log::error!("Error fetching machine {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch machine")
        }
    }
}

async fn update_machine(state: &AppState, id: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let Ok(id) = Uuid::parse_str(id) else {
        return error_response(StatusCode::NOT_FOUND, "Machine not found");
    };
    let patch: MachinePatch = match serde_json::from_slice(body) {
        Ok(patch) => patch,
        Err(e) => {
            log::warn!("Rejected update for machine {}: {}", id, e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid update");
        }
    };
    if patch.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No updates provided");
    }
    match state.store.update(id, patch).await {
        Ok(Some(machine)) => json_response(StatusCode::OK, &machine),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Machine not found"),
        Err(StoreError::EmptyPatch) => {
            error_response(StatusCode::BAD_REQUEST, "No updates provided")
        }
        Err(e) => {
            log::error!("Error updating machine {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update machine")
        }
    }
}

async fn create_machine(
    state: &AppState,
    content_type: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    match ingest_upload(state, content_type, body).await {
        Ok(machine) => {
            log::info!("Created machine {} ({})", machine.id, machine.name);
            json_response(StatusCode::OK, &machine)
        }
        Err(Error::Upload(e)) => upload_error_response(e),
        Err(e) => {
            log::error!("Error creating machine: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create machine")
        }
    }
}

/// Parses the form, runs the data-science service and stores the machine.
async fn ingest_upload(
    state: &AppState,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Machine, Error> {
    let boundary = content_type
        .and_then(multipart::boundary)
        .ok_or(UploadError::MissingFields)?;
    let parts = multipart::parse(body, &boundary)?;

    let name = parts
        .iter()
        .find(|part| part.name == "name")
        .map(|part| part.text().trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(UploadError::MissingFields)?;
    let file = parts
        .iter()
        .find(|part| part.name == "file" && !part.data.is_empty())
        .ok_or(UploadError::MissingFields)?;

    let data = MachineData::parse(&file.data)?;
    let result = state.science.process(&data).await?;
    if let Some(summary) = &result.summary {
        log::debug!("Data-science summary for {}: {}", name, summary);
    }

    let file_name = file
        .file_name
        .clone()
        .filter(|file_name| !file_name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    let new_machine = NewMachine::from_upload(
        name,
        file_name,
        file.data.len() as u64,
        &data,
        result.visualization_path,
        Utc::now(),
    );
    Ok(state.store.create(new_machine).await?)
}

// =============================================================================
// Helpers
// =============================================================================

async fn read_body<B>(req: Request<B>, max_body_bytes: usize) -> Result<Bytes, UploadError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(req.into_body(), max_body_bytes).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(UploadError::TooLarge(max_body_bytes))
        }
        Err(e) => Err(UploadError::Multipart(e.to_string())),
    }
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn upload_error_response(error: UploadError) -> Response<Full<Bytes>> {
    match error {
        UploadError::MissingFields => {
            error_response(StatusCode::BAD_REQUEST, "File and machine name are required")
        }
        UploadError::TooLarge(_) => {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        }
        e => {
            log::error!("Error creating machine: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create machine")
        }
    }
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => with_json_body(status, body),
        Err(e) => {
            log::error!("Failed to serialize response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    with_json_body(status, body.into_bytes())
}

fn with_json_body(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::science::DataScienceClient;
    use crate::store::MachineStore;
    use crate::store::MemoryMachineStore;

    fn state() -> (Arc<MemoryMachineStore>, AppState) {
        let store = Arc::new(MemoryMachineStore::new());
        let science = DataScienceClient::builder()
            .url("http://127.0.0.1:9")
            .build()
            .unwrap();
        (store.clone(), AppState::new(store, science))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        let mut req = Request::new(Full::new(Bytes::from(body.to_string())));
        *req.method_mut() = method;
        *req.uri_mut() = uri.parse().unwrap();
        req
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(store: &MemoryMachineStore) -> Machine {
        let new = NewMachine::from_upload(
            "Press",
            "press.json",
            2,
            &MachineData::default(),
            "plot.png",
            Utc::now(),
        );
        store.create(new).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_summaries() {
        let (store, state) = state();
        seed(&store).await;

        let response = handle(request(Method::GET, "/api/machines", ""), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "Press");
        assert!(json[0].get("lastUpdated").is_some());
    }

    #[tokio::test]
    async fn test_list_with_limit_returns_page() {
        let (store, state) = state();
        seed(&store).await;

        let response = handle(request(Method::GET, "/api/machines?limit=5", ""), &state, 1024).await;
        let json = body_json(response).await;
        assert_eq!(json["machines"].as_array().unwrap().len(), 1);
        assert!(json["next_cursor"].is_null());
        assert!(json["previous_cursor"].is_null());
    }

    #[tokio::test]
    async fn test_list_rejects_bad_cursor() {
        let (_, state) = state();
        let response = handle(
            request(Method::GET, "/api/machines?limit=5&cursor=garbage", ""),
            &state,
            1024,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_unknown_machine_is_404() {
        let (_, state) = state();
        let uri = format!("/api/machines/{}", Uuid::new_v4());
        let response = handle(request(Method::GET, &uri, ""), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Machine not found");

        let response = handle(request(Method::GET, "/api/machines/nope", ""), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_empty_body_is_400() {
        let (store, state) = state();
        let machine = seed(&store).await;
        let uri = format!("/api/machines/{}", machine.id);

        let response = handle(request(Method::PATCH, &uri, "{}"), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No updates provided");
    }

    #[tokio::test]
    async fn test_patch_updates_status() {
        let (store, state) = state();
        let machine = seed(&store).await;
        let uri = format!("/api/machines/{}", machine.id);

        let response = handle(
            request(Method::PATCH, &uri, r#"{"status":"inactive","accuracy":72.5}"#),
            &state,
            1024,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "inactive");
        assert_eq!(json["accuracy"], 72.5);
    }

    #[tokio::test]
    async fn test_patch_unknown_status_is_400() {
        let (store, state) = state();
        let machine = seed(&store).await;
        let uri = format!("/api/machines/{}", machine.id);

        let response = handle(request(Method::PATCH, &uri, r#"{"status":"running"}"#), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_multipart_is_400() {
        let (_, state) = state();
        let response = handle(request(Method::POST, "/api/machines", "{}"), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "File and machine name are required"
        );
    }

    #[tokio::test]
    async fn test_upload_body_limit_is_413() {
        let (_, state) = state();
        let response = handle(
            request(Method::POST, "/api/machines", &"x".repeat(64)),
            &state,
            16,
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (_, state) = state();
        let response = handle(request(Method::GET, "/api/other", ""), &state, 1024).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}
