//! Client for the machines HTTP API

use std::sync::Arc;

use reqwest::Client;
use reqwest::Response;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::Machine;
use crate::model::MachinePage;
use crate::model::MachinePatch;
use crate::model::MachineSummary;
use crate::store::PageDirection;

/// Client for a running machines API.
///
/// Cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use twinboard_lib::MachinesClient;
///
/// let client = MachinesClient::new("http://127.0.0.1:3000")?;
/// for machine in client.list().await? {
///     println!("{} {}", machine.name, machine.status);
/// }
/// ```
#[derive(Clone)]
pub struct MachinesClient {
    inner: Arc<MachinesClientInner>,
}

struct MachinesClientInner {
    base_url: Url,
    http_client: Client,
}

/// Query for one page of the machine list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: usize,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    pub direction: PageDirection,
}

impl PageQuery {
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            cursor: None,
            direction: PageDirection::Forward,
        }
    }

    pub fn next(limit: usize, cursor: impl Into<String>) -> Self {
        Self {
            limit,
            cursor: Some(cursor.into()),
            direction: PageDirection::Forward,
        }
    }

    pub fn previous(limit: usize, cursor: impl Into<String>) -> Self {
        Self {
            limit,
            cursor: Some(cursor.into()),
            direction: PageDirection::Backward,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl MachinesClient {
    /// Creates a client for the API served at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_http_client(base_url, Client::new())
    }

    /// Creates a client that reuses an existing HTTP client.
    pub fn with_http_client(base_url: &str, http_client: Client) -> Result<Self, ApiError> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(MachinesClientInner {
                base_url,
                http_client,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Lists every machine, newest first.
    pub async fn list(&self) -> Result<Vec<MachineSummary>, ApiError> {
        let url = self.url("api/machines")?;
        let response = self.inner.http_client.get(url).send().await?;
        decode(response).await
    }

    /// Fetches one cursor page of the machine list.
    pub async fn list_page(
        &self,
        query: &PageQuery,
    ) -> Result<MachinePage<MachineSummary>, ApiError> {
        let mut url = self.url("api/machines")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.max(1).to_string());
            if let Some(cursor) = &query.cursor {
                pairs.append_pair("cursor", cursor);
            }
            if query.direction == PageDirection::Backward {
                pairs.append_pair("direction", query.direction.as_str());
            }
        }
        let response = self.inner.http_client.get(url).send().await?;
        decode(response).await
    }

    /// Fetches a single machine.
    pub async fn get(&self, id: Uuid) -> Result<Machine, ApiError> {
        let url = self.url(&format!("api/machines/{id}"))?;
        let response = self.inner.http_client.get(url).send().await?;
        decode(response).await
    }

    /// Applies a partial update and returns the updated machine.
    pub async fn patch(&self, id: Uuid, patch: &MachinePatch) -> Result<Machine, ApiError> {
        let url = self.url(&format!("api/machines/{id}"))?;
        let response = self.inner.http_client.patch(url).json(patch).send().await?;
        decode(response).await
    }

    /// Uploads a JSON dataset as a new machine.
    pub async fn upload(
        &self,
        name: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Machine, ApiError> {
        let url = self.url("api/machines")?;
        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/json")?;
        let form = Form::new().text("name", name.to_string()).part("file", file);
        let response = self
            .inner
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(ApiError::http(status.as_u16(), message));
    }

    serde_json::from_str(&body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}
