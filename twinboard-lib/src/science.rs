//! Client for the external data-science service
//!
//! The service receives an uploaded dataset, renders a time-series plot and
//! answers with the plot's path plus a textual summary. It is treated as an
//! opaque, possibly slow remote job: calls carry an explicit timeout and are
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::error::ScienceError;
use crate::model::MachineData;

/// Default data-science service location.
pub const DEFAULT_SCIENCE_URL: &str = "http://localhost:8080";

/// Default upper bound for a single processing call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default upper bound for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const PROCESS_PATH: &str = "api/datascience";

/// Client for the data-science service.
///
/// Cheap to clone; clones share the underlying HTTP client.
///
/// # Example
///
/// ```ignore
/// use twinboard_lib::DataScienceClient;
///
/// let science = DataScienceClient::builder()
///     .url("http://localhost:8080")
///     .timeout(Duration::from_secs(60))
///     .build()?;
///
/// let result = science.process(&data).await?;
/// println!("plot at {}", result.visualization_path);
/// ```
#[derive(Clone)]
pub struct DataScienceClient {
    inner: Arc<DataScienceClientInner>,
}

struct DataScienceClientInner {
    base_url: Url,
    http_client: Client,
    timeout: Duration,
}

/// What the service produced for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScienceResult {
    /// Path of the generated time-series visualization.
    pub visualization_path: String,
    /// Describe-style summary of the dataset, when the service sends one.
    pub summary: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    json_data: &'a MachineData,
}

/// The response shapes the service is known to send.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProcessResponse {
    Direct {
        #[serde(rename = "visualizationPath")]
        visualization_path: String,
        #[serde(default)]
        summary: Option<String>,
    },
    Envelope {
        success: bool,
        #[serde(default)]
        result: Option<(String, String)>,
        #[serde(default)]
        error: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl DataScienceClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> DataScienceClientBuilder {
        DataScienceClientBuilder::new()
    }

    /// Returns the service base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Sends an uploaded dataset for processing.
    pub async fn process(&self, data: &MachineData) -> Result<ScienceResult, ScienceError> {
        let url = self
            .inner
            .base_url
            .join(PROCESS_PATH)
            .map_err(|e| ScienceError::InvalidUrl(e.to_string()))?;

        log::debug!("Sending dataset to data-science service at {}", url);

        let response = self
            .inner
            .http_client
            .post(url)
            .timeout(self.inner.timeout)
            .json(&ProcessRequest { json_data: data })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProcessResponse>(&body)
                .ok()
                .and_then(|parsed| match parsed {
                    ProcessResponse::Failure { error } => Some(error),
                    ProcessResponse::Envelope { error, .. } => error,
                    ProcessResponse::Direct { .. } => None,
                })
                .unwrap_or(body);
            return Err(ScienceError::http(status.as_u16(), message));
        }

        let parsed: ProcessResponse = serde_json::from_str(&body)
            .map_err(|e| ScienceError::parse_with_body(e.to_string(), body.clone()))?;

        match parsed {
            ProcessResponse::Direct {
                visualization_path,
                summary,
            } => Ok(ScienceResult {
                visualization_path,
                summary,
            }),
            ProcessResponse::Envelope {
                success: true,
                result: Some((summary, visualization_path)),
                ..
            } => Ok(ScienceResult {
                visualization_path,
                summary: Some(summary),
            }),
            ProcessResponse::Envelope { error, .. } => Err(ScienceError::http(
                status.as_u16(),
                error.unwrap_or_else(|| "data-science service reported failure".to_string()),
            )),
            ProcessResponse::Failure { error } => Err(ScienceError::http(status.as_u16(), error)),
        }
    }

    /// Resolves a visualization path against the service URL.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn visualization_url(&self, path: &str) -> Result<Url, ScienceError> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ScienceError::InvalidUrl(e.to_string()))
    }

    fn map_send_error(&self, error: reqwest::Error) -> ScienceError {
        if error.is_timeout() {
            ScienceError::Timeout(self.inner.timeout)
        } else {
            ScienceError::Network(error)
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for constructing a [`DataScienceClient`].
pub struct DataScienceClientBuilder {
    url: String,
    timeout: Duration,
    connect_timeout: Duration,
    http_client: Option<Client>,
}

impl DataScienceClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: DEFAULT_SCIENCE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            http_client: None,
        }
    }

    /// Sets the service base URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the per-call timeout.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    ///
    /// Only applied when the builder creates the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the [`DataScienceClient`].
    pub fn build(self) -> Result<DataScienceClient, ScienceError> {
        let mut base = self.url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| ScienceError::InvalidUrl(e.to_string()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => Client::builder()
                .connect_timeout(self.connect_timeout)
                .build()?,
        };

        Ok(DataScienceClient {
            inner: Arc::new(DataScienceClientInner {
                base_url,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for DataScienceClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
