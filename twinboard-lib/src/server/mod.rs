//! Machines HTTP API server
//!
//! A small hyper HTTP/1 server exposing the machine list, detail, partial
//! update and upload endpoints. Each accepted connection is served on its own
//! task; the accept loop stops when the cancellation token fires and `run`
//! returns once every open connection has shut down gracefully.

pub mod multipart;
mod routes;

pub use routes::handle;

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::science::DataScienceClient;
use crate::store::MachineStore;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Largest accepted request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 3000)))
    }
}

/// Shared handles used by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MachineStore>,
    pub science: DataScienceClient,
}

impl AppState {
    pub fn new(store: Arc<dyn MachineStore>, science: DataScienceClient) -> Self {
        Self { store, science }
    }
}

/// A bound, not yet running, API server.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    max_body_bytes: usize,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(config: ServerConfig, state: AppState) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        Ok(Self {
            listener,
            state: Arc::new(state),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Returns the bound address (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> io::Result<()> {
        log::info!("Machines API listening on {}", self.listener.local_addr()?);
        let connections = TaskTracker::new();

        loop {
            let (stream, peer) = tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!(
                        "Shutting down machines API, {} connections open",
                        connections.len()
                    );
                    connections.close();
                    connections.wait().await;
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        log::warn!("Accept failed: {}", e);
                        continue;
                    }
                },
            };

            let state = self.state.clone();
            let max_body_bytes = self.max_body_bytes;
            let cancel = cancel.clone();

            connections.spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req: Request<Incoming>| {
                    let state = state.clone();
                    async move { Ok::<_, Infallible>(handle(req, &state, max_body_bytes).await) }
                });

                let conn = http1::Builder::new().serve_connection(io, service);
                tokio::pin!(conn);

                let result = tokio::select! {
                    result = conn.as_mut() => result,
                    _ = cancel.cancelled() => {
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                };

                // Clients closing early is routine
                if let Err(e) = result {
                    log::debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}
