use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use twinboard_lib::DataScienceClient;
use twinboard_lib::error::Error;
use twinboard_lib::server::AppState;
use twinboard_lib::server::Server;
use twinboard_lib::server::ServerConfig;
use twinboard_lib::store::SqliteMachineStore;

use crate::config::ServeArgs;
use crate::paths;

/// Runs the machines API until Ctrl-C.
pub async fn run(args: ServeArgs) -> Result<(), Error> {
    let db = match args.db {
        Some(path) => path,
        None => paths::machines_db().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine data directory")
        })?,
    };
    if let Some(parent) = db.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    log::info!("Opening machine store at {}", db.display());
    let store = SqliteMachineStore::open(&db).await?;

    let science = DataScienceClient::builder()
        .url(args.science_url)
        .timeout(Duration::from_secs(args.science_timeout_secs))
        .build()?;
    log::info!(
        "Data-science service at {} (timeout {:?})",
        science.base_url(),
        science.timeout()
    );

    let state = AppState::new(Arc::new(store), science);
    let server = Server::bind(ServerConfig::new(args.bind), state).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Shutting down"),
            Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
        }
        shutdown.cancel();
    });

    server.run(cancel).await?;
    Ok(())
}
