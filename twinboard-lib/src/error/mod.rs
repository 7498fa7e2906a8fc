//! Error types

mod api;
mod science;
mod store;
mod upload;

pub use api::*;
pub use science::*;
pub use store::*;
pub use upload::*;

/// Top-level error for operations that cross several layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Data-science service failure.
    #[error(transparent)]
    Science(#[from] ScienceError),

    /// Rejected upload.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Machines API failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Form input rejected before anything was sent.
    #[error("{0}")]
    Form(&'static str),

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
