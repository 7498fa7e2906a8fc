//! Upload errors

/// Errors raised while accepting an uploaded machine dataset.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File and machine name are required")]
    MissingFields,
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),
}
