//! Machine store errors

/// Errors raised by [`MachineStore`](crate::store::MachineStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt machine row {id}: {message}")]
    Corrupt { id: String, message: String },
    #[error("no updates provided")]
    EmptyPatch,
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

impl StoreError {
    pub(crate) fn corrupt(id: impl Into<String>, message: impl ToString) -> Self {
        Self::Corrupt {
            id: id.into(),
            message: message.to_string(),
        }
    }
}
