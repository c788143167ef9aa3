/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// An error from the underlying storage backend.
    #[error("storage error: {0}")]
    Storage(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The addressed record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
}
