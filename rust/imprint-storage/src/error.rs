use thiserror::Error;

/// The common error type used by this crate.
///
/// Every variant is a storage failure from the point of view of a caller:
/// whether it is worth retrying is left to whoever handles the request.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A connection to the storage service could not be established
    #[error("Failed to connect to storage: {0}")]
    ConnectionFailed(String),

    /// The request was sent but did not complete
    #[error("Storage request failed: {0}")]
    RequestFailed(String),

    /// The storage service answered with an error
    #[error("Storage service error: {0}")]
    ServiceError(String),

    /// A response from the storage service could not be understood
    #[error("Failed to deserialize storage response: {0}")]
    SerializationError(String),

    /// A request could not be authorized
    #[error("Failed to authorize storage request: {0}")]
    AuthorizationError(String),

    /// The key cannot be represented by the backend
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    /// A local I/O operation failed
    #[error("Storage I/O error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            StorageError::ConnectionFailed(error.to_string())
        } else {
            StorageError::RequestFailed(error.to_string())
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}
