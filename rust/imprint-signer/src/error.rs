use imprint_storage::StorageError;
use thiserror::Error;

/// The errors that may occur while loading key material or signing URLs.
///
/// All of them point at a deployment defect (a missing or malformed key)
/// rather than at the request being served.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The secret store holds no object under the locator
    #[error("Signing key '{0}' not found")]
    KeyNotFound(String),

    /// The stored bytes are not a PEM encoded RSA private key
    #[error("Failed to parse signing key: {0}")]
    KeyParseError(String),

    /// The key parsed but is not usable for signing
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// Producing the policy or its signature failed
    #[error("Failed to sign policy: {0}")]
    SigningFailed(String),

    /// The secret store could not be read
    #[error("Failed to read signing key: {0}")]
    SecretStore(#[from] StorageError),
}
