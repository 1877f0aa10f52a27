use imprint_signer::SigningError;
use imprint_storage::StorageError;
use thiserror::Error;

use crate::RenderError;

/// Everything that can go wrong while handling a request.
///
/// Callers see one generic failure regardless of the variant; the variant
/// only matters for the log line.
#[derive(Error, Debug)]
pub enum PressError {
    /// The request cannot be rendered as given
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The artifact store failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The renderer failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Loading the signing key or signing the URL failed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The store reported an artifact that could not be read back
    #[error("Artifact '{0}' disappeared from the store")]
    ArtifactMissing(String),
}
