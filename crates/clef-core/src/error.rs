//! Error types for clef-core

use thiserror::Error;

/// Result type alias using clef-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in clef-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A capture permission (microphone, camera) was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The capability does not exist on this platform or build
    #[error("Not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// The operation needs a signed-in session and there is none
    #[error("Not signed in")]
    Unauthenticated,

    /// Transport-level failure (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered and refused
    #[error("Server rejected the request ({status}): {reason}")]
    BackendRejected { status: u16, reason: String },

    /// A success response that could not be decoded
    #[error("Unexpected response from the server: {0}")]
    MalformedResponse(String),

    /// Durable token storage failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
