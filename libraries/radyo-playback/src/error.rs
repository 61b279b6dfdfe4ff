//! Error types for the playback controller

use radyo_core::RadyoError;
use thiserror::Error;

/// Controller errors
///
/// Only `Closed` ever reaches callers of the public API. The other variants
/// are recovered inside the controller: ignored requests are logged and
/// acquisition failures become the `Failed` status.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A stream is already being acquired
    #[error("Acquisition already in progress")]
    AlreadyInProgress,

    /// No stream handle to act on
    #[error("No active stream handle")]
    ResourceUnavailable,

    /// Acquiring or starting the stream failed
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] RadyoError),

    /// The controller task has shut down
    #[error("Controller is closed")]
    Closed,
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;
