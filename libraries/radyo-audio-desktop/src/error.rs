//! Desktop audio errors

use radyo_core::RadyoError;
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Desktop audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Device error
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start output stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// HTTP request failed or connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with something that is not audio
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Decoder rejected the stream
    #[error("Decode error: {0}")]
    Decode(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Session thread is gone
    #[error("Audio session closed")]
    SessionClosed,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<reqwest::Error> for AudioError {
    fn from(err: reqwest::Error) -> Self {
        AudioError::Network(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error;

        match err {
            Error::IoError(e) => AudioError::Network(e.to_string()),
            Error::Unsupported(what) => AudioError::UnsupportedFormat(what.to_string()),
            other => AudioError::Decode(other.to_string()),
        }
    }
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(err: rubato::ResamplerConstructionError) -> Self {
        AudioError::ResampleError(err.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(err: rubato::ResampleError) -> Self {
        AudioError::ResampleError(err.to_string())
    }
}

impl From<AudioError> for RadyoError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::DeviceNotFound => RadyoError::device("no output device available"),
            AudioError::DeviceError(msg)
            | AudioError::StreamBuildError(msg)
            | AudioError::PlayError(msg) => RadyoError::Device(msg),
            AudioError::Network(msg) => RadyoError::Network(msg),
            AudioError::UnsupportedFormat(msg) | AudioError::Decode(msg) => RadyoError::Decode(msg),
            AudioError::ResampleError(_) | AudioError::SessionClosed => {
                RadyoError::Playback(err.to_string())
            }
            AudioError::Io(e) => RadyoError::Io(e),
        }
    }
}
