//! Core error types for Radyo Player

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `RadyoError`
pub type Result<T> = std::result::Result<T, RadyoError>;

/// Core error type for Radyo Player
#[derive(Error, Debug)]
pub enum RadyoError {
    /// Stream unreachable, HTTP failure, connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Unsupported container/codec or corrupt stream data
    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation did not complete in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Output device missing or refused the stream
    #[error("Device error: {0}")]
    Device(String),

    /// Platform denied audio or network access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Playback control (play/pause) failed on a live handle
    #[error("Playback error: {0}")]
    Playback(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RadyoError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error for reporting to the UI layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Device(_) => ErrorKind::Device,
            Self::PermissionDenied(_) => ErrorKind::Permission,
            Self::Playback(_) => ErrorKind::Playback,
            Self::InvalidInput(_) | Self::Config(_) | Self::Io(_) => ErrorKind::Other,
        }
    }
}

impl From<config::ConfigError> for RadyoError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for RadyoError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidInput(format!("invalid stream URL: {err}"))
    }
}

/// Coarse error classification carried in playback error descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Stream unreachable or connection dropped
    Network,
    /// Stream format not playable
    Decode,
    /// Acquisition took too long
    Timeout,
    /// Audio output unavailable
    Device,
    /// Audio or network access denied
    Permission,
    /// Live playback broke
    Playback,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Timeout => "timeout",
            Self::Device => "device",
            Self::Permission => "permission",
            Self::Playback => "playback",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification() {
        assert_eq!(RadyoError::network("refused").kind(), ErrorKind::Network);
        assert_eq!(RadyoError::decode("bad frame").kind(), ErrorKind::Decode);
        assert_eq!(
            RadyoError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(RadyoError::device("no sink").kind(), ErrorKind::Device);
        assert_eq!(
            RadyoError::PermissionDenied("mic".into()).kind(),
            ErrorKind::Permission
        );
        assert_eq!(RadyoError::config("missing").kind(), ErrorKind::Other);
    }

    #[test]
    fn url_parse_errors_are_invalid_input() {
        let err: RadyoError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, RadyoError::InvalidInput(_)));
        assert!(err.to_string().contains("invalid stream URL"));
    }
}
