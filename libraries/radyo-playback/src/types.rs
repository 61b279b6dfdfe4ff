//! Core types for stream playback

use radyo_core::{AudioSessionConfig, ErrorKind, RadyoConfig, RadyoError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing requested yet, or controller torn down
    Idle,

    /// Acquiring the stream
    Loading,

    /// Stream is playing
    Playing,

    /// Stream is open but paused
    Paused,

    /// Stream was stopped or ended
    Stopped,

    /// Last acquisition or playback attempt failed
    Failed,
}

impl PlaybackStatus {
    /// Whether a stream handle exists in this status
    pub fn holds_handle(self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Paused)
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the controller entered `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Error classification
    pub kind: ErrorKind,

    /// Human readable message, suitable for surfacing in the UI
    pub message: String,
}

impl ErrorDescriptor {
    /// Create a descriptor
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&RadyoError> for ErrorDescriptor {
    fn from(err: &RadyoError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Read-only snapshot of a controller
///
/// The stream handle itself is never part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current status
    pub status: PlaybackStatus,

    /// Stream this controller plays, fixed for its lifetime
    pub stream_url: Url,

    /// Present only while `status == Failed`
    pub last_error: Option<ErrorDescriptor>,
}

impl PlaybackState {
    /// Initial state for a new controller
    pub fn idle(stream_url: Url) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            stream_url,
            last_error: None,
        }
    }

    /// Whether the UI should show the pause icon and animate
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Upper bound for one acquisition (default: 15s)
    pub acquire_timeout: Duration,

    /// Status events buffered per subscriber (default: 64)
    pub event_capacity: usize,

    /// Commands queued before callers wait (default: 16)
    pub command_capacity: usize,

    /// Audio session policy applied before every acquisition
    pub session: AudioSessionConfig,
}

impl ControllerConfig {
    /// Build controller settings from the player configuration
    pub fn from_config(config: &RadyoConfig) -> Self {
        Self {
            acquire_timeout: config.playback.acquire_timeout(),
            event_capacity: config.playback.event_capacity,
            session: config.session,
            ..Self::default()
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(15),
            event_capacity: 64,
            command_capacity: 16,
            session: AudioSessionConfig::default(),
        }
    }
}
