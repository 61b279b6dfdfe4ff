//! Playback Events
//!
//! Status notifications for UI synchronization. The controller publishes
//! exactly one `StatusChanged` per state transition, in transition order.

use crate::types::{ErrorDescriptor, PlaybackStatus};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback status changed
    StatusChanged {
        /// Status before the transition
        previous: PlaybackStatus,
        /// Status after the transition
        current: PlaybackStatus,
        /// Set when `current` is `Failed`
        error: Option<ErrorDescriptor>,
    },
}

impl PlaybackEvent {
    /// Status after the transition
    pub fn current(&self) -> PlaybackStatus {
        match self {
            Self::StatusChanged { current, .. } => *current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radyo_core::ErrorKind;

    #[test]
    fn failed_event_serializes_error() {
        let event = PlaybackEvent::StatusChanged {
            previous: PlaybackStatus::Loading,
            current: PlaybackStatus::Failed,
            error: Some(ErrorDescriptor::new(ErrorKind::Timeout, "Timed out after 15s")),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["StatusChanged"]["previous"], "loading");
        assert_eq!(json["StatusChanged"]["current"], "failed");
        assert_eq!(json["StatusChanged"]["error"]["kind"], "timeout");
        assert_eq!(event.current(), PlaybackStatus::Failed);
    }
}
