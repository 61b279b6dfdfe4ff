//! Audio backend traits
//!
//! A backend turns a stream URL into a live, controllable audio resource.
//! The playback controller is the only caller and owns every handle a
//! backend hands out.

use crate::error::Result;
use crate::types::{AudioSessionConfig, HandleId};
use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

/// An acquired remote stream
///
/// Handles are moved into `StreamBackend::release`, so a released handle
/// cannot be used again.
pub trait StreamHandle: Send + 'static {
    /// Id used to tag notifications about this handle
    fn id(&self) -> HandleId;
}

/// Audio backend
///
/// Implementers acquire remote audio streams and control their playback.
/// All calls suspend until the underlying resource confirms the action.
#[async_trait]
pub trait StreamBackend: Send + Sync + 'static {
    /// Handle type produced by `acquire`
    type Handle: StreamHandle;

    /// Apply the platform audio session policy
    ///
    /// Called before every acquisition. The default does nothing.
    async fn configure_session(&self, session: &AudioSessionConfig) -> Result<()> {
        let _ = session;
        Ok(())
    }

    /// Open the stream at `url` and prepare it for playback
    ///
    /// The returned handle is ready but not yet playing. Asynchronous
    /// conditions (end of stream, unload, failure) are reported through
    /// `notifications` for as long as the handle lives.
    ///
    /// # Errors
    /// Returns an error if the stream is unreachable or cannot be decoded
    async fn acquire(&self, url: &Url, notifications: NotificationSink) -> Result<Self::Handle>;

    /// Start or resume playback
    async fn play(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Pause playback, keeping the stream open
    async fn pause(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Close the stream and free every resource behind the handle
    async fn release(&self, handle: Self::Handle) -> Result<()>;
}

/// Asynchronous condition reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// The remote stream reached its end
    Ended,

    /// The backend dropped the resource on its own (e.g. route lost)
    Unloaded,

    /// Playback broke and cannot continue
    Failed(String),
}

/// Notification tagged with the handle it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendNotification {
    /// Handle the condition applies to
    pub handle: HandleId,

    /// What happened
    pub kind: NotificationKind,
}

/// Receiving side of the notification channel
pub type NotificationReceiver = mpsc::UnboundedReceiver<BackendNotification>;

/// Sending side of the notification channel, handed to `acquire`
///
/// Cloneable and usable from any thread, including audio threads that are
/// not running inside an async runtime.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    sender: mpsc::UnboundedSender<BackendNotification>,
}

impl NotificationSink {
    /// Create a connected sink/receiver pair
    pub fn channel() -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Report a condition for `handle`
    ///
    /// Returns false if nobody is listening anymore.
    pub fn notify(&self, handle: HandleId, kind: NotificationKind) -> bool {
        let delivered = self
            .sender
            .send(BackendNotification { handle, kind })
            .is_ok();
        if !delivered {
            tracing::debug!(%handle, "Notification dropped, controller gone");
        }
        delivered
    }

    /// Report end of stream for `handle`
    pub fn ended(&self, handle: HandleId) -> bool {
        self.notify(handle, NotificationKind::Ended)
    }

    /// Report that `handle` was unloaded by the backend
    pub fn unloaded(&self, handle: HandleId) -> bool {
        self.notify(handle, NotificationKind::Unloaded)
    }

    /// Report a playback failure on `handle`
    pub fn failed(&self, handle: HandleId, reason: impl Into<String>) -> bool {
        self.notify(handle, NotificationKind::Failed(reason.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_delivers_tagged_notifications() {
        let (sink, mut receiver) = NotificationSink::channel();
        let handle = HandleId::next();

        assert!(sink.ended(handle));
        assert!(sink.failed(handle, "decoder crashed"));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.handle, handle);
        assert_eq!(first.kind, NotificationKind::Ended);

        let second = receiver.recv().await.unwrap();
        assert_eq!(
            second.kind,
            NotificationKind::Failed("decoder crashed".to_string())
        );
    }

    #[test]
    fn sink_reports_closed_receiver() {
        let (sink, receiver) = NotificationSink::channel();
        drop(receiver);
        assert!(!sink.unloaded(HandleId::next()));
    }
}
