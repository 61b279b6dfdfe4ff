//! Desktop stream backend
//!
//! Each acquired handle owns three pieces:
//! - a tokio task pumping the HTTP body into a bounded channel
//! - a session thread decoding from that channel into the output stream
//! - the shared state both of them (and the audio callback) read
//!
//! Play and pause only flip the shared `playing` flag, so they return
//! immediately even while the network stalls.

use crate::connection::StreamConnection;
use crate::error::{AudioError, Result};
use crate::reader::ChannelReader;
use crate::session::{self, SessionInfo, SessionSetup};
use crate::shared::SessionShared;
use async_trait::async_trait;
use radyo_core::{AudioSessionConfig, HandleId, NotificationSink, StreamBackend, StreamHandle};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("radyo-player/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body chunks buffered between the pump and the decoder
const DEFAULT_BUFFER_CHUNKS: usize = 64;

/// Stream backend for desktop platforms (HTTP + Symphonia + CPAL)
#[derive(Debug, Clone)]
pub struct DesktopStreamBackend {
    client: reqwest::Client,
    buffer_chunks: usize,
}

impl DesktopStreamBackend {
    /// Create a backend with its own HTTP client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialized
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create a backend sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            buffer_chunks: DEFAULT_BUFFER_CHUNKS,
        }
    }

    async fn open(&self, url: &Url, notifications: NotificationSink) -> Result<DesktopHandle> {
        let connection = StreamConnection::open(&self.client, url).await?;

        let id = HandleId::next();
        let shared = Arc::new(SessionShared::new());
        let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(self.buffer_chunks);
        let hint = connection.hint();
        let station_name = connection.station_name().map(str::to_owned);

        let pump = tokio::spawn(connection.pump(chunk_tx, Arc::clone(&shared)));

        // From here on, dropping the handle stops everything
        let mut handle = DesktopHandle {
            id,
            shared: Arc::clone(&shared),
            session: None,
            pump,
            station_name,
            info: None,
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        let setup = SessionSetup {
            id,
            reader: ChannelReader::new(chunk_rx, Arc::clone(&shared)),
            hint,
            shared,
            notifications,
            ready: ready_tx,
        };

        let session = thread::Builder::new()
            .name(format!("radyo-session-{}", id.get()))
            .spawn(move || session::run(setup))?;
        handle.session = Some(session);

        match ready_rx.await {
            Ok(Ok(info)) => {
                info!(
                    %id,
                    %url,
                    codec = %info.codec,
                    resampled = info.is_resampled(),
                    station = handle.station_name().unwrap_or("unknown"),
                    "Stream ready"
                );
                handle.info = Some(info);
                Ok(handle)
            }
            Ok(Err(err)) => {
                handle.close().await;
                Err(err)
            }
            Err(_) => {
                handle.close().await;
                Err(AudioError::SessionClosed)
            }
        }
    }
}

#[async_trait]
impl StreamBackend for DesktopStreamBackend {
    type Handle = DesktopHandle;

    async fn configure_session(&self, session: &AudioSessionConfig) -> radyo_core::Result<()> {
        debug!(
            background = session.stays_active_in_background,
            silent_mode = session.plays_in_silent_mode,
            "No platform audio session on desktop"
        );
        Ok(())
    }

    async fn acquire(
        &self,
        url: &Url,
        notifications: NotificationSink,
    ) -> radyo_core::Result<DesktopHandle> {
        Ok(self.open(url, notifications).await?)
    }

    async fn play(&self, handle: &mut DesktopHandle) -> radyo_core::Result<()> {
        handle.set_playing(true)?;
        Ok(())
    }

    async fn pause(&self, handle: &mut DesktopHandle) -> radyo_core::Result<()> {
        handle.set_playing(false)?;
        Ok(())
    }

    async fn release(&self, handle: DesktopHandle) -> radyo_core::Result<()> {
        handle.close().await;
        Ok(())
    }
}

/// Handle to an open desktop stream
///
/// Dropping the handle stops the pump and the session thread without
/// waiting for them; `StreamBackend::release` also joins the thread.
pub struct DesktopHandle {
    id: HandleId,
    shared: Arc<SessionShared>,
    session: Option<thread::JoinHandle<()>>,
    pump: JoinHandle<()>,
    station_name: Option<String>,
    info: Option<SessionInfo>,
}

impl DesktopHandle {
    /// Station name announced by the server, if any
    pub fn station_name(&self) -> Option<&str> {
        self.station_name.as_deref()
    }

    /// Stream and output format
    pub fn info(&self) -> Option<&SessionInfo> {
        self.info.as_ref()
    }

    fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.is_finished())
    }

    fn set_playing(&self, playing: bool) -> Result<()> {
        if !self.is_running() {
            return Err(AudioError::SessionClosed);
        }
        self.shared.set_playing(playing);
        debug!(id = %self.id, playing, "Playback flag set");
        Ok(())
    }

    fn signal_shutdown(&self) {
        self.shared.shut_down();
        self.pump.abort();
    }

    async fn close(mut self) {
        self.signal_shutdown();

        let Some(session) = self.session.take() else {
            return;
        };

        match tokio::task::spawn_blocking(move || session.join()).await {
            Ok(Ok(())) => debug!(id = %self.id, "Audio session joined"),
            Ok(Err(_)) => warn!(id = %self.id, "Audio session thread panicked"),
            Err(err) => warn!(id = %self.id, error = %err, "Failed to join audio session thread"),
        }
    }
}

impl StreamHandle for DesktopHandle {
    fn id(&self) -> HandleId {
        self.id
    }
}

impl Drop for DesktopHandle {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_builds_with_default_client() {
        let backend = DesktopStreamBackend::new().unwrap();
        assert_eq!(backend.buffer_chunks, DEFAULT_BUFFER_CHUNKS);
    }

    #[tokio::test]
    async fn handle_without_session_rejects_playback() {
        let handle = DesktopHandle {
            id: HandleId::next(),
            shared: Arc::new(SessionShared::new()),
            session: None,
            pump: tokio::spawn(async {}),
            station_name: None,
            info: None,
        };

        assert!(matches!(handle.set_playing(true), Err(AudioError::SessionClosed)));
        assert!(!handle.shared.is_playing());

        let shared = Arc::clone(&handle.shared);
        handle.close().await;
        assert!(shared.is_shut_down());
    }
}
