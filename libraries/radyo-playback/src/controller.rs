//! Stream playback controller
//!
//! Owns the lifecycle of at most one remote stream handle.
//!
//! Each controller runs as a single background task that owns all playback
//! state. Public methods send a command to the task and wait for its reply,
//! so operations on one controller are processed in the order they were
//! issued. The task polls three sources:
//!
//! - the command queue (toggle, stop, shutdown)
//! - backend notifications (ended, unloaded, failed), tagged by handle id
//! - the in-flight acquisition, if any
//!
//! Because the acquisition is polled next to the command queue instead of
//! being awaited inline, a toggle arriving while `Loading` is seen right away
//! and rejected by the reentrancy guard. A stream is only ever acquired on a
//! transition into `Loading`, so no more than one handle can exist.
//!
//! ```text
//!   Idle ──toggle──► Loading ──ok──► Playing ◄──toggle──► Paused
//!    ▲                 │                │                   │
//!    │                 └─err─► Failed   └──stop / ended ────┴──► Stopped
//!    │                           │                                 │
//!    │                           └───────────toggle (re-acquire)───┘
//!    └── teardown (from any state, releasing the handle)
//! ```

use crate::error::{ControllerError, Result};
use crate::events::PlaybackEvent;
use crate::types::{ControllerConfig, ErrorDescriptor, PlaybackState, PlaybackStatus};
use radyo_core::{
    BackendNotification, ErrorKind, HandleId, NotificationKind, NotificationReceiver,
    NotificationSink, RadyoError, Station, StreamBackend, StreamHandle,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

type AcquireFuture<H> = Pin<Box<dyn Future<Output = radyo_core::Result<H>> + Send>>;

/// Commands sent to the controller task
enum Command {
    TogglePlayPause(oneshot::Sender<PlaybackState>),
    Stop(oneshot::Sender<PlaybackState>),
    Shutdown(oneshot::Sender<()>),
}

/// Playback state as owned by the controller task
///
/// Playing and paused carry the handle, so a handle without a matching
/// status (or the reverse) cannot be represented. While loading, the
/// handle is the in-flight acquisition held in `ControllerTask::pending`.
enum Slot<H> {
    Idle,
    Loading,
    Playing(H),
    Paused(H),
    Stopped,
    Failed(ErrorDescriptor),
}

impl<H: StreamHandle> Slot<H> {
    fn status(&self) -> PlaybackStatus {
        match self {
            Self::Idle => PlaybackStatus::Idle,
            Self::Loading => PlaybackStatus::Loading,
            Self::Playing(_) => PlaybackStatus::Playing,
            Self::Paused(_) => PlaybackStatus::Paused,
            Self::Stopped => PlaybackStatus::Stopped,
            Self::Failed(_) => PlaybackStatus::Failed,
        }
    }

    fn handle_id(&self) -> Option<HandleId> {
        match self {
            Self::Playing(handle) | Self::Paused(handle) => Some(handle.id()),
            _ => None,
        }
    }

    fn error(&self) -> Option<&ErrorDescriptor> {
        match self {
            Self::Failed(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Acquisition in flight
struct PendingAcquisition<H> {
    future: AcquireFuture<H>,

    /// Callers waiting for the acquisition to settle
    waiters: Vec<oneshot::Sender<PlaybackState>>,

    /// `stop()` arrived while loading
    stop_requested: bool,

    /// Notifications that arrived before the handle was known
    early_notifications: Vec<BackendNotification>,
}

/// Controller for a single remote audio stream
///
/// Created when a player screen mounts, with the station's stream URL fixed
/// for its whole lifetime. Dropping the controller tears it down in the
/// background and releases any stream it still holds; call
/// [`shutdown`](Self::shutdown) to wait for that release.
pub struct StreamPlaybackController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
    stream_url: Url,
    task: JoinHandle<()>,
}

impl StreamPlaybackController {
    /// Start a controller for `stream_url` on the current tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn<B: StreamBackend>(backend: Arc<B>, stream_url: Url, config: ControllerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(PlaybackState::idle(stream_url.clone()));
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (sink, notifications) = NotificationSink::channel();

        let task = ControllerTask {
            backend,
            stream_url: stream_url.clone(),
            config,
            slot: Slot::Idle,
            pending: None,
            sink,
            notifications,
            state_tx,
            event_tx: event_tx.clone(),
        };

        debug!(url = %stream_url, "Starting playback controller");
        let task = tokio::spawn(task.run(command_rx));

        Self {
            commands: command_tx,
            state: state_rx,
            events: event_tx,
            stream_url,
            task,
        }
    }

    /// Start a controller for a station
    pub fn for_station<B: StreamBackend>(
        backend: Arc<B>,
        station: &Station,
        config: ControllerConfig,
    ) -> Self {
        Self::spawn(backend, station.stream_url.clone(), config)
    }

    /// Play, pause or resume depending on the current status
    ///
    /// - Idle/Stopped/Failed: acquire the stream and start it. Resolves once
    ///   the acquisition settled (`Playing` or `Failed`).
    /// - Playing: pause. Paused: resume.
    /// - Loading: ignored, resolves immediately with the loading snapshot.
    pub async fn toggle_play_pause(&self) -> Result<PlaybackState> {
        self.request(Command::TogglePlayPause).await
    }

    /// Stop playback and release the stream
    ///
    /// No-op when nothing is playing. When called while loading, the stream
    /// is released as soon as the acquisition settles and this resolves then.
    pub async fn stop(&self) -> Result<PlaybackState> {
        self.request(Command::Stop).await
    }

    /// Tear down the controller, waiting until its stream is released
    pub async fn shutdown(self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(reply))
            .await
            .map_err(|_| ControllerError::Closed)?;
        response.await.map_err(|_| ControllerError::Closed)?;

        if let Err(err) = self.task.await {
            warn!(error = %err, "Playback controller task did not finish cleanly");
        }
        Ok(())
    }

    /// Current snapshot
    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.state.borrow().status
    }

    /// Stream URL this controller plays
    pub fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    /// Subscribe to status change events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Watch the latest snapshot
    pub fn watch(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<PlaybackState>) -> Command,
    ) -> Result<PlaybackState> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ControllerError::Closed)?;
        response.await.map_err(|_| ControllerError::Closed)
    }
}

/// Background task owning the playback state
struct ControllerTask<B: StreamBackend> {
    backend: Arc<B>,
    stream_url: Url,
    config: ControllerConfig,
    slot: Slot<B::Handle>,
    pending: Option<PendingAcquisition<B::Handle>>,
    sink: NotificationSink,
    notifications: NotificationReceiver,
    state_tx: watch::Sender<PlaybackState>,
    event_tx: broadcast::Sender<PlaybackEvent>,
}

impl<B: StreamBackend> ControllerTask<B> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            // Notifications first, then commands, so a stop queued while
            // loading is seen before the acquisition settles
            tokio::select! {
                biased;

                Some(notification) = self.notifications.recv() => {
                    self.on_notification(notification).await;
                }
                command = commands.recv() => match command {
                    Some(Command::TogglePlayPause(reply)) => self.on_toggle(reply).await,
                    Some(Command::Stop(reply)) => self.on_stop(reply).await,
                    Some(Command::Shutdown(reply)) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        break;
                    }
                    // Controller dropped without shutdown
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                result = settle(&mut self.pending) => self.finish_acquisition(result).await,
            }
        }

        debug!(url = %self.stream_url, "Playback controller stopped");
    }

    async fn on_toggle(&mut self, reply: oneshot::Sender<PlaybackState>) {
        match self.slot.status() {
            PlaybackStatus::Loading => {
                debug!(
                    url = %self.stream_url,
                    reason = %ControllerError::AlreadyInProgress,
                    "Toggle ignored"
                );
                let _ = reply.send(self.snapshot());
            }
            PlaybackStatus::Idle | PlaybackStatus::Stopped | PlaybackStatus::Failed => {
                self.begin_acquisition(reply);
            }
            PlaybackStatus::Playing => {
                self.pause().await;
                let _ = reply.send(self.snapshot());
            }
            PlaybackStatus::Paused => {
                self.resume().await;
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn on_stop(&mut self, reply: oneshot::Sender<PlaybackState>) {
        match self.slot.status() {
            PlaybackStatus::Playing | PlaybackStatus::Paused => {
                if let Some(handle) = self.take_handle() {
                    self.release(handle).await;
                }
                self.transition(Slot::Stopped);
                let _ = reply.send(self.snapshot());
            }
            PlaybackStatus::Loading => match self.pending.as_mut() {
                Some(pending) => {
                    info!(url = %self.stream_url, "Stop requested while loading, releasing once acquired");
                    pending.stop_requested = true;
                    pending.waiters.push(reply);
                }
                None => {
                    let _ = reply.send(self.snapshot());
                }
            },
            status @ (PlaybackStatus::Idle | PlaybackStatus::Stopped | PlaybackStatus::Failed) => {
                debug!(
                    %status,
                    reason = %ControllerError::ResourceUnavailable,
                    "Stop ignored"
                );
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn begin_acquisition(&mut self, reply: oneshot::Sender<PlaybackState>) {
        let backend = Arc::clone(&self.backend);
        let url = self.stream_url.clone();
        let session = self.config.session;
        let timeout = self.config.acquire_timeout;
        let sink = self.sink.clone();

        info!(url = %url, "Acquiring stream");
        let future: AcquireFuture<B::Handle> = Box::pin(async move {
            backend.configure_session(&session).await?;

            match tokio::time::timeout(timeout, backend.acquire(&url, sink)).await {
                Ok(result) => result,
                Err(_) => Err(RadyoError::Timeout(timeout)),
            }
        });

        self.pending = Some(PendingAcquisition {
            future,
            waiters: vec![reply],
            stop_requested: false,
            early_notifications: Vec::new(),
        });
        self.transition(Slot::Loading);
    }

    async fn finish_acquisition(&mut self, result: radyo_core::Result<B::Handle>) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Ok(handle) if pending.stop_requested => {
                info!(handle = %handle.id(), "Stream acquired after stop request, releasing");
                self.release(handle).await;
                self.transition(Slot::Stopped);
            }
            Ok(handle) => {
                // Sent from inside `acquire`, not yet polled
                let mut early = pending.early_notifications;
                while let Ok(notification) = self.notifications.try_recv() {
                    early.push(notification);
                }
                let early = early.into_iter().find(|n| n.handle == handle.id());

                match early {
                    Some(notification) => {
                        info!(handle = %handle.id(), kind = ?notification.kind, "Stream gone before playback started");
                        self.release(handle).await;
                        self.transition(Self::slot_after(notification.kind));
                    }
                    None => self.start(handle).await,
                }
            }
            Err(err) if pending.stop_requested => {
                let err = ControllerError::Acquisition(err);
                debug!(error = %err, "Acquisition failed after stop request");
                self.transition(Slot::Stopped);
            }
            Err(err) => {
                let descriptor = ErrorDescriptor::from(&err);
                let err = ControllerError::Acquisition(err);
                warn!(url = %self.stream_url, error = %err, "Stream acquisition failed");
                self.transition(Slot::Failed(descriptor));
            }
        }

        let state = self.snapshot();
        for waiter in pending.waiters {
            let _ = waiter.send(state.clone());
        }
    }

    async fn start(&mut self, mut handle: B::Handle) {
        match self.backend.play(&mut handle).await {
            Ok(()) => {
                info!(url = %self.stream_url, handle = %handle.id(), "Stream playing");
                self.transition(Slot::Playing(handle));
            }
            Err(err) => {
                warn!(handle = %handle.id(), error = %err, "Failed to start playback, releasing stream");
                let descriptor = ErrorDescriptor::from(&err);
                self.release(handle).await;
                self.transition(Slot::Failed(descriptor));
            }
        }
    }

    async fn pause(&mut self) {
        let Slot::Playing(handle) = &mut self.slot else {
            debug!(reason = %ControllerError::ResourceUnavailable, "Pause ignored");
            return;
        };

        match self.backend.pause(handle).await {
            Ok(()) => {
                if let Some(handle) = self.take_handle() {
                    self.transition(Slot::Paused(handle));
                }
            }
            Err(err) => self.fail_live(err).await,
        }
    }

    async fn resume(&mut self) {
        let Slot::Paused(handle) = &mut self.slot else {
            debug!(reason = %ControllerError::ResourceUnavailable, "Resume ignored");
            return;
        };

        match self.backend.play(handle).await {
            Ok(()) => {
                if let Some(handle) = self.take_handle() {
                    self.transition(Slot::Playing(handle));
                }
            }
            Err(err) => self.fail_live(err).await,
        }
    }

    async fn on_notification(&mut self, notification: BackendNotification) {
        if let Some(pending) = self.pending.as_mut() {
            pending.early_notifications.push(notification);
            return;
        }

        if self.slot.handle_id() != Some(notification.handle) {
            debug!(
                handle = %notification.handle,
                kind = ?notification.kind,
                "Ignoring notification for inactive handle"
            );
            return;
        }

        let Some(handle) = self.take_handle() else {
            return;
        };

        match &notification.kind {
            NotificationKind::Ended => info!(handle = %notification.handle, "Stream ended"),
            NotificationKind::Unloaded => info!(handle = %notification.handle, "Stream unloaded"),
            NotificationKind::Failed(reason) => {
                warn!(handle = %notification.handle, %reason, "Stream failed during playback");
            }
        }

        self.release(handle).await;
        self.transition(Self::slot_after(notification.kind));
    }

    fn slot_after(kind: NotificationKind) -> Slot<B::Handle> {
        match kind {
            NotificationKind::Ended | NotificationKind::Unloaded => Slot::Stopped,
            NotificationKind::Failed(reason) => {
                Slot::Failed(ErrorDescriptor::new(ErrorKind::Playback, reason))
            }
        }
    }

    /// Release the live handle and enter `Failed`
    async fn fail_live(&mut self, err: RadyoError) {
        warn!(url = %self.stream_url, error = %err, "Playback control failed, releasing stream");
        let descriptor = ErrorDescriptor::from(&err);
        if let Some(handle) = self.take_handle() {
            self.release(handle).await;
        }
        self.transition(Slot::Failed(descriptor));
    }

    /// Release everything and return to `Idle`
    ///
    /// An in-flight acquisition is not cancelled: it is awaited and its
    /// handle released right away.
    async fn teardown(&mut self) {
        let mut waiters = Vec::new();

        if let Some(pending) = self.pending.take() {
            info!(url = %self.stream_url, "Teardown waiting for in-flight acquisition");
            match pending.future.await {
                Ok(handle) => self.release(handle).await,
                Err(err) => debug!(error = %err, "In-flight acquisition failed during teardown"),
            }
            waiters = pending.waiters;
        }

        if let Some(handle) = self.take_handle() {
            self.release(handle).await;
        }

        self.transition(Slot::Idle);

        let state = self.snapshot();
        for waiter in waiters {
            let _ = waiter.send(state.clone());
        }
    }

    async fn release(&mut self, handle: B::Handle) {
        let id = handle.id();
        match self.backend.release(handle).await {
            Ok(()) => debug!(handle = %id, "Stream handle released"),
            Err(err) => warn!(handle = %id, error = %err, "Failed to release stream handle"),
        }
    }

    /// Move the handle out of the slot, leaving it unpublished until the
    /// next `transition`
    fn take_handle(&mut self) -> Option<B::Handle> {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Playing(handle) | Slot::Paused(handle) => Some(handle),
            other => {
                self.slot = other;
                None
            }
        }
    }

    fn transition(&mut self, next: Slot<B::Handle>) {
        let previous = self.state_tx.borrow().status;
        self.slot = next;

        let state = self.snapshot();
        let current = state.status;
        let error = state.last_error.clone();
        self.state_tx.send_replace(state);

        if previous != current {
            info!(url = %self.stream_url, %previous, %current, "Playback status changed");
            // No subscribers is fine
            let _ = self.event_tx.send(PlaybackEvent::StatusChanged {
                previous,
                current,
                error,
            });
        }
    }

    fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            status: self.slot.status(),
            stream_url: self.stream_url.clone(),
            last_error: self.slot.error().cloned(),
        }
    }
}

/// Resolve when the in-flight acquisition settles, never if there is none
async fn settle<H>(pending: &mut Option<PendingAcquisition<H>>) -> radyo_core::Result<H> {
    match pending {
        Some(pending) => (&mut pending.future).await,
        None => std::future::pending().await,
    }
}
