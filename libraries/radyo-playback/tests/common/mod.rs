//! Shared test fixtures: an in-memory stream backend

#![allow(dead_code)]

use async_trait::async_trait;
use radyo_core::{
    AudioSessionConfig, HandleId, NotificationKind, NotificationSink, RadyoError, Result,
    StreamBackend, StreamHandle,
};
use radyo_playback::{ControllerConfig, StreamPlaybackController};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

pub const STREAM_URL: &str = "http://radio.example.com/live";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("radyo_playback=debug")
        .with_test_writer()
        .try_init();
}

pub fn stream_url() -> Url {
    Url::parse(STREAM_URL).unwrap()
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        acquire_timeout: Duration::from_secs(5),
        ..ControllerConfig::default()
    }
}

pub fn spawn_controller(backend: &Arc<FakeBackend>) -> StreamPlaybackController {
    init_tracing();
    StreamPlaybackController::spawn(Arc::clone(backend), stream_url(), test_config())
}

#[derive(Debug)]
pub struct FakeHandle {
    id: HandleId,
}

impl StreamHandle for FakeHandle {
    fn id(&self) -> HandleId {
        self.id
    }
}

/// Backend that tracks every handle it hands out
#[derive(Default)]
pub struct FakeBackend {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    sessions: AtomicUsize,
    double_releases: AtomicUsize,
    hang: AtomicBool,
    end_during_acquire: AtomicBool,
    live: Mutex<HashSet<HandleId>>,
    gate: Mutex<Option<Arc<Notify>>>,
    acquire_failures: Mutex<VecDeque<RadyoError>>,
    play_failures: Mutex<VecDeque<RadyoError>>,
    session_failures: Mutex<VecDeque<RadyoError>>,
    sink: Mutex<Option<NotificationSink>>,
    last_handle: Mutex<Option<HandleId>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend whose acquisitions wait for one `notify_one` each
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self::default();
        *backend.gate.lock().unwrap() = Some(Arc::clone(&gate));
        (Arc::new(backend), gate)
    }

    /// Backend whose acquisitions never complete
    pub fn hanging() -> Arc<Self> {
        let backend = Self::default();
        backend.hang.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    /// Next acquisition reports end of stream before it returns
    pub fn end_next_acquisition(&self) {
        self.end_during_acquire.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_acquire(&self, err: RadyoError) {
        self.acquire_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_play(&self, err: RadyoError) {
        self.play_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_session(&self, err: RadyoError) {
        self.session_failures.lock().unwrap().push_back(err);
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn double_releases(&self) -> usize {
        self.double_releases.load(Ordering::SeqCst)
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn last_handle(&self) -> Option<HandleId> {
        *self.last_handle.lock().unwrap()
    }

    /// Report a condition for the most recently acquired handle
    pub fn emit(&self, kind: NotificationKind) -> HandleId {
        let handle = self.last_handle().expect("no handle acquired yet");
        self.emit_for(handle, kind);
        handle
    }

    /// Report a condition for an arbitrary handle
    pub fn emit_for(&self, handle: HandleId, kind: NotificationKind) {
        let sink = self.sink.lock().unwrap().clone().expect("no sink received yet");
        sink.notify(handle, kind);
    }

    fn ensure_live(&self, handle: &FakeHandle) -> Result<()> {
        if self.live.lock().unwrap().contains(&handle.id) {
            Ok(())
        } else {
            Err(RadyoError::playback(format!("{} is not live", handle.id)))
        }
    }
}

#[async_trait]
impl StreamBackend for FakeBackend {
    type Handle = FakeHandle;

    async fn configure_session(&self, _session: &AudioSessionConfig) -> Result<()> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        match self.session_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn acquire(&self, _url: &Url, notifications: NotificationSink) -> Result<FakeHandle> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let failure = self.acquire_failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        let id = HandleId::next();
        self.live.lock().unwrap().insert(id);
        if self.end_during_acquire.swap(false, Ordering::SeqCst) {
            notifications.ended(id);
        }
        *self.sink.lock().unwrap() = Some(notifications);
        *self.last_handle.lock().unwrap() = Some(id);
        Ok(FakeHandle { id })
    }

    async fn play(&self, handle: &mut FakeHandle) -> Result<()> {
        self.ensure_live(handle)?;
        self.plays.fetch_add(1, Ordering::SeqCst);
        match self.play_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pause(&self, handle: &mut FakeHandle) -> Result<()> {
        self.ensure_live(handle)?;
        self.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn release(&self, handle: FakeHandle) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.live.lock().unwrap().remove(&handle.id) {
            Ok(())
        } else {
            self.double_releases.fetch_add(1, Ordering::SeqCst);
            Err(RadyoError::playback(format!("{} released twice", handle.id)))
        }
    }
}
