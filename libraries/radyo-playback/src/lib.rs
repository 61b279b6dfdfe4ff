//! Radyo Player - Stream Playback
//!
//! Platform-agnostic playback controller for a single live radio stream.
//!
//! This crate provides:
//! - A play/pause toggle that acquires the stream on first use
//! - Stop and teardown that always release the stream
//! - A reentrancy guard that ignores toggles while a stream is loading
//! - Read-only state snapshots and status change events for the UI
//!
//! # Architecture
//!
//! `radyo-playback` does not talk to any audio device or network itself.
//! Acquisition and playback go through the `StreamBackend` trait from
//! `radyo-core`, implemented per platform (see `radyo-audio-desktop`).
//!
//! Each controller owns at most one stream handle. Status and handle are
//! kept in one place, so "playing" always means a live handle exists and
//! "stopped" always means it was released.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use radyo_core::{HandleId, NotificationSink, Result, StreamBackend, StreamHandle};
//! use radyo_playback::{ControllerConfig, PlaybackStatus, StreamPlaybackController};
//! use std::sync::Arc;
//! use url::Url;
//!
//! struct SilentHandle(HandleId);
//!
//! impl StreamHandle for SilentHandle {
//!     fn id(&self) -> HandleId {
//!         self.0
//!     }
//! }
//!
//! struct SilentBackend;
//!
//! #[async_trait]
//! impl StreamBackend for SilentBackend {
//!     type Handle = SilentHandle;
//!
//!     async fn acquire(&self, _url: &Url, _sink: NotificationSink) -> Result<SilentHandle> {
//!         Ok(SilentHandle(HandleId::next()))
//!     }
//!     async fn play(&self, _handle: &mut SilentHandle) -> Result<()> { Ok(()) }
//!     async fn pause(&self, _handle: &mut SilentHandle) -> Result<()> { Ok(()) }
//!     async fn release(&self, _handle: SilentHandle) -> Result<()> { Ok(()) }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> radyo_playback::Result<()> {
//! let url = Url::parse("http://58.97.187.52:5001/rp1").unwrap();
//! let controller =
//!     StreamPlaybackController::spawn(Arc::new(SilentBackend), url, ControllerConfig::default());
//!
//! let state = controller.toggle_play_pause().await?;
//! assert_eq!(state.status, PlaybackStatus::Playing);
//!
//! controller.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod events;
pub mod types;

pub use controller::StreamPlaybackController;
pub use error::{ControllerError, Result};
pub use events::PlaybackEvent;
pub use types::{ControllerConfig, ErrorDescriptor, PlaybackState, PlaybackStatus};
