//! Radyo Player - Desktop Audio
//!
//! `StreamBackend` implementation for desktop platforms.
//!
//! # Architecture
//!
//! ```text
//! HTTP body ──(tokio pump)──► crossbeam channel ──► session thread
//!                                                    │ Symphonia decode
//!                                                    │ rubato resample
//!                                                    ▼
//!                                   shared sample buffer ──► CPAL callback
//! ```
//!
//! - **Connection**: reqwest GET with content-type and Icecast header checks
//! - **Session thread**: owns the decoder and the CPAL stream, reports end of
//!   stream and failures through the `NotificationSink` given to `acquire`
//! - **Output**: default device, native stream format when supported
//!
//! # Example
//!
//! ```rust,no_run
//! use radyo_audio_desktop::DesktopStreamBackend;
//! use radyo_playback::{ControllerConfig, StreamPlaybackController};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(DesktopStreamBackend::new()?);
//! let url = url::Url::parse("http://58.97.187.52:5001/rp1")?;
//! let controller = StreamPlaybackController::spawn(backend, url, ControllerConfig::default());
//!
//! controller.toggle_play_pause().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod connection;
pub mod error;
mod pipeline;
mod reader;
pub mod session;
mod shared;

pub use backend::{DesktopHandle, DesktopStreamBackend};
pub use connection::StreamConnection;
pub use error::{AudioError, Result};
pub use session::SessionInfo;
