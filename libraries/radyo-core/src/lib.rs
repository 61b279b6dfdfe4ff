//! Radyo Player Core
//!
//! Platform-agnostic core types, traits, and error handling for Radyo Player.
//!
//! This crate provides the building blocks shared by the playback controller
//! and every audio backend.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Station`, `Frequency`, `AudioSessionConfig`, `HandleId`
//! - **Core Traits**: `StreamBackend`, `StreamHandle`
//! - **Backend Notifications**: `NotificationSink`, `BackendNotification`
//! - **Configuration**: `RadyoConfig` (file + environment)
//! - **Error Handling**: Unified `RadyoError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use radyo_core::types::{Frequency, Station};
//!
//! let station = Station::new("Radyo Pilipinas", "http://58.97.187.52:5001/rp1")
//!     .unwrap()
//!     .with_frequency(Frequency::from_mhz(88.7).unwrap());
//!
//! assert_eq!(station.frequency_label().as_deref(), Some("88.7 MHz"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::RadyoConfig;
pub use error::{ErrorKind, RadyoError, Result};
pub use traits::{
    BackendNotification, NotificationKind, NotificationReceiver, NotificationSink, StreamBackend,
    StreamHandle,
};
pub use types::{AudioSessionConfig, Frequency, HandleId, Station};
