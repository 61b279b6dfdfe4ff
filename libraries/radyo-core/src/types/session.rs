//! Platform audio session policy
use serde::{Deserialize, Serialize};

/// Audio session settings applied before a stream is acquired
///
/// Mobile platforms route and interrupt audio according to the session
/// category. Desktop backends may ignore most of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // one flag per platform session option
pub struct AudioSessionConfig {
    /// Keep the input route available (iOS)
    #[serde(default)]
    pub allows_recording: bool,

    /// Keep playing when the app goes to the background
    #[serde(default = "default_true")]
    pub stays_active_in_background: bool,

    /// Ignore the hardware silent switch (iOS)
    #[serde(default = "default_true")]
    pub plays_in_silent_mode: bool,

    /// Route output to the earpiece instead of the speaker (Android)
    #[serde(default)]
    pub plays_through_earpiece: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AudioSessionConfig {
    fn default() -> Self {
        Self {
            allows_recording: false,
            stays_active_in_background: true,
            plays_in_silent_mode: true,
            plays_through_earpiece: false,
        }
    }
}
