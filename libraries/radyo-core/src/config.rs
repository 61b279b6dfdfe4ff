//! Player configuration

use crate::error::{RadyoError, Result};
use crate::types::{AudioSessionConfig, Frequency, Station};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "radyo.toml";

/// Environment variable prefix (`RADYO__PLAYBACK__ACQUIRE_TIMEOUT_SECS=30`)
pub const ENV_PREFIX: &str = "RADYO";

/// Complete player configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RadyoConfig {
    /// Station to stream
    #[serde(default = "default_station")]
    pub station: StationSettings,

    /// Audio session policy
    #[serde(default)]
    pub session: AudioSessionConfig,

    /// Controller tuning
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,
}

/// Station a player screen streams
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StationSettings {
    /// Display name
    #[serde(default = "default_station_name")]
    pub name: String,

    /// Stream URL (http or https)
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// FM frequency shown next to the name
    #[serde(default = "default_frequency_mhz")]
    pub frequency_mhz: Option<f32>,
}

/// Controller tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Upper bound for one acquisition attempt
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Buffered status events per subscriber before the slowest one lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl PlaybackSettings {
    /// Acquisition timeout as a duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl RadyoConfig {
    /// Load configuration from `radyo.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        Self::load_from(path.exists().then_some(path))
    }

    /// Load configuration from a specific file (if any) and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            settings = settings.add_source(config::File::from(path));
        }

        // Override with environment variables (RADYO__STATION__STREAM_URL, ...)
        settings = settings.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.station()?;

        if self.playback.acquire_timeout_secs == 0 {
            return Err(RadyoError::config(
                "playback.acquire_timeout_secs must be greater than zero",
            ));
        }

        if self.playback.event_capacity == 0 {
            return Err(RadyoError::config(
                "playback.event_capacity must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Build the configured station
    pub fn station(&self) -> Result<Station> {
        let station = Station::new(self.station.name.clone(), &self.station.stream_url)
            .map_err(|e| RadyoError::config(format!("station: {e}")))?;

        match self.station.frequency_mhz {
            Some(mhz) => {
                let frequency = Frequency::from_mhz(mhz)
                    .map_err(|e| RadyoError::config(format!("station: {e}")))?;
                Ok(station.with_frequency(frequency))
            }
            None => Ok(station),
        }
    }
}

// Default values
fn default_station() -> StationSettings {
    StationSettings {
        name: default_station_name(),
        stream_url: default_stream_url(),
        frequency_mhz: default_frequency_mhz(),
    }
}

fn default_station_name() -> String {
    "Radyo Pilipinas".to_string()
}

fn default_stream_url() -> String {
    "http://58.97.187.52:5001/rp1".to_string()
}

// serde default for an optional field
#[allow(clippy::unnecessary_wraps)]
fn default_frequency_mhz() -> Option<f32> {
    Some(88.7)
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        acquire_timeout_secs: default_acquire_timeout_secs(),
        event_capacity: default_event_capacity(),
    }
}

fn default_acquire_timeout_secs() -> u64 {
    15
}

fn default_event_capacity() -> usize {
    64
}

impl Default for RadyoConfig {
    fn default() -> Self {
        Self {
            station: default_station(),
            session: AudioSessionConfig::default(),
            playback: default_playback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = RadyoConfig::default();
        config.validate().unwrap();

        let station = config.station().unwrap();
        assert_eq!(station.name, "Radyo Pilipinas");
        assert_eq!(station.stream_url.as_str(), "http://58.97.187.52:5001/rp1");
        assert_eq!(station.frequency_label().as_deref(), Some("88.7 MHz"));
        assert_eq!(config.playback.acquire_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = RadyoConfig::from_toml_str("").unwrap();
        assert_eq!(config, RadyoConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = RadyoConfig::from_toml_str(
            r#"
            [station]
            name = "Test FM"
            stream_url = "https://radio.example.com/live"
            frequency_mhz = 101.1

            [session]
            stays_active_in_background = false

            [playback]
            acquire_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.station.name, "Test FM");
        assert!(!config.session.stays_active_in_background);
        assert!(config.session.plays_in_silent_mode);
        assert_eq!(config.playback.acquire_timeout_secs, 5);
        assert_eq!(config.playback.event_capacity, 64);
        assert_eq!(
            config.station().unwrap().frequency_label().as_deref(),
            Some("101.1 MHz")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = RadyoConfig::from_toml_str(
            r#"
            [station]
            stream_url = "rtsp://example.com/live"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RadyoError::Config(_)));

        assert!(RadyoConfig::from_toml_str("[station]\nfrequency_mhz = 120.0").is_err());
        assert!(RadyoConfig::from_toml_str("[playback]\nacquire_timeout_secs = 0").is_err());
        assert!(RadyoConfig::from_toml_str("[playback]\nevent_capacity = 0").is_err());
    }

    #[test]
    fn loads_file_and_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[station]\nname = \"File FM\"\n\n[playback]\nevent_capacity = 8").unwrap();

        std::env::set_var("RADYOTEST__PLAYBACK__ACQUIRE_TIMEOUT_SECS", "42");
        let config = RadyoConfig::load_with_prefix(Some(file.path()), "RADYOTEST").unwrap();
        std::env::remove_var("RADYOTEST__PLAYBACK__ACQUIRE_TIMEOUT_SECS");

        assert_eq!(config.station.name, "File FM");
        assert_eq!(config.playback.event_capacity, 8);
        assert_eq!(config.playback.acquire_timeout_secs, 42);
    }
}
