//! Radio station

use crate::error::{RadyoError, Result};
use crate::types::Frequency;
use serde::{Deserialize, Serialize};
use url::Url;

/// A live radio station: what one player screen streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Display name
    pub name: String,

    /// Remote stream location (http or https)
    pub stream_url: Url,

    /// FM frequency of the terrestrial broadcast, if any
    pub frequency: Option<Frequency>,
}

impl Station {
    /// Create a station, validating the stream URL
    pub fn new(name: impl Into<String>, stream_url: &str) -> Result<Self> {
        let stream_url = Url::parse(stream_url)?;
        Self::from_url(name, stream_url)
    }

    /// Create a station from an already parsed URL
    pub fn from_url(name: impl Into<String>, stream_url: Url) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RadyoError::invalid_input("station name is empty"));
        }

        match stream_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RadyoError::invalid_input(format!(
                    "unsupported stream scheme '{other}' (expected http or https)"
                )))
            }
        }

        Ok(Self {
            name,
            stream_url,
            frequency: None,
        })
    }

    /// Attach the FM frequency shown next to the station name
    #[must_use]
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Label such as "88.7 MHz"
    pub fn frequency_label(&self) -> Option<String> {
        self.frequency.map(|f| f.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(Station::new("A", "http://example.com/live").is_ok());
        assert!(Station::new("B", "https://example.com/live.mp3").is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        let err = Station::new("A", "ftp://example.com/live").unwrap_err();
        assert!(matches!(err, RadyoError::InvalidInput(_)));

        assert!(Station::new("A", "file:///tmp/stream.mp3").is_err());
    }

    #[test]
    fn rejects_empty_name_and_garbage_url() {
        assert!(Station::new("  ", "http://example.com/live").is_err());
        assert!(Station::new("A", "://nope").is_err());
    }

    #[test]
    fn frequency_label() {
        let station = Station::new("Radyo Pilipinas", "http://58.97.187.52:5001/rp1").unwrap();
        assert_eq!(station.frequency_label(), None);

        let station = station.with_frequency(Frequency::from_mhz(88.7).unwrap());
        assert_eq!(station.frequency_label().as_deref(), Some("88.7 MHz"));
    }
}
