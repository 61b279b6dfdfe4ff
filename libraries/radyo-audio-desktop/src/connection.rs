//! HTTP connection to a live stream

use crate::error::{AudioError, Result};
use crate::shared::SessionShared;
use crossbeam_channel::{Sender, TrySendError};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};
use url::Url;

/// Wait before retrying when the decoder is not keeping up
const PUMP_BACKOFF: Duration = Duration::from_millis(20);

/// Open response for a stream URL, body not yet read
pub struct StreamConnection {
    url: Url,
    response: reqwest::Response,
    content_type: Option<String>,
    station_name: Option<String>,
    bitrate_kbps: Option<u32>,
}

impl StreamConnection {
    /// Connect and validate the response headers
    ///
    /// # Errors
    /// - `Network` if the server is unreachable or answers with an error status
    /// - `UnsupportedFormat` if the content type is clearly not audio
    pub async fn open(client: &reqwest::Client, url: &Url) -> Result<Self> {
        debug!(%url, "Connecting to stream");
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AudioError::Network(format!("HTTP {status} from {url}")));
        }

        let headers = response.headers();
        let content_type = header_str(headers, CONTENT_TYPE.as_str()).map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        });

        if let Some(content_type) = &content_type {
            if !is_audio_content_type(content_type) {
                return Err(AudioError::UnsupportedFormat(format!(
                    "{url} serves {content_type}, not audio"
                )));
            }
        }

        let station_name = header_str(headers, "icy-name").map(str::to_owned);
        let bitrate_kbps = header_str(headers, "icy-br").and_then(|br| br.trim().parse().ok());

        debug!(
            %url,
            content_type = content_type.as_deref().unwrap_or("unknown"),
            station = station_name.as_deref().unwrap_or("unknown"),
            "Stream connected"
        );

        Ok(Self {
            url: url.clone(),
            response,
            content_type,
            station_name,
            bitrate_kbps,
        })
    }

    /// Media type without parameters, e.g. `audio/mpeg`
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Station name announced by Icecast/Shoutcast servers
    pub fn station_name(&self) -> Option<&str> {
        self.station_name.as_deref()
    }

    /// Announced bitrate
    pub fn bitrate_kbps(&self) -> Option<u32> {
        self.bitrate_kbps
    }

    /// Format hint for the probe
    pub(crate) fn hint(&self) -> Hint {
        let mut hint = Hint::new();
        if let Some(content_type) = &self.content_type {
            hint.mime_type(content_type);
        }

        let extension = self
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext);
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        hint
    }

    /// Forward the response body into `chunks` until it ends, the reader
    /// goes away or the session shuts down
    pub(crate) async fn pump(mut self, chunks: Sender<Vec<u8>>, shared: Arc<SessionShared>) {
        let mut received = 0usize;

        while !shared.is_shut_down() {
            let mut data = match self.response.chunk().await {
                Ok(Some(chunk)) => chunk.to_vec(),
                Ok(None) => {
                    debug!(url = %self.url, received, "Stream body finished");
                    return;
                }
                Err(err) => {
                    warn!(url = %self.url, error = %err, "Stream connection dropped");
                    shared.set_network_error(err.to_string());
                    return;
                }
            };
            received += data.len();

            loop {
                match chunks.try_send(data) {
                    Ok(()) => break,
                    Err(TrySendError::Full(pending)) => {
                        if shared.is_shut_down() {
                            return;
                        }
                        data = pending;
                        tokio::time::sleep(PUMP_BACKOFF).await;
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Audio types plus the generic ones radio servers often send instead
fn is_audio_content_type(content_type: &str) -> bool {
    content_type.starts_with("audio/")
        || matches!(content_type, "application/ogg" | "application/octet-stream")
}
