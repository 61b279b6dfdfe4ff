//! Audio session thread
//!
//! One thread per acquired stream. It owns the Symphonia decoder and the
//! CPAL output stream (which is not `Send`), so both are created, used and
//! dropped on this thread.
//!
//! Lifecycle:
//! 1. Probe the stream and decode the first packet to learn the real format
//! 2. Open the output device and start it muted
//! 3. Report the outcome to `acquire`
//! 4. Decode while playing, idle while paused, until end of stream, error or
//!    release

use crate::error::{AudioError, Result};
use crate::pipeline::SamplePipeline;
use crate::reader::ChannelReader;
use crate::shared::SessionShared;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};
use radyo_core::{HandleId, NotificationSink, RadyoError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Decoded audio kept ahead of the output callback
const BUFFER_SECONDS: usize = 2;

/// Sleep while paused or while the buffer is full
const IDLE_WAIT: Duration = Duration::from_millis(10);

/// Undecodable packets tolerated before the first good one
const MAX_PRIMING_ERRORS: usize = 32;

/// Stream and output format, known once the session is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Codec short name, e.g. "mp3"
    pub codec: String,

    /// Stream sample rate
    pub source_rate: u32,

    /// Stream channel count
    pub source_channels: usize,

    /// Device sample rate
    pub output_rate: u32,

    /// Device channel count
    pub output_channels: usize,
}

impl SessionInfo {
    /// Whether samples are resampled on the way to the device
    pub fn is_resampled(&self) -> bool {
        self.source_rate != self.output_rate
    }
}

/// Everything the session thread needs, moved into it at spawn
pub(crate) struct SessionSetup {
    pub id: HandleId,
    pub reader: ChannelReader,
    pub hint: Hint,
    pub shared: Arc<SessionShared>,
    pub notifications: NotificationSink,
    pub ready: oneshot::Sender<Result<SessionInfo>>,
}

/// Session thread entry point
pub(crate) fn run(setup: SessionSetup) {
    let SessionSetup {
        id,
        reader,
        hint,
        shared,
        notifications,
        ready,
    } = setup;

    let session = match ActiveSession::open(reader, &hint, shared) {
        Ok(session) => session,
        Err(err) => {
            debug!(%id, error = %err, "Audio session setup failed");
            let _ = ready.send(Err(err));
            return;
        }
    };

    if ready.send(Ok(session.info.clone())).is_err() {
        debug!(%id, "Acquisition abandoned, closing audio session");
        return;
    }

    session.run(id, &notifications);
}

struct ActiveSession {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    pipeline: SamplePipeline,
    shared: Arc<SessionShared>,
    capacity: usize,
    info: SessionInfo,

    // Dropping the stream closes the device
    _stream: Stream,
}

impl ActiveSession {
    fn open(reader: ChannelReader, hint: &Hint, shared: Arc<SessionShared>) -> Result<Self> {
        let source = MediaSourceStream::new(Box::new(ReadOnlySource::new(reader)), Default::default());
        let probed = symphonia::default::get_probe().format(
            hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::UnsupportedFormat("no audio track in stream".into()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let codecs = symphonia::default::get_codecs();
        let codec = codecs
            .get_codec(params.codec)
            .map_or_else(|| "unknown".to_string(), |descriptor| descriptor.short_name.to_string());
        let mut decoder = codecs.make(&params, &DecoderOptions::default())?;

        let device = cpal::default_host()
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        // Codec parameters of live streams are often incomplete, so the
        // output is sized from the first decoded packet
        let mut errors = 0;
        let (pipeline, first_samples, info, config, sample_format) = loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(AudioError::Decode("stream ended before any audio".into()));
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) if errors < MAX_PRIMING_ERRORS => {
                    errors += 1;
                    debug!(msg, "Skipping undecodable packet while priming");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let source_channels = spec.channels.count();
            let (config, sample_format) = output_config(&device, source_channels as u16, spec.rate)?;

            let info = SessionInfo {
                codec: codec.clone(),
                source_rate: spec.rate,
                source_channels,
                output_rate: config.sample_rate.0,
                output_channels: config.channels as usize,
            };

            let mut pipeline = SamplePipeline::new(
                info.source_rate,
                info.source_channels,
                info.output_rate,
                info.output_channels,
            )?;
            let samples = pipeline.process(decoded)?;
            break (pipeline, samples, info, config, sample_format);
        };

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, &shared)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, &shared)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, &shared)?,
            other => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "output sample format {other:?}"
                )))
            }
        };
        // Runs from the start, silent until `playing` is set
        stream.play()?;

        shared.push_samples(first_samples);
        let capacity = info.output_rate as usize * info.output_channels * BUFFER_SECONDS;

        Ok(Self {
            format,
            decoder,
            track_id,
            pipeline,
            shared,
            capacity,
            info,
            _stream: stream,
        })
    }

    fn run(mut self, id: HandleId, notifications: &NotificationSink) {
        info!(
            %id,
            codec = %self.info.codec,
            source_rate = self.info.source_rate,
            output_rate = self.info.output_rate,
            channels = self.info.output_channels,
            "Audio session running"
        );

        let outcome = self.decode_loop();

        if self.shared.is_shut_down() {
            debug!(%id, "Audio session released");
            return;
        }

        match outcome {
            Ok(()) => {
                self.drain();
                if !self.shared.is_shut_down() {
                    info!(%id, "End of stream");
                    notifications.ended(id);
                }
            }
            Err(err) => {
                warn!(%id, error = %err, "Audio session failed");
                notifications.failed(id, RadyoError::from(err).to_string());
            }
        }
    }

    /// Decode until end of stream (`Ok`), release (`Ok`) or a fatal error
    fn decode_loop(&mut self) -> Result<()> {
        while !self.shared.is_shut_down() {
            if let Some(message) = self.shared.take_device_error() {
                return Err(AudioError::DeviceError(message));
            }

            if !self.shared.is_playing() || self.shared.buffered() >= self.capacity {
                thread::sleep(IDLE_WAIT);
                continue;
            }

            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(());
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained Ogg streams start a new logical stream per song
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let samples = self.pipeline.process(decoded)?;
                    self.shared.push_samples(samples);
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    debug!(msg, "Skipping undecodable packet");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Let the output callback play out what is already decoded
    fn drain(&self) {
        while !self.shared.is_shut_down() && self.shared.buffered() > 0 {
            if self.shared.take_device_error().is_some() {
                return;
            }
            thread::sleep(IDLE_WAIT);
        }
    }
}

/// Native stream format if the device takes it, device default otherwise
fn output_config(device: &Device, channels: u16, rate: u32) -> Result<(StreamConfig, SampleFormat)> {
    if let Ok(ranges) = device.supported_output_configs() {
        for range in ranges {
            if range.channels() == channels
                && range.sample_format() == SampleFormat::F32
                && range.min_sample_rate().0 <= rate
                && rate <= range.max_sample_rate().0
            {
                let supported = range.with_sample_rate(SampleRate(rate));
                return Ok((supported.config(), SampleFormat::F32));
            }
        }
    }

    let default = device.default_output_config()?;
    debug!(
        channels = default.channels(),
        rate = default.sample_rate().0,
        format = ?default.sample_format(),
        "Device does not take the stream format natively, converting"
    );
    Ok((default.config(), default.sample_format()))
}

fn build_stream<T>(device: &Device, config: &StreamConfig, shared: &Arc<SessionShared>) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let output = Arc::clone(shared);
    let errors = Arc::clone(shared);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| output.fill_output(data),
        move |err| {
            warn!(error = %err, "Audio output error");
            errors.set_device_error(err.to_string());
        },
        None,
    )?;

    Ok(stream)
}
