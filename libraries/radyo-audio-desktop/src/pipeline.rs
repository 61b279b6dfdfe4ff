//! Decoded audio to output format
//!
//! Every decoded packet goes through the same steps:
//!
//! 1. **Interleave** to f32 with Symphonia's `SampleBuffer`
//! 2. **Resample** with rubato when the device runs at another rate
//! 3. **Remix** to the device channel count (mono duplicated, extra
//!    channels dropped, down-mix to mono by averaging)

use crate::error::{AudioError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

/// Converts decoded packets into interleaved samples for the output stream
pub(crate) struct SamplePipeline {
    source_channels: usize,
    output_channels: usize,
    scratch: Option<SampleBuffer<f32>>,
    resampler: Option<ChunkResampler>,
}

impl SamplePipeline {
    pub fn new(
        source_rate: u32,
        source_channels: usize,
        output_rate: u32,
        output_channels: usize,
    ) -> Result<Self> {
        let resampler = if source_rate == output_rate {
            None
        } else {
            Some(ChunkResampler::new(source_rate, output_rate, source_channels)?)
        };

        Ok(Self {
            source_channels,
            output_channels,
            scratch: None,
            resampler,
        })
    }

    pub fn process(&mut self, decoded: AudioBufferRef<'_>) -> Result<Vec<f32>> {
        let spec = *decoded.spec();
        if spec.channels.count() != self.source_channels {
            return Err(AudioError::UnsupportedFormat(format!(
                "channel count changed mid-stream ({} -> {})",
                self.source_channels,
                spec.channels.count()
            )));
        }

        let needed = decoded.capacity() * self.source_channels;
        if self.scratch.as_ref().is_some_and(|buf| buf.capacity() < needed) {
            self.scratch = None;
        }
        let scratch = self
            .scratch
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        scratch.copy_interleaved_ref(decoded);

        let interleaved = match &mut self.resampler {
            Some(resampler) => resampler.process(scratch.samples())?,
            None => scratch.samples().to_vec(),
        };

        Ok(remix(&interleaved, self.source_channels, self.output_channels))
    }
}

/// rubato resampler fed with arbitrary packet sizes
///
/// `SincFixedIn` wants fixed-size chunks, so input frames are held back
/// until a full chunk is available.
struct ChunkResampler {
    inner: SincFixedIn<f32>,
    pending: Vec<Vec<f32>>,
}

impl ChunkResampler {
    fn new(source_rate: u32, output_rate: u32, channels: usize) -> Result<Self> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        // 100ms chunks
        let chunk_frames = (source_rate as usize / 10).max(64);
        let inner = SincFixedIn::<f32>::new(
            output_rate as f64 / source_rate as f64,
            1.0,
            params,
            chunk_frames,
            channels,
        )?;

        Ok(Self {
            inner,
            pending: vec![Vec::with_capacity(chunk_frames * 2); channels],
        })
    }

    fn process(&mut self, interleaved: &[f32]) -> Result<Vec<f32>> {
        let channels = self.pending.len();
        for frame in interleaved.chunks_exact(channels) {
            for (pending, sample) in self.pending.iter_mut().zip(frame) {
                pending.push(*sample);
            }
        }

        let mut output = Vec::new();
        loop {
            let needed = self.inner.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }

            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|pending| pending.drain(..needed).collect())
                .collect();
            let resampled = self.inner.process(&chunk, None)?;

            let frames = resampled.first().map_or(0, Vec::len);
            output.reserve(frames * channels);
            for frame in 0..frames {
                for channel in &resampled {
                    output.push(channel[frame]);
                }
            }
        }

        Ok(output)
    }
}

/// Change the channel count of interleaved samples
pub(crate) fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let mut output = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            output.push(frame.iter().sum::<f32>() / from as f32);
        } else if from == 1 {
            output.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            output.extend((0..to).map(|channel| frame.get(channel).copied().unwrap_or(0.0)));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remix_mono_to_stereo_duplicates() {
        assert_eq!(remix(&[0.1, 0.2], 1, 2), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn remix_stereo_to_mono_averages() {
        assert_eq!(remix(&[0.2, 0.4, -1.0, 1.0], 2, 1), vec![0.3, 0.0]);
    }

    #[test]
    fn remix_stereo_to_surround_pads_with_silence() {
        assert_eq!(remix(&[0.5, -0.5], 2, 4), vec![0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn remix_same_layout_is_identity() {
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(remix(&samples, 2, 2), samples.to_vec());
    }

    #[test]
    fn resampler_holds_back_partial_chunks() {
        let mut resampler = ChunkResampler::new(44_100, 48_000, 2).unwrap();
        let chunk = resampler.inner.input_frames_next();

        // Less than one chunk: nothing out yet
        let out = resampler.process(&vec![0.0; (chunk - 1) * 2]).unwrap();
        assert!(out.is_empty());

        // Completing the chunk produces stereo output at the higher rate
        let out = resampler.process(&[0.0; 2 * 2]).unwrap();
        assert!(!out.is_empty());
        assert_eq!(out.len() % 2, 0);
        assert_eq!(resampler.pending[0].len(), 1);
    }
}
