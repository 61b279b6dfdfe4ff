//! State shared between the network pump, the session thread and the
//! real-time audio callback

use cpal::{FromSample, Sample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Shared session state
///
/// The audio callback only ever takes the sample lock. Everything else is
/// flags or cold-path error slots.
#[derive(Debug, Default)]
pub(crate) struct SessionShared {
    /// Set once on release; every loop polls it
    shutdown: AtomicBool,

    /// Callback outputs silence and the decoder idles while false
    playing: AtomicBool,

    /// Decoded interleaved samples in output format
    samples: Mutex<VecDeque<f32>>,

    /// Why the network pump stopped early
    network_error: Mutex<Option<String>>,

    /// First error reported by the output device
    device_error: Mutex<Option<String>>,
}

impl SessionShared {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shut_down(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Number of samples waiting for the callback
    pub fn buffered(&self) -> usize {
        self.samples.lock().map_or(0, |samples| samples.len())
    }

    pub fn push_samples(&self, decoded: Vec<f32>) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.extend(decoded);
        }
    }

    pub fn set_network_error(&self, message: String) {
        if let Ok(mut slot) = self.network_error.lock() {
            slot.get_or_insert(message);
        }
    }

    pub fn network_error(&self) -> Option<String> {
        self.network_error.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn set_device_error(&self, message: String) {
        if let Ok(mut slot) = self.device_error.lock() {
            slot.get_or_insert(message);
        }
    }

    pub fn take_device_error(&self) -> Option<String> {
        self.device_error.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Fill an output buffer (runs on the real-time audio thread)
    ///
    /// Underruns and pauses are filled with silence.
    pub fn fill_output<T>(&self, output: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        if !self.is_playing() {
            output.fill(T::EQUILIBRIUM);
            return;
        }

        let Ok(mut samples) = self.samples.lock() else {
            output.fill(T::EQUILIBRIUM);
            return;
        };

        for out in output.iter_mut() {
            *out = match samples.pop_front() {
                Some(sample) => T::from_sample(sample),
                None => T::EQUILIBRIUM,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_output_is_silent_and_keeps_samples() {
        let shared = SessionShared::new();
        shared.push_samples(vec![0.5; 8]);

        let mut output = [1.0f32; 4];
        shared.fill_output(&mut output);
        assert_eq!(output, [0.0; 4]);
        assert_eq!(shared.buffered(), 8);
    }

    #[test]
    fn playing_output_drains_then_pads_with_silence() {
        let shared = SessionShared::new();
        shared.set_playing(true);
        shared.push_samples(vec![0.25, -0.25]);

        let mut output = [1.0f32; 4];
        shared.fill_output(&mut output);
        assert_eq!(output, [0.25, -0.25, 0.0, 0.0]);
        assert_eq!(shared.buffered(), 0);
    }

    #[test]
    fn converts_to_integer_output_formats() {
        let shared = SessionShared::new();
        shared.set_playing(true);
        shared.push_samples(vec![0.0, 1.0]);

        let mut output = [7i16; 3];
        shared.fill_output(&mut output);
        assert_eq!(output[0], 0);
        assert_eq!(output[1], i16::MAX);
        assert_eq!(output[2], 0);
    }

    #[test]
    fn shutdown_stops_playback() {
        let shared = SessionShared::new();
        shared.set_playing(true);
        shared.shut_down();
        assert!(shared.is_shut_down());
        assert!(!shared.is_playing());
    }

    #[test]
    fn keeps_first_error() {
        let shared = SessionShared::new();
        shared.set_device_error("unplugged".into());
        shared.set_device_error("second".into());
        assert_eq!(shared.take_device_error().as_deref(), Some("unplugged"));
        assert_eq!(shared.take_device_error(), None);
    }
}
