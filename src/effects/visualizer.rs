//! Waveform capture at the play head

use std::sync::{Arc, Weak};

use crate::audio::AudioSession;
use crate::error::{PlayerError, Result};

pub const MIN_CAPTURE_SIZE: usize = 128;
pub const MAX_CAPTURE_SIZE: usize = 1024;

/// Clamp into the supported range and round down to a power of two.
pub fn normalize_capture_size(requested: usize) -> usize {
    let clamped = requested.clamp(MIN_CAPTURE_SIZE, MAX_CAPTURE_SIZE);
    1 << (usize::BITS - 1 - clamped.leading_zeros())
}

#[derive(Debug)]
pub struct Visualizer {
    session: Weak<AudioSession>,
    capture_size: usize,
}

impl Visualizer {
    pub fn bind(session: &Arc<AudioSession>, capture_size: usize) -> Result<Self> {
        if session.id().is_none() {
            return Err(PlayerError::EffectUnavailable(
                "visualizer needs a prepared session".to_string(),
            ));
        }
        Ok(Self {
            session: Arc::downgrade(session),
            capture_size: normalize_capture_size(capture_size),
        })
    }

    pub fn capture_size(&self) -> usize {
        self.capture_size
    }

    /// Post-equalizer mono snapshot, `capture_size` samples long.
    ///
    /// All zeros once the session is gone.
    pub fn capture(&self) -> Vec<i8> {
        let Some(session) = self.session.upgrade() else {
            return vec![0; self.capture_size];
        };

        let frames = session.frames_at_playhead(self.capture_size);
        let mut filters = session.insert_snapshot();
        frames
            .into_iter()
            .map(|(l, r)| {
                let (l, r) = match filters.as_mut() {
                    Some(bank) => bank.process(l, r),
                    None => (l, r),
                };
                quantize(0.5 * (l + r))
            })
            .collect()
    }

    pub fn release(&mut self) {
        self.session = Weak::new();
    }
}

fn quantize(sample: f32) -> i8 {
    (sample.clamp(-1.0, 1.0) * 127.0).round() as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudio;

    #[test]
    fn capture_size_is_a_bounded_power_of_two() {
        assert_eq!(normalize_capture_size(0), 128);
        assert_eq!(normalize_capture_size(1_000), 512);
        assert_eq!(normalize_capture_size(1_024), 1_024);
        assert_eq!(normalize_capture_size(70_000), 1_024);
    }

    #[test]
    fn captures_mono_mix_at_play_head() {
        let mut samples = vec![0.0; 512 * 2];
        for frame in samples.chunks_mut(2).skip(256) {
            frame[0] = 1.0;
            frame[1] = 0.0;
        }
        let session = AudioSession::open(DecodedAudio::new(samples, 1_000).unwrap());
        session.transport().seek(256);
        let viz = Visualizer::bind(&session, 128).unwrap();
        let wave = viz.capture();
        assert_eq!(wave.len(), 128);
        assert!(wave.iter().all(|&s| s == 64));
    }

    #[test]
    fn capture_after_session_drop_is_silent() {
        let session = AudioSession::open(DecodedAudio::new(vec![0.9; 4_000], 1_000).unwrap());
        let viz = Visualizer::bind(&session, 256).unwrap();
        drop(session);
        assert_eq!(viz.capture(), vec![0; 256]);
    }

    #[test]
    fn quantize_saturates() {
        assert_eq!(quantize(2.0), 127);
        assert_eq!(quantize(-2.0), -127);
        assert_eq!(quantize(0.0), 0);
    }
}
