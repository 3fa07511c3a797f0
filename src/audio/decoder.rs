//! Whole-track decoding into interleaved stereo PCM

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;

/// Decoded PCM for one track, interleaved stereo `f32` in `[-1.0, 1.0]`.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    /// `samples` must be interleaved stereo; a trailing half frame is dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Result<Self, DecodeError> {
        samples.truncate(samples.len() - samples.len() % 2);
        if samples.is_empty() || sample_rate == 0 {
            return Err(DecodeError::Empty);
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        (self.samples.len() / 2) as u64
    }

    pub fn duration_ms(&self) -> u64 {
        self.frames_to_ms(self.frames())
    }

    /// Stereo frame at `index`, silence past the end.
    pub fn frame(&self, index: u64) -> (f32, f32) {
        let i = index as usize * 2;
        match self.samples.get(i..i + 2) {
            Some(pair) => (pair[0], pair[1]),
            None => (0.0, 0.0),
        }
    }

    pub fn frames_to_ms(&self, frames: u64) -> u64 {
        frames * 1000 / self.sample_rate as u64
    }

    /// Frame index for `ms`, clamped to the end of the track.
    pub fn ms_to_frames(&self, ms: u64) -> u64 {
        let frames = ms as u128 * self.sample_rate as u128 / 1000;
        frames.min(self.frames() as u128) as u64
    }
}

/// Turns encoded track bytes into PCM.
///
/// Runs on the blocking pool; implementations may take as long as decoding takes.
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio, DecodeError>;
}

/// Decoder for everything symphonia's default registry understands.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio, DecodeError> {
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::Format(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let mut sample_rate = codec_params.sample_rate.unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Format(e.to_string()))?;

        let mut samples = Vec::new();
        let mut skipped_packets = 0usize;
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::Format(e.to_string())),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    let channels = spec.channels.count();
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    push_stereo(&mut samples, buf.samples(), channels);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    skipped_packets += 1;
                    tracing::debug!(error = %e, "Skipping undecodable packet");
                }
                Err(e) => return Err(DecodeError::Format(e.to_string())),
            }
        }

        if skipped_packets > 0 {
            tracing::warn!(skipped_packets, "Decoded track with corrupt packets");
        }
        tracing::debug!(frames = samples.len() / 2, sample_rate, "Track decoded");
        DecodedAudio::new(samples, sample_rate)
    }
}

/// Append `input` as stereo: mono is duplicated, channels past the second dropped.
fn push_stereo(out: &mut Vec<f32>, input: &[f32], channels: usize) {
    match channels {
        0 => {}
        1 => {
            out.reserve(input.len() * 2);
            for &s in input {
                out.push(s);
                out.push(s);
            }
        }
        n => {
            out.reserve(input.len() / n * 2);
            for frame in input.chunks_exact(n) {
                out.push(frame[0]);
                out.push(frame[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                let s = ((i as f32 * 0.05).sin() * 8_000.0) as i16;
                for _ in 0..channels {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_wav_to_stereo() {
        let bytes = wav_bytes(8_000, 1, 4_000);
        let audio = SymphoniaDecoder.decode(bytes, Some("wav")).unwrap();
        assert_eq!(audio.sample_rate(), 8_000);
        assert_eq!(audio.frames(), 4_000);
        assert_eq!(audio.duration_ms(), 500);
        let (l, r) = audio.frame(10);
        assert_eq!(l, r);
    }

    #[test]
    fn decodes_stereo_wav() {
        let bytes = wav_bytes(16_000, 2, 1_600);
        let audio = SymphoniaDecoder.decode(bytes, None).unwrap();
        assert_eq!(audio.duration_ms(), 100);
    }

    #[test]
    fn garbage_is_a_format_error() {
        let result = SymphoniaDecoder.decode(b"definitely not audio".to_vec(), Some("mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_pcm_is_rejected() {
        assert!(matches!(DecodedAudio::new(Vec::new(), 44_100), Err(DecodeError::Empty)));
    }

    #[test]
    fn frame_past_end_is_silence() {
        let audio = DecodedAudio::new(vec![0.5, -0.5], 1_000).unwrap();
        assert_eq!(audio.frame(0), (0.5, -0.5));
        assert_eq!(audio.frame(1), (0.0, 0.0));
    }

    #[test]
    fn ms_to_frames_is_clamped() {
        let audio = DecodedAudio::new(vec![0.0; 2_000], 1_000).unwrap();
        assert_eq!(audio.ms_to_frames(500), 500);
        assert_eq!(audio.ms_to_frames(5_000), 1_000);
        assert_eq!(audio.ms_to_frames(u64::MAX), 1_000);
    }

    #[test]
    fn push_stereo_drops_surround_channels() {
        let mut out = Vec::new();
        push_stereo(&mut out, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3);
        assert_eq!(out, vec![0.1, 0.2, 0.4, 0.5]);
    }
}
