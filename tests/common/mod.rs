//! Shared fixtures: an in-memory resolver and a synthetic tone decoder

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use eqplayer::audio::{DecodedAudio, Decoder};
use eqplayer::config::PlayerConfig;
use eqplayer::error::{DecodeError, ResolveError};
use eqplayer::resolver::{MetadataResolver, TrackSource};
use eqplayer::{PlaybackOrchestrator, PlaybackState, TrackMetadata};

pub const RATE: u32 = 1_000;

/// What the decoder should do with a track's bytes
#[derive(Clone, Copy, Debug)]
pub enum Tone {
    Ok { ms: u64 },
    Slow { ms: u64, delay_ms: u64 },
    Broken,
}

impl Tone {
    fn encode(self) -> Vec<u8> {
        match self {
            Tone::Ok { ms } => format!("tone:{ms}"),
            Tone::Slow { ms, delay_ms } => format!("slow:{delay_ms}:{ms}"),
            Tone::Broken => "broken".to_string(),
        }
        .into_bytes()
    }

    fn duration_ms(self) -> u64 {
        match self {
            Tone::Ok { ms } | Tone::Slow { ms, .. } => ms,
            Tone::Broken => 1_000,
        }
    }
}

/// Decodes the textual tone descriptions written by [`Tone::encode`].
pub struct ToneDecoder;

impl Decoder for ToneDecoder {
    fn decode(&self, bytes: Vec<u8>, _extension: Option<&str>) -> Result<DecodedAudio, DecodeError> {
        let text = String::from_utf8(bytes).map_err(|e| DecodeError::Format(e.to_string()))?;
        let parts: Vec<&str> = text.split(':').collect();
        let ms: u64 = match parts.as_slice() {
            ["tone", ms] => ms.parse().map_err(|_| DecodeError::Format(text.clone()))?,
            ["slow", delay, ms] => {
                let delay: u64 = delay.parse().map_err(|_| DecodeError::Format(text.clone()))?;
                std::thread::sleep(Duration::from_millis(delay));
                ms.parse().map_err(|_| DecodeError::Format(text.clone()))?
            }
            _ => return Err(DecodeError::Format(format!("cannot decode '{text}'"))),
        };
        let frames = (ms * RATE as u64 / 1000) as usize;
        DecodedAudio::new(vec![0.5; frames * 2], RATE)
    }
}

/// Resolver over a fixed map of tracks that counts lookups.
#[derive(Default)]
pub struct MemoryResolver {
    tracks: HashMap<String, Tone>,
    resolved: Mutex<HashMap<String, usize>>,
}

impl MemoryResolver {
    pub fn with(tracks: &[(&str, Tone)]) -> Arc<Self> {
        Arc::new(Self {
            tracks: tracks.iter().map(|(id, tone)| (id.to_string(), *tone)).collect(),
            resolved: Mutex::new(HashMap::new()),
        })
    }

    pub fn resolve_count(&self, id: &str) -> usize {
        self.resolved.lock().get(id).copied().unwrap_or(0)
    }
}

impl MetadataResolver for MemoryResolver {
    fn resolve(&self, id: &str) -> Result<TrackMetadata, ResolveError> {
        let tone = self.tracks.get(id).ok_or_else(|| ResolveError::NotFound(id.to_string()))?;
        *self.resolved.lock().entry(id.to_string()).or_default() += 1;
        Ok(TrackMetadata {
            title: Some(format!("Title {id}")),
            artist: Some("Test Artist".to_string()),
            album: None,
            duration_ms: tone.duration_ms(),
            cover_art: None,
        })
    }

    fn open(&self, id: &str) -> Result<TrackSource, ResolveError> {
        let tone = self.tracks.get(id).ok_or_else(|| ResolveError::NotFound(id.to_string()))?;
        Ok(TrackSource {
            bytes: tone.encode(),
            extension: None,
        })
    }
}

pub fn config(autoplay: bool) -> PlayerConfig {
    PlayerConfig {
        poll_interval: Duration::from_millis(20),
        capture_size: 128,
        autoplay,
        ..Default::default()
    }
}

pub fn spawn(playlist: &[&str], resolver: Arc<MemoryResolver>, autoplay: bool) -> PlaybackOrchestrator {
    PlaybackOrchestrator::spawn(
        playlist.iter().map(|s| s.to_string()).collect(),
        resolver,
        Arc::new(ToneDecoder),
        config(autoplay),
    )
    .unwrap()
}

/// Wait until the published state satisfies `pred`, failing after a few seconds.
pub async fn wait_for(
    rx: &mut watch::Receiver<PlaybackState>,
    pred: impl Fn(&PlaybackState) -> bool,
) -> PlaybackState {
    let wait = async {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("orchestrator stopped");
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for state")
}
