//! One decode+playback session for one track

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::decoder::{DecodedAudio, Decoder};
use super::session::{AudioSession, SessionId};
use crate::error::{DecodeError, PlayerError, Result};

/// Tag distinguishing successive resources; later loads get larger values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do once preparation finishes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartMode {
    #[default]
    AutoplayOnReady,
    Paused,
}

/// Counts resources that have been constructed and not yet dropped.
#[derive(Clone, Debug, Default)]
pub struct ResourceTracker(Arc<AtomicUsize>);

impl ResourceTracker {
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

enum Stage {
    Preparing,
    Ready(Arc<AudioSession>),
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Completion {
    Armed,
    Pending,
    Fired,
}

pub struct RenderingResource {
    generation: Generation,
    track_id: String,
    start_mode: StartMode,
    stage: Stage,
    completion: Completion,
    tracker: ResourceTracker,
    #[cfg(feature = "device-output")]
    output: Option<super::device::DeviceOutput>,
}

impl RenderingResource {
    /// Begin preparing `bytes` on the blocking pool.
    ///
    /// `on_ready` runs exactly once, from the decoding thread, with the outcome
    /// tagged by this resource's generation. It must not touch shared state
    /// directly; post the outcome back to the owner instead.
    #[allow(clippy::too_many_arguments)]
    pub fn load<F>(
        generation: Generation,
        track_id: impl Into<String>,
        bytes: Vec<u8>,
        extension: Option<String>,
        decoder: Arc<dyn Decoder>,
        start_mode: StartMode,
        tracker: &ResourceTracker,
        on_ready: F,
    ) -> Self
    where
        F: FnOnce(Generation, std::result::Result<DecodedAudio, DecodeError>) + Send + 'static,
    {
        let track_id = track_id.into();
        tracker.0.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%generation, track_id = %track_id, bytes = bytes.len(), "Preparing track");

        tokio::task::spawn_blocking(move || {
            let outcome = decoder.decode(bytes, extension.as_deref());
            on_ready(generation, outcome);
        });

        Self {
            generation,
            track_id,
            start_mode,
            stage: Stage::Preparing,
            completion: Completion::Armed,
            tracker: tracker.clone(),
            #[cfg(feature = "device-output")]
            output: None,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self.stage, Stage::Preparing)
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.stage, Stage::Ready(_))
    }

    fn session_ref(&self) -> Option<&Arc<AudioSession>> {
        match &self.stage {
            Stage::Ready(session) => Some(session),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<Arc<AudioSession>> {
        self.session_ref().cloned()
    }

    /// Zero until preparation has finished.
    pub fn session_id(&self) -> SessionId {
        self.session_ref().map(|s| s.id()).unwrap_or(SessionId::NONE)
    }

    /// Install decoded PCM and honour the start mode.
    pub fn complete_preparation(&mut self, audio: DecodedAudio) -> Result<Arc<AudioSession>> {
        if !self.is_preparing() {
            return Err(PlayerError::ResourceUnavailable {
                track_id: self.track_id.clone(),
                reason: "resource is not preparing".to_string(),
            });
        }

        let session = AudioSession::open(audio);
        tracing::info!(
            generation = %self.generation,
            session = %session.id(),
            duration_ms = session.audio().duration_ms(),
            "Track prepared"
        );

        #[cfg(feature = "device-output")]
        {
            self.output = match super::device::DeviceOutput::open(session.clone()) {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::warn!(error = %e, "Device output unavailable, playing silently");
                    None
                }
            };
        }

        if self.start_mode == StartMode::AutoplayOnReady {
            session.transport().start();
        }
        self.stage = Stage::Ready(session.clone());
        Ok(session)
    }

    pub fn play(&mut self) {
        match &self.stage {
            Stage::Preparing => self.start_mode = StartMode::AutoplayOnReady,
            Stage::Ready(session) => {
                let transport = session.transport();
                if transport.position_frames() >= transport.total_frames() {
                    transport.seek(0);
                }
                transport.start();
                self.completion = Completion::Armed;
            }
            Stage::Released => {}
        }
    }

    pub fn pause(&mut self) {
        match &self.stage {
            Stage::Preparing => self.start_mode = StartMode::Paused,
            Stage::Ready(session) => session.transport().pause(),
            Stage::Released => {}
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session_ref().is_some_and(|s| s.transport().is_running())
    }

    /// Clamped to `[0, duration]`.
    pub fn seek(&mut self, ms: u64) {
        if let Some(session) = self.session_ref() {
            let frame = session.audio().ms_to_frames(ms);
            session.transport().seek(frame);
            if frame < session.transport().total_frames() {
                self.completion = Completion::Armed;
            }
        }
    }

    pub fn current_position_ms(&mut self) -> u64 {
        let Some(session) = self.session_ref() else {
            return 0;
        };
        let ended = session.transport().stop_at_end();
        let position = session.audio().frames_to_ms(session.transport().position_frames());
        if ended && self.completion == Completion::Armed {
            tracing::debug!(generation = %self.generation, "Track reached its end");
            self.completion = Completion::Pending;
        }
        position
    }

    pub fn duration_ms(&self) -> u64 {
        self.session_ref().map(|s| s.audio().duration_ms()).unwrap_or(0)
    }

    /// True exactly once per natural end of track.
    pub fn take_completion(&mut self) -> bool {
        if self.completion == Completion::Pending {
            self.completion = Completion::Fired;
            true
        } else {
            false
        }
    }

    /// Stop and free the decoded stream. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Stage::Ready(session) = &self.stage {
            session.transport().pause();
            session.clear_insert();
        }
        #[cfg(feature = "device-output")]
        {
            self.output = None;
        }
        if !matches!(self.stage, Stage::Released) {
            tracing::debug!(generation = %self.generation, track_id = %self.track_id, "Resource released");
        }
        self.stage = Stage::Released;
    }
}

impl Drop for RenderingResource {
    fn drop(&mut self) {
        self.release();
        self.tracker.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for RenderingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingResource")
            .field("generation", &self.generation)
            .field("track_id", &self.track_id)
            .field("session", &self.session_id())
            .finish()
    }
}
