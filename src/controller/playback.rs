//! Command handlers and the readiness callback

use crate::audio::{DecodedAudio, RenderingResource, StartMode};
use crate::effects::Preset;
use crate::error::{DecodeError, PlayerError, Result};
use crate::model::{PlayerPhase, TrackMetadata};
use crate::resolver::TrackSource;

use super::actor::{Actor, Message};

fn no_bands() -> PlayerError {
    PlayerError::InvalidCommand("no equalizer bands available".to_string())
}

impl Actor {
    pub(super) async fn load_track(&mut self, id: &str) -> Result<()> {
        let index = self.playlist.position_of(id);
        let start_mode = if self.config.autoplay {
            StartMode::AutoplayOnReady
        } else {
            StartMode::Paused
        };
        self.load(id, index, start_mode).await
    }

    pub(super) async fn advance(&mut self) -> Result<()> {
        let index = self.playlist.next_index();
        self.load_index(index).await
    }

    pub(super) async fn retreat(&mut self) -> Result<()> {
        let index = self.playlist.previous_index();
        self.load_index(index).await
    }

    /// Moving through the playlist always plays; the cursor only moves once
    /// the track resolved.
    async fn load_index(&mut self, index: usize) -> Result<()> {
        let id = self
            .playlist
            .get(index)
            .ok_or_else(|| PlayerError::InvalidCommand(format!("no track at index {index}")))?
            .to_string();
        self.load(&id, Some(index), StartMode::AutoplayOnReady).await
    }

    /// Resolve `id`, then replace the current resource with a fresh one.
    ///
    /// Nothing is touched until resolution succeeded.
    async fn load(&mut self, id: &str, index: Option<usize>, start_mode: StartMode) -> Result<()> {
        tracing::debug!(track_id = id, ?index, "Loading track");
        let (metadata, source) = self.resolve(id).await?;
        let mailbox = self.mailbox.upgrade().ok_or(PlayerError::Closed)?;

        self.release_current();
        self.generation = self.generation.next();
        self.completion_guard = None;
        let generation = self.generation;

        let resource = RenderingResource::load(
            generation,
            id,
            source.bytes,
            source.extension,
            self.decoder.clone(),
            start_mode,
            &self.tracker,
            move |generation, outcome| {
                // Runs on the blocking pool; hand the result back to the actor.
                if mailbox.blocking_send(Message::Prepared { generation, outcome }).is_err() {
                    tracing::debug!(%generation, "Orchestrator gone before track was prepared");
                }
            },
        );
        self.resource = Some(resource);
        if let Some(index) = index {
            self.playlist.select(index);
        }

        let track_index = self.playlist.index();
        let waveform = vec![0; self.effects.capture_size()];
        tracing::info!(track_id = id, %generation, title = metadata.display_title(), "Track loading");
        self.publisher.update(|state| {
            state.track_id = Some(id.to_string());
            state.track_index = track_index;
            state.duration_ms = metadata.duration_ms;
            state.track = Some(metadata);
            state.position_ms = 0;
            state.is_playing = false;
            state.phase = PlayerPhase::Loading;
            state.waveform = waveform;
            state.band_levels.clear();
            state.band_range = (0.0, 0.0);
            state.band_frequencies.clear();
            state.error = None;
        });
        Ok(())
    }

    async fn resolve(&self, id: &str) -> Result<(TrackMetadata, TrackSource)> {
        let resolver = self.resolver.clone();
        let owned = id.to_string();
        let resolved = tokio::task::spawn_blocking(move || {
            let metadata = resolver.resolve(&owned)?;
            let source = resolver.open(&owned)?;
            Ok::<_, PlayerError>((metadata, source))
        })
        .await
        .map_err(|e| PlayerError::ResourceUnavailable {
            track_id: id.to_string(),
            reason: e.to_string(),
        })?;

        if let Err(e) = &resolved {
            tracing::error!(track_id = id, error = %e, "Failed to resolve track");
        }
        resolved
    }

    /// Readiness callback, applied as its own serialized step.
    pub(super) fn on_prepared(
        &mut self,
        generation: crate::audio::Generation,
        outcome: std::result::Result<DecodedAudio, DecodeError>,
    ) {
        let Some(resource) = self.resource.as_mut().filter(|r| r.generation() == generation) else {
            tracing::warn!(%generation, current = %self.generation, "Ignoring readiness of a superseded track");
            return;
        };

        let prepared = outcome
            .map_err(|e| e.to_string())
            .and_then(|audio| resource.complete_preparation(audio).map_err(|e| e.to_string()));

        match prepared {
            Ok(session) => {
                self.effects.attach(&session, generation);
                let duration_ms = resource.duration_ms();
                let is_playing = resource.is_playing();
                let band_count = self.effects.band_count();
                let band_range = self.effects.band_range();
                let band_frequencies = self.effects.band_frequencies();
                self.publisher.update(|state| {
                    state.duration_ms = duration_ms;
                    state.is_playing = is_playing;
                    state.phase = if is_playing { PlayerPhase::Playing } else { PlayerPhase::Ready };
                    state.band_levels = vec![0.0; band_count];
                    state.band_range = band_range;
                    state.band_frequencies = band_frequencies;
                });
            }
            Err(reason) => {
                let track_id = resource.track_id().to_string();
                tracing::error!(track_id = %track_id, %generation, %reason, "Track could not be prepared");
                self.release_current();
                let error = PlayerError::ResourceUnavailable { track_id, reason };
                self.publisher.update(|state| {
                    state.is_playing = false;
                    state.position_ms = 0;
                    state.phase = PlayerPhase::Failed;
                    state.error = Some(error.to_string());
                });
            }
        }
    }

    pub(super) fn play_pause(&mut self) -> Result<()> {
        let Some(resource) = self.resource.as_mut() else {
            tracing::debug!("Play/pause with nothing loaded");
            return Ok(());
        };

        let state = self.publisher.current();
        // At the very end "pause" would be meaningless; play restarts instead.
        if resource.is_playing() && state.position_ms != state.duration_ms {
            resource.pause();
        } else {
            resource.play();
            self.completion_guard = None;
        }

        let is_playing = resource.is_playing();
        let position_ms = resource.current_position_ms();
        let phase = if resource.is_preparing() {
            PlayerPhase::Loading
        } else if is_playing {
            PlayerPhase::Playing
        } else {
            PlayerPhase::Paused
        };
        self.publisher.update(|state| {
            state.is_playing = is_playing;
            state.position_ms = position_ms;
            state.phase = phase;
        });
        Ok(())
    }

    pub(super) fn seek(&mut self, position_ms: u64) -> Result<()> {
        let Some(resource) = self.resource.as_mut() else {
            return Ok(());
        };
        resource.seek(position_ms);
        let position_ms = resource.current_position_ms();
        if position_ms < resource.duration_ms() {
            self.completion_guard = None;
        }
        self.publisher.update(|state| state.position_ms = position_ms);
        Ok(())
    }

    fn prepared_generation(&self) -> Result<crate::audio::Generation> {
        self.resource
            .as_ref()
            .filter(|r| r.is_prepared())
            .map(RenderingResource::generation)
            .ok_or_else(no_bands)
    }

    pub(super) fn change_band(&mut self, index: usize, level: f32) -> Result<()> {
        let generation = self.prepared_generation()?;
        let applied = self.effects.set_band_level(generation, index, level)?;
        self.publisher.update(|state| {
            if let Some(slot) = state.band_levels.get_mut(index) {
                *slot = applied;
            }
        });
        Ok(())
    }

    pub(super) fn apply_preset(&mut self, preset: Preset) -> Result<()> {
        let generation = self.prepared_generation()?;
        let levels = self.effects.apply_preset(generation, preset)?;
        tracing::info!(%preset, "Equalizer preset applied");
        self.publisher.update(|state| state.band_levels = levels);
        Ok(())
    }

    pub(super) fn suspend(&mut self) -> Result<()> {
        if let Some(resource) = self.resource.as_mut() {
            if resource.is_playing() {
                resource.pause();
                tracing::debug!("Playback suspended");
                self.publisher.update(|state| {
                    state.is_playing = false;
                    state.phase = PlayerPhase::Paused;
                });
            }
        }
        Ok(())
    }
}
