//! Orchestrator mailbox loop

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::Command;
use crate::audio::{DecodedAudio, Decoder, Generation, RenderingResource, ResourceTracker};
use crate::config::PlayerConfig;
use crate::effects::EffectsChain;
use crate::error::{DecodeError, Result};
use crate::model::{PlaybackState, PlaylistController, StatePublisher};
use crate::resolver::MetadataResolver;

pub(crate) enum Message {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Posted by a resource's readiness callback
    Prepared {
        generation: Generation,
        outcome: std::result::Result<DecodedAudio, DecodeError>,
    },
    Tick,
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Everything the orchestrator mutates. Only the actor task touches it.
pub(crate) struct Actor {
    rx: mpsc::Receiver<Message>,
    /// Weak so the mailbox closes once every handle is gone
    pub(super) mailbox: mpsc::WeakSender<Message>,
    pub(super) publisher: StatePublisher,
    pub(super) playlist: PlaylistController,
    pub(super) resolver: Arc<dyn MetadataResolver>,
    pub(super) decoder: Arc<dyn Decoder>,
    pub(super) config: PlayerConfig,
    pub(super) resource: Option<RenderingResource>,
    pub(super) effects: EffectsChain,
    /// Last generation handed to a resource
    pub(super) generation: Generation,
    pub(super) tracker: ResourceTracker,
    pub(super) poller: Option<JoinHandle<()>>,
    pub(super) poll_ticks: Arc<AtomicU64>,
    /// Generation whose end of track already triggered an advance
    pub(super) completion_guard: Option<Generation>,
}

impl Actor {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        rx: mpsc::Receiver<Message>,
        mailbox: mpsc::WeakSender<Message>,
        playlist: PlaylistController,
        resolver: Arc<dyn MetadataResolver>,
        decoder: Arc<dyn Decoder>,
        config: PlayerConfig,
        tracker: ResourceTracker,
        poll_ticks: Arc<AtomicU64>,
    ) -> Self {
        let publisher = StatePublisher::new(PlaybackState {
            track_index: playlist.index(),
            track_count: playlist.len(),
            ..Default::default()
        });
        let effects = EffectsChain::new(config.equalizer.clone(), config.capture_size);
        Self {
            rx,
            mailbox,
            publisher,
            playlist,
            resolver,
            decoder,
            config,
            resource: None,
            effects,
            generation: Generation::default(),
            tracker,
            poller: None,
            poll_ticks,
            completion_guard: None,
        }
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.publisher.subscribe()
    }

    pub(super) async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Command { command, reply } => {
                    let label = command.to_string();
                    let result = self.handle_command(command).await;
                    crate::log_command_result!(label, result);
                    let _ = reply.send(result);
                }
                Message::Prepared { generation, outcome } => self.on_prepared(generation, outcome),
                Message::Tick => self.on_tick().await,
                Message::Shutdown { done } => {
                    self.teardown();
                    let _ = done.send(());
                    return;
                }
            }
        }
        // Every handle dropped without an explicit shutdown
        self.teardown();
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::LoadTrack(id) => self.load_track(&id).await,
            Command::PlayPause => self.play_pause(),
            Command::SeekTo(ms) => self.seek(ms),
            Command::ChangeBand { index, level } => self.change_band(index, level),
            Command::Advance => self.advance().await,
            Command::Retreat => self.retreat().await,
            Command::StartPolling => self.start_polling(),
            Command::ApplyPreset(preset) => self.apply_preset(preset),
            Command::Suspend => self.suspend(),
        }
    }

    /// Stop, detach effects, then free the current resource.
    pub(super) fn release_current(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.pause();
            self.effects.release();
            resource.release();
        } else {
            self.effects.release();
        }
    }

    fn teardown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.release_current();
        self.rx.close();
        tracing::info!("Playback orchestrator stopped");
    }
}
