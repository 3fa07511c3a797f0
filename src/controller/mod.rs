//! Controller module - the playback orchestrator and terminal input
//!
//! The orchestrator is an actor: one task owns the published state, the
//! current rendering resource, the effects chain and the playlist, and applies
//! messages from its mailbox one at a time.
//!
//! - `command`: inbound commands and their textual form
//! - `actor`: mailbox loop and the state it owns
//! - `playback`: command handlers and the readiness callback
//! - `polling`: the background poller and tick handling
//! - `input`: key event handling for the terminal UI

mod actor;
mod command;
mod input;
mod playback;
mod polling;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

pub use command::Command;
pub use input::AppController;

use crate::audio::{Decoder, ResourceTracker};
use crate::config::PlayerConfig;
use crate::effects::Preset;
use crate::error::{PlayerError, Result};
use crate::model::{PlaybackState, PlaylistController};
use crate::resolver::MetadataResolver;
use actor::{Actor, Message};

const MAILBOX_CAPACITY: usize = 64;

/// Counters exposed for tests and the status line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Rendering resources constructed and not yet dropped
    pub live_resources: usize,
    /// Poll ticks handled since start
    pub poll_ticks: u64,
}

/// Cloneable handle to the orchestrator task.
#[derive(Clone)]
pub struct PlaybackOrchestrator {
    tx: mpsc::Sender<Message>,
    state: watch::Receiver<PlaybackState>,
    tracker: ResourceTracker,
    poll_ticks: Arc<AtomicU64>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlaybackOrchestrator {
    /// Start the orchestrator task on the current runtime.
    ///
    /// Fails with `InvalidCommand` when the playlist is empty.
    pub fn spawn(
        playlist: Vec<String>,
        resolver: Arc<dyn MetadataResolver>,
        decoder: Arc<dyn Decoder>,
        config: PlayerConfig,
    ) -> Result<Self> {
        let playlist = PlaylistController::new(playlist)?;
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let tracker = ResourceTracker::default();
        let poll_ticks = Arc::new(AtomicU64::new(0));

        let actor = Actor::new(
            rx,
            tx.downgrade(),
            playlist,
            resolver,
            decoder,
            config,
            tracker.clone(),
            poll_ticks.clone(),
        );
        let state = actor.subscribe();
        tracing::info!(tracks = state.borrow().track_count, "Starting playback orchestrator");
        let task = tokio::spawn(actor.run());

        Ok(Self {
            tx,
            state,
            tracker,
            poll_ticks,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Queue `command` and wait for the orchestrator to apply it.
    pub async fn send(&self, command: Command) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Command { command, reply })
            .await
            .map_err(|_| PlayerError::Closed)?;
        rx.await.map_err(|_| PlayerError::Closed)?
    }

    pub async fn load_track(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::LoadTrack(id.into())).await
    }

    pub async fn play_pause(&self) -> Result<()> {
        self.send(Command::PlayPause).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        self.send(Command::SeekTo(position_ms)).await
    }

    pub async fn change_band(&self, index: usize, level: f32) -> Result<()> {
        self.send(Command::ChangeBand { index, level }).await
    }

    pub async fn advance(&self) -> Result<()> {
        self.send(Command::Advance).await
    }

    pub async fn retreat(&self) -> Result<()> {
        self.send(Command::Retreat).await
    }

    pub async fn start_polling(&self) -> Result<()> {
        self.send(Command::StartPolling).await
    }

    pub async fn apply_preset(&self, preset: Preset) -> Result<()> {
        self.send(Command::ApplyPreset(preset)).await
    }

    pub async fn suspend(&self) -> Result<()> {
        self.send(Command::Suspend).await
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            live_resources: self.tracker.live(),
            poll_ticks: self.poll_ticks.load(Ordering::Relaxed),
        }
    }

    /// Stop polling, release the current track and wait for the task to end.
    ///
    /// Later commands fail with `Closed`. Calling this twice is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        if self.tx.send(Message::Shutdown { done }).await.is_ok() {
            let _ = rx.await;
        }
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Orchestrator task failed");
            }
        }
        Ok(())
    }
}
