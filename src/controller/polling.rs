//! Background poller and tick handling

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::model::PlayerPhase;

use super::actor::{Actor, Message};

/// Post a `Tick` every `period` until the mailbox closes.
///
/// A full mailbox drops the tick rather than queueing a backlog.
fn spawn_poller(mailbox: mpsc::WeakSender<Message>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(tx) = mailbox.upgrade() else { break };
            match tx.try_send(Message::Tick) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => tracing::trace!("Mailbox full, skipping poll tick"),
                Err(TrySendError::Closed(_)) => break,
            }
        }
        tracing::debug!("Poller stopped");
    })
}

impl Actor {
    pub(super) fn start_polling(&mut self) -> Result<()> {
        if self.poller.as_ref().is_some_and(|p| !p.is_finished()) {
            tracing::debug!("Poller already running");
            return Ok(());
        }
        tracing::info!(interval_ms = self.config.poll_interval.as_millis() as u64, "Starting poller");
        self.poller = Some(spawn_poller(self.mailbox.clone(), self.config.poll_interval));
        Ok(())
    }

    /// Sample position and waveform, publish, then check for end of track.
    ///
    /// Never fails: a tick racing a teardown reads zeros, and a failed advance
    /// is logged.
    pub(super) async fn on_tick(&mut self) {
        self.poll_ticks.fetch_add(1, Ordering::Relaxed);

        let (position_ms, duration_ms, is_playing, latched, prepared) = match self.resource.as_mut() {
            Some(resource) => {
                let position = resource.current_position_ms();
                (
                    position,
                    resource.duration_ms(),
                    resource.is_playing(),
                    resource.take_completion(),
                    resource.is_prepared(),
                )
            }
            None => (0, 0, false, false, false),
        };
        let waveform = is_playing.then(|| self.effects.capture_waveform());
        let ended = latched || (duration_ms > 0 && position_ms >= duration_ms);
        tracing::trace!(position_ms, duration_ms, is_playing, ended, "Poll tick");

        self.publisher.update(|state| {
            state.position_ms = position_ms;
            if let Some(waveform) = waveform {
                state.waveform = waveform;
            }
            if prepared {
                state.is_playing = is_playing;
                state.phase = if is_playing {
                    PlayerPhase::Playing
                } else if ended {
                    PlayerPhase::Completed
                } else if state.phase == PlayerPhase::Playing {
                    PlayerPhase::Paused
                } else {
                    state.phase
                };
            }
        });

        if !ended || self.completion_guard == Some(self.generation) {
            return;
        }
        self.completion_guard = Some(self.generation);
        tracing::info!(generation = %self.generation, "Track finished, advancing");
        if let Err(e) = self.advance().await {
            tracing::error!(error = %e, "Auto-advance failed");
        }
    }
}
