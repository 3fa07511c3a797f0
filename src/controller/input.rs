//! Key event handling

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::Mutex;

use super::PlaybackOrchestrator;
use crate::effects::Preset;
use crate::error::PlayerError;
use crate::model::{PlaybackState, UiState};

const SEEK_STEP_MS: u64 = 5_000;
const BAND_STEP_MB: f32 = 100.0;

/// Translates terminal input into orchestrator commands.
#[derive(Clone)]
pub struct AppController {
    orchestrator: PlaybackOrchestrator,
    ui: Arc<Mutex<UiState>>,
    pause_on_focus_lost: bool,
}

impl AppController {
    pub fn new(orchestrator: PlaybackOrchestrator, pause_on_focus_lost: bool) -> Self {
        Self {
            orchestrator,
            ui: Arc::new(Mutex::new(UiState::default())),
            pause_on_focus_lost,
        }
    }

    /// Fold the latest player state into the UI and return a snapshot to draw.
    pub async fn observe_state(&self, state: &PlaybackState) -> UiState {
        let mut ui = self.ui.lock().await;
        ui.observe_player_error(state.error.as_deref());
        ui.auto_clear_old_errors();
        ui.clone()
    }

    fn format_error(error: &PlayerError) -> String {
        match error {
            PlayerError::Resolve(e) => format!("Cannot open track: {e}"),
            PlayerError::ResourceUnavailable { .. } => format!("Playback failed: {error}"),
            PlayerError::EffectUnavailable(_) => format!("Effects unavailable: {error}"),
            other => format!("Error: {other}"),
        }
    }

    /// Popup text for errors the listener should see, `None` for the rest.
    fn notice_for(error: &PlayerError) -> Option<String> {
        error.is_transient().then(|| Self::format_error(error))
    }

    pub async fn report(&self, result: crate::error::Result<()>) {
        let Err(e) = result else { return };
        match Self::notice_for(&e) {
            Some(notice) => {
                tracing::warn!(error = %e, "Command failed");
                self.ui.lock().await.set_error(notice);
            }
            None => tracing::debug!(error = %e, "Command rejected"),
        }
    }

    pub async fn handle_focus_lost(&self) {
        if self.pause_on_focus_lost {
            tracing::debug!("Terminal lost focus, suspending playback");
            let result = self.orchestrator.suspend().await;
            self.report(result).await;
        }
    }

    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        {
            let mut ui = self.ui.lock().await;

            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                ui.should_quit = true;
                return Ok(());
            }

            // Error message first (blocks all other interactions)
            if ui.error_message.is_some() {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                    ui.clear_error();
                }
                return Ok(());
            }

            if ui.show_help_popup {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                    ui.show_help_popup = false;
                }
                return Ok(());
            }
        }

        let state = self.orchestrator.state();
        let result = match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.ui.lock().await.should_quit = true;
                Ok(())
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.ui.lock().await.show_help_popup = true;
                Ok(())
            }
            KeyCode::Char(' ') => self.orchestrator.play_pause().await,
            KeyCode::Char('n') | KeyCode::Char('N') => self.orchestrator.advance().await,
            KeyCode::Char('p') | KeyCode::Char('P') => self.orchestrator.retreat().await,
            KeyCode::Left => {
                self.orchestrator
                    .seek(state.position_ms.saturating_sub(SEEK_STEP_MS))
                    .await
            }
            KeyCode::Right => {
                self.orchestrator
                    .seek(state.position_ms.saturating_add(SEEK_STEP_MS))
                    .await
            }
            KeyCode::Up => {
                self.ui.lock().await.select_previous_band();
                Ok(())
            }
            KeyCode::Down => {
                self.ui.lock().await.select_next_band(state.band_count());
                Ok(())
            }
            KeyCode::Char(c @ ('+' | '=' | '-' | '_')) => {
                let step = if matches!(c, '+' | '=') { BAND_STEP_MB } else { -BAND_STEP_MB };
                let index = self.ui.lock().await.selected_band;
                match state.band_levels.get(index) {
                    Some(level) => self.orchestrator.change_band(index, level + step).await,
                    None => Ok(()),
                }
            }
            KeyCode::Char(c @ '1'..='4') => {
                let preset = Preset::ALL[c as usize - '1' as usize];
                self.orchestrator.apply_preset(preset).await
            }
            _ => Ok(()),
        };

        self.report(result).await;
        Ok(())
    }
}
