//! Front-end state that never leaves the terminal UI

use std::time::{Duration, Instant};

const ERROR_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// UI state for the terminal front-end
#[derive(Clone, Debug)]
pub struct UiState {
    pub selected_band: usize,
    pub show_help_popup: bool,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    /// Last published player error the user already dismissed
    pub dismissed_error: Option<String>,
    pub should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected_band: 0,
            show_help_popup: false,
            error_message: None,
            error_timestamp: None,
            dismissed_error: None,
            should_quit: false,
        }
    }
}

impl UiState {
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        if let Some(message) = self.error_message.take() {
            self.dismissed_error = Some(message);
        }
        self.error_timestamp = None;
    }

    /// Surface a player error unless the user already dismissed that exact message.
    pub fn observe_player_error(&mut self, error: Option<&str>) {
        match error {
            Some(msg) if self.dismissed_error.as_deref() != Some(msg) => {
                if self.error_message.as_deref() != Some(msg) {
                    self.set_error(msg.to_string());
                }
            }
            Some(_) => {}
            None => self.dismissed_error = None,
        }
    }

    pub fn auto_clear_old_errors(&mut self) {
        if let Some(ts) = self.error_timestamp {
            if ts.elapsed() >= ERROR_DISPLAY_TIME {
                self.clear_error();
            }
        }
    }

    pub fn select_next_band(&mut self, band_count: usize) {
        if band_count > 0 {
            self.selected_band = (self.selected_band + 1).min(band_count - 1);
        }
    }

    pub fn select_previous_band(&mut self) {
        self.selected_band = self.selected_band.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismissed_player_error_stays_hidden() {
        let mut ui = UiState::default();
        ui.observe_player_error(Some("boom"));
        assert_eq!(ui.error_message.as_deref(), Some("boom"));
        ui.clear_error();
        ui.observe_player_error(Some("boom"));
        assert!(ui.error_message.is_none());
        ui.observe_player_error(None);
        ui.observe_player_error(Some("boom"));
        assert_eq!(ui.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn band_selection_is_bounded() {
        let mut ui = UiState::default();
        ui.select_previous_band();
        assert_eq!(ui.selected_band, 0);
        for _ in 0..10 {
            ui.select_next_band(5);
        }
        assert_eq!(ui.selected_band, 4);
    }
}
