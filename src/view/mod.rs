//! View module - UI rendering
//!
//! This module renders the published playback state with ratatui:
//!
//! - `utils`: shared formatting helpers
//! - `now_playing`: track metadata and playlist position
//! - `waveform`: visualizer sparkline
//! - `equalizer`: band levels with the selected band highlighted
//! - `progress`: progress bar
//! - `overlays`: modal overlays (error, help)

mod equalizer;
mod now_playing;
mod overlays;
mod progress;
mod utils;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{PlaybackState, UiState};

pub use utils::{format_band_label, format_duration};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, state: &PlaybackState, ui_state: &UiState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Now playing
                Constraint::Min(6),    // Waveform + equalizer
                Constraint::Length(3), // Progress bar
            ])
            .split(frame.area());

        now_playing::render_now_playing(frame, chunks[0], state);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        waveform::render_waveform(frame, middle[0], &state.waveform);
        equalizer::render_equalizer(frame, middle[1], state, ui_state.selected_band);
        progress::render_progress_bar(frame, chunks[2], state);

        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }
        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
