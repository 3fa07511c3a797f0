//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{PlaybackState, PlayerPhase};
use super::utils::format_duration;

fn phase_label(phase: PlayerPhase) -> &'static str {
    match phase {
        PlayerPhase::Idle => "Idle",
        PlayerPhase::Loading => "Loading",
        PlayerPhase::Ready => "Ready",
        PlayerPhase::Playing => "Playing",
        PlayerPhase::Paused => "Paused",
        PlayerPhase::Completed => "Completed",
        PlayerPhase::Failed => "Failed",
    }
}

pub fn render_progress_bar(frame: &mut Frame, area: Rect, state: &PlaybackState) {
    let icon = if state.is_playing { "▶" } else { "⏸" };
    let title = match &state.track {
        Some(track) => format!(" {} {} ", icon, track.display_title()),
        None => " No track loaded ".to_string(),
    };

    let time_str = format!(
        "{} / {}",
        format_duration(state.position_ms),
        format_duration(state.duration_ms)
    );
    let status = format!(
        " {} | Track {}/{} ",
        phase_label(state.phase),
        state.track_index + 1,
        state.track_count
    );

    let color = match state.phase {
        PlayerPhase::Failed => Color::Red,
        PlayerPhase::Loading => Color::Yellow,
        _ => Color::Green,
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(status).right_aligned()),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(state.progress_ratio())
        .label(time_str);

    frame.render_widget(gauge, area);
}
