//! Equalizer panel

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::PlaybackState;
use super::utils::{format_band_label, format_level_db};

/// Horizontal meter for `level` within `range`, centred on zero.
pub(crate) fn level_meter(level: f32, range: (f32, f32), width: usize) -> String {
    let (min, max) = range;
    if width == 0 || max <= min {
        return String::new();
    }
    let ratio = ((level - min) / (max - min)).clamp(0.0, 1.0);
    let filled = (ratio * width as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_equalizer(frame: &mut Frame, area: Rect, state: &PlaybackState, selected: usize) {
    let meter_width = area.width.saturating_sub(24) as usize;

    let lines: Vec<Line> = if state.band_levels.is_empty() {
        vec![Line::from(Span::styled(
            "Equalizer unavailable",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        state
            .band_levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                let style = if i == selected {
                    Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:>7} ", format_band_label(i, state.band_frequencies.get(i).copied())),
                        style,
                    ),
                    Span::styled(level_meter(level, state.band_range, meter_width), Style::default().fg(Color::Green)),
                    Span::raw(format!(" {:>9}", format_level_db(level))),
                ])
            })
            .collect()
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Equalizer (↑↓ select, +/- adjust, 1-4 presets) "),
    );
    frame.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_is_half_full_at_zero() {
        assert_eq!(level_meter(0.0, (-1_500.0, 1_500.0), 10), "█████░░░░░");
    }

    #[test]
    fn meter_saturates_and_tolerates_empty_range() {
        assert_eq!(level_meter(9_000.0, (-1_500.0, 1_500.0), 4), "████");
        assert_eq!(level_meter(0.0, (0.0, 0.0), 4), "");
    }
}
