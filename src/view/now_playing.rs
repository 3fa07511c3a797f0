//! Track metadata panel

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::PlaybackState;
use super::utils::truncate_string;

pub fn render_now_playing(frame: &mut Frame, area: Rect, state: &PlaybackState) {
    let width = area.width.saturating_sub(14) as usize;
    let label = |text: &'static str| Span::styled(format!("{:>9}  ", text), Style::default().fg(Color::DarkGray));

    let lines = match &state.track {
        Some(track) => {
            let art = match &track.cover_art {
                Some(bytes) => format!("embedded ({} KiB)", bytes.len().div_ceil(1024)),
                None => "none".to_string(),
            };
            vec![
                Line::from(vec![
                    label("Title"),
                    Span::styled(
                        truncate_string(track.display_title(), width),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![label("Artist"), Span::raw(truncate_string(track.display_artist(), width))]),
                Line::from(vec![label("Album"), Span::raw(truncate_string(track.display_album(), width))]),
                Line::from(vec![label("Cover art"), Span::styled(art, Style::default().fg(Color::DarkGray))]),
            ]
        }
        None => vec![Line::from(Span::styled(
            "Nothing loaded. Press n to start the playlist.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let title = match &state.track_id {
        Some(id) => format!(" Now Playing: {} ", id),
        None => " Now Playing ".to_string(),
    };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(panel, area);
}
