//! Error banner and key reference overlays

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::model::UiState;

const KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Transport",
        &[
            ("Space", "play or pause"),
            ("n / p", "next / previous track"),
            ("← →", "seek 5 s"),
        ],
    ),
    (
        "Equalizer",
        &[
            ("↑ ↓", "pick a band"),
            ("+ -", "band level ±1 dB"),
            ("1-4", "flat, rock, jazz, pop"),
        ],
    ),
    ("Other", &[("h", "this reference"), ("q", "quit")]),
];

/// Banner pinned above the progress bar. Grows with the message, up to a third of the screen.
fn banner_area(area: Rect, lines: u16) -> Rect {
    let height = lines.saturating_add(3).min(area.height / 3).max(3).min(area.height);
    Rect {
        x: area.x + 1,
        y: area.bottom().saturating_sub(height + 3),
        width: area.width.saturating_sub(2),
        height,
    }
}

pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    let Some(message) = ui_state.error_message.as_deref() else {
        return;
    };
    let area = frame.area();
    let text_width = area.width.saturating_sub(4).max(1) as usize;
    let lines = message.chars().count().div_ceil(text_width) as u16;
    let banner = banner_area(area, lines.max(1));

    let body = vec![
        Line::from(Span::styled(message, Style::default().fg(Color::LightRed))),
        Line::from(Span::styled(
            "Enter or Esc to continue",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    frame.render_widget(Clear, banner);
    frame.render_widget(
        Paragraph::new(body).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::TOP | Borders::BOTTOM)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::Red))
                .title(Span::styled(" ! ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))),
        ),
        banner,
    );
}

pub fn render_help_popup(frame: &mut Frame) {
    let mut rows = Vec::new();
    for (group, bindings) in KEYS {
        rows.push(Row::new(vec![Cell::from(Span::styled(
            *group,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
        ))]));
        rows.extend(bindings.iter().map(|(key, action)| {
            Row::new(vec![
                Cell::from(Span::styled(*key, Style::default().fg(Color::Cyan))),
                Cell::from(*action),
            ])
        }));
    }

    let area = frame.area();
    let width = 40.min(area.width);
    let height = (rows.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    };

    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(10)])
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Keys ")
                .title_bottom(Line::from(" h / Esc ").right_aligned()),
        );

    frame.render_widget(Clear, popup);
    frame.render_widget(table, popup);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_stays_inside_the_screen() {
        let area = Rect::new(0, 0, 80, 24);
        let banner = banner_area(area, 50);
        assert_eq!(banner.height, 8);
        assert!(banner.bottom() <= area.bottom());
    }

    #[test]
    fn banner_on_a_tiny_terminal_does_not_underflow() {
        let area = Rect::new(0, 0, 10, 4);
        let banner = banner_area(area, 1);
        assert_eq!(banner.y, 0);
        assert_eq!(banner.width, 8);
    }
}
