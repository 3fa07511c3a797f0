//! Visualizer sparkline

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Sparkline},
    Frame,
};

/// Fold signed samples into one bar per column, by peak magnitude.
pub(crate) fn waveform_bars(waveform: &[i8], columns: usize) -> Vec<u64> {
    if waveform.is_empty() || columns == 0 {
        return Vec::new();
    }
    let chunk = waveform.len().div_ceil(columns);
    waveform
        .chunks(chunk)
        .map(|c| c.iter().map(|s| s.unsigned_abs() as u64).max().unwrap_or(0))
        .collect()
}

pub fn render_waveform(frame: &mut Frame, area: Rect, waveform: &[i8]) {
    let bars = waveform_bars(waveform, area.width.saturating_sub(2) as usize);
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(" Waveform "))
        .data(bars)
        .max(128)
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(sparkline, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_take_peak_magnitude() {
        let wave = [1, -5, 3, 0, -128, 2, 0, 0];
        assert_eq!(waveform_bars(&wave, 4), vec![5, 3, 128, 0]);
    }

    #[test]
    fn empty_inputs_make_no_bars() {
        assert!(waveform_bars(&[], 10).is_empty());
        assert!(waveform_bars(&[1, 2], 0).is_empty());
    }
}
