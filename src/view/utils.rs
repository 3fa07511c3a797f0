//! Formatting helpers shared by the widgets

pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Slider label for a band: "60Hz", "3.6kHz", or "Band N" when the centre is unknown.
pub fn format_band_label(index: usize, frequency_hz: Option<u32>) -> String {
    match frequency_hz {
        Some(0) | None => format!("Band {}", index + 1),
        Some(hz) if hz >= 1000 => {
            let khz = hz as f64 / 1000.0;
            if hz % 1000 == 0 {
                format!("{}kHz", hz / 1000)
            } else {
                format!("{:.1}kHz", khz)
            }
        }
        Some(hz) => format!("{}Hz", hz),
    }
}

/// Millibels as signed decibels, e.g. "+3.0 dB"
pub fn format_level_db(level_mb: f32) -> String {
    format!("{:+.1} dB", level_mb / 100.0)
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
