//! Playback state snapshot observed by the presentation layer

use serde::Serialize;

/// Metadata about a resolved track
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: u64,
    #[serde(skip)]
    pub cover_art: Option<Vec<u8>>,
}

impl TrackMetadata {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Audio")
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or("Unknown Album")
    }
}

/// Where the current track is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPhase {
    /// Nothing has been loaded yet
    #[default]
    Idle,
    Loading,
    /// Prepared but not started
    Ready,
    Playing,
    Paused,
    /// Reached the end; the playlist advances on the same poll tick
    Completed,
    /// The last load could not be prepared
    Failed,
}

/// One immutable snapshot of everything the UI renders.
///
/// A new value replaces the previous one on every observable change.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub track_id: Option<String>,
    pub track_index: usize,
    pub track_count: usize,
    pub track: Option<TrackMetadata>,
    pub duration_ms: u64,
    pub position_ms: u64,
    pub is_playing: bool,
    pub phase: PlayerPhase,
    #[serde(skip)]
    pub waveform: Vec<i8>,
    pub band_levels: Vec<f32>,
    pub band_range: (f32, f32),
    pub band_frequencies: Vec<u32>,
    pub error: Option<String>,
}

impl PlaybackState {
    /// Progress through the current track in `[0.0, 1.0]`
    pub fn progress_ratio(&self) -> f64 {
        if self.duration_ms > 0 {
            (self.position_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn band_count(&self) -> usize {
        self.band_levels.len()
    }

    /// Pull position back inside the known duration.
    ///
    /// A poll racing a reload can read a position from the previous track.
    pub(crate) fn reconcile(&mut self) {
        if self.duration_ms > 0 && self.position_ms > self.duration_ms {
            self.position_ms = self.duration_ms;
        }
        if self.band_frequencies.len() != self.band_levels.len() {
            self.band_frequencies.resize(self.band_levels.len(), 0);
        }
    }
}
