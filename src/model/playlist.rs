//! Fixed playlist with a wrapping cursor

use crate::error::{PlayerError, Result};

#[derive(Clone, Debug)]
pub struct PlaylistController {
    tracks: Vec<String>,
    index: usize,
}

impl PlaylistController {
    /// Empty playlists are rejected.
    pub fn new(tracks: Vec<String>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlayerError::InvalidCommand("playlist is empty".to_string()));
        }
        Ok(Self { tracks, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &str {
        &self.tracks[self.index]
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t == id)
    }

    pub fn next_index(&self) -> usize {
        (self.index + 1) % self.tracks.len()
    }

    pub fn previous_index(&self) -> usize {
        (self.index + self.tracks.len() - 1) % self.tracks.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tracks.get(index).map(String::as_str)
    }

    /// Move the cursor to `index`, ignoring out-of-range values.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self) -> &str {
        self.index = self.next_index();
        self.current()
    }

    pub fn retreat(&mut self) -> &str {
        self.index = self.previous_index();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn abc() -> PlaylistController {
        PlaylistController::new(vec!["a".into(), "b".into(), "c".into()]).unwrap()
    }

    #[test]
    fn empty_playlist_is_rejected() {
        assert!(matches!(
            PlaylistController::new(Vec::new()),
            Err(PlayerError::InvalidCommand(_))
        ));
    }

    #[test]
    fn retreat_from_first_wraps_to_last() {
        let mut playlist = abc();
        assert_eq!(playlist.retreat(), "c");
        assert_eq!(playlist.index(), 2);
    }

    #[test]
    fn advance_from_last_wraps_to_first() {
        let mut playlist = abc();
        playlist.select(2);
        assert_eq!(playlist.advance(), "a");
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut playlist = abc();
        assert!(!playlist.select(3));
        assert_eq!(playlist.index(), 0);
    }

    #[test]
    fn single_track_wraps_onto_itself() {
        let mut playlist = PlaylistController::new(vec!["only".into()]).unwrap();
        assert_eq!(playlist.advance(), "only");
        assert_eq!(playlist.retreat(), "only");
    }

    proptest! {
        #[test]
        fn advancing_len_times_returns_home(len in 1usize..40, start in 0usize..40) {
            let tracks = (0..len).map(|i| i.to_string()).collect();
            let mut playlist = PlaylistController::new(tracks).unwrap();
            playlist.select(start % len);
            let home = playlist.index();
            for _ in 0..len {
                playlist.advance();
            }
            prop_assert_eq!(playlist.index(), home);
        }

        #[test]
        fn retreat_undoes_advance(len in 1usize..40, start in 0usize..40) {
            let tracks = (0..len).map(|i| i.to_string()).collect();
            let mut playlist = PlaylistController::new(tracks).unwrap();
            playlist.select(start % len);
            let home = playlist.index();
            playlist.advance();
            playlist.retreat();
            prop_assert_eq!(playlist.index(), home);
        }
    }
}
