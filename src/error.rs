//! Error taxonomy for the player core
//!
//! Library code reports failures through [`PlayerError`]; the binary wraps them in
//! `anyhow` at the edge.

use thiserror::Error;

use crate::audio::Generation;

/// Failure to turn a track identifier into metadata or bytes.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("track not found: {0}")]
    NotFound(String),

    #[error("cannot read tags of {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("cannot read {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to decode track bytes into PCM.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported or corrupt stream: {0}")]
    Format(String),

    #[error("no playable audio track in stream")]
    NoAudioTrack,

    #[error("stream decoded to zero frames")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    /// Decode or prepare failure. The orchestrator stays usable.
    #[error("track {track_id} is unavailable: {reason}")]
    ResourceUnavailable { track_id: String, reason: String },

    /// Equalizer or visualizer could not be bound. Playback continues without it.
    #[error("audio effect unavailable: {0}")]
    EffectUnavailable(String),

    /// Rejected synchronously; no state was touched.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A mutation targeted an effect bound to a superseded resource.
    #[error("stale resource generation {actual} (current is {expected})")]
    StaleGeneration { expected: Generation, actual: Generation },

    #[error("orchestrator is shut down")]
    Closed,
}

impl PlayerError {
    /// Errors caused by the track or device rather than by the caller.
    ///
    /// These are worth a dismissible notice in the UI; the rest indicate a
    /// UI/state desync or a programming error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlayerError::ResourceUnavailable { .. }
                | PlayerError::EffectUnavailable(_)
                | PlayerError::Resolve(_)
        )
    }
}

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_errors_are_transient() {
        let err: PlayerError = ResolveError::NotFound("x".into()).into();
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "track not found: x");
    }

    #[test]
    fn invalid_command_is_not_transient() {
        let err = PlayerError::InvalidCommand("band 9 out of range".into());
        assert!(!err.is_transient());
        assert!(!PlayerError::Closed.is_transient());
    }
}
