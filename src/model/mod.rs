//! Model module - Application state and data types
//!
//! - `state`: the published playback snapshot and track metadata
//! - `playlist`: fixed playlist with wrapping cursor
//! - `publisher`: single-writer broadcast cell for the snapshot
//! - `types`: terminal front-end state

mod state;
mod playlist;
mod publisher;
mod types;

pub use state::{PlaybackState, PlayerPhase, TrackMetadata};
pub use playlist::PlaylistController;
pub use publisher::StatePublisher;
pub use types::UiState;
