//! Playlist audio player with a multi-band equalizer and a waveform visualizer.
//!
//! [`controller::PlaybackOrchestrator`] owns playback and publishes one
//! [`model::PlaybackState`] that front-ends subscribe to.

pub mod audio;
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod view;

pub use controller::{Command, Diagnostics, PlaybackOrchestrator};
pub use error::{PlayerError, Result};
pub use model::{PlaybackState, PlayerPhase, TrackMetadata};
