//! Audio rendering: decoding, sessions, and the per-track resource
//!
//! - `decoder`: encoded bytes to PCM
//! - `session`: prepared PCM with its transport clock
//! - `resource`: lifecycle of one track's session
//! - `device`: optional speaker output

mod decoder;
#[cfg(feature = "device-output")]
mod device;
mod resource;
mod session;

pub use decoder::{DecodedAudio, Decoder, SymphoniaDecoder};
pub use resource::{Generation, RenderingResource, ResourceTracker, StartMode};
pub use session::{AudioSession, SessionId, Transport};
