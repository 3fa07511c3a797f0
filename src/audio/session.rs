//! Audio sessions: decoded PCM, its transport clock, and the effect insert slot

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::decoder::DecodedAudio;
use crate::effects::FilterBank;

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

/// Handle identifying one prepared output stream. `0` means "no session yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SessionId(u32);

impl SessionId {
    pub const NONE: SessionId = SessionId(0);

    fn mint() -> Self {
        loop {
            let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return SessionId(id);
            }
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Clock {
    anchor_frame: u64,
    started_at: Option<Instant>,
}

/// Wall-clock play head over a fixed number of frames.
#[derive(Debug)]
pub struct Transport {
    sample_rate: u32,
    total_frames: u64,
    clock: Mutex<Clock>,
}

impl Transport {
    fn new(sample_rate: u32, total_frames: u64) -> Self {
        Self {
            sample_rate,
            total_frames,
            clock: Mutex::new(Clock {
                anchor_frame: 0,
                started_at: None,
            }),
        }
    }

    fn position_of(&self, clock: &Clock) -> u64 {
        let elapsed = clock
            .started_at
            .map(|t| (t.elapsed().as_secs_f64() * self.sample_rate as f64) as u64)
            .unwrap_or(0);
        clock.anchor_frame.saturating_add(elapsed).min(self.total_frames)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn position_frames(&self) -> u64 {
        let clock = self.clock.lock();
        self.position_of(&clock)
    }

    pub fn is_running(&self) -> bool {
        self.clock.lock().started_at.is_some()
    }

    pub fn start(&self) {
        let mut clock = self.clock.lock();
        if clock.started_at.is_none() {
            clock.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&self) {
        let mut clock = self.clock.lock();
        clock.anchor_frame = self.position_of(&clock);
        clock.started_at = None;
    }

    pub fn seek(&self, frame: u64) {
        let mut clock = self.clock.lock();
        clock.anchor_frame = frame.min(self.total_frames);
        if clock.started_at.is_some() {
            clock.started_at = Some(Instant::now());
        }
    }

    /// Stop the clock if it ran past the last frame. Returns true when it did.
    pub fn stop_at_end(&self) -> bool {
        let mut clock = self.clock.lock();
        if clock.started_at.is_some() && self.position_of(&clock) >= self.total_frames {
            clock.anchor_frame = self.total_frames;
            clock.started_at = None;
            true
        } else {
            false
        }
    }
}

/// One prepared track: its PCM, transport, and the insert slot effects bind to.
///
/// Owned by a `RenderingResource`; effects only ever hold a `Weak` to it, so
/// once the resource lets go every bound effect degrades to a no-op.
pub struct AudioSession {
    id: SessionId,
    audio: Arc<DecodedAudio>,
    transport: Transport,
    insert: Mutex<Option<FilterBank>>,
}

impl AudioSession {
    pub(crate) fn open(audio: DecodedAudio) -> Arc<Self> {
        let transport = Transport::new(audio.sample_rate(), audio.frames());
        Arc::new(Self {
            id: SessionId::mint(),
            audio: Arc::new(audio),
            transport,
            insert: Mutex::new(None),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn audio(&self) -> &Arc<DecodedAudio> {
        &self.audio
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn install_insert(&self, bank: FilterBank) {
        *self.insert.lock() = Some(bank);
    }

    pub fn clear_insert(&self) {
        self.insert.lock().take();
    }

    pub fn has_insert(&self) -> bool {
        self.insert.lock().is_some()
    }

    /// Mutate the installed filters in place; no-op when nothing is installed.
    pub fn with_insert<R>(&self, f: impl FnOnce(&mut FilterBank) -> R) -> Option<R> {
        self.insert.lock().as_mut().map(f)
    }

    /// Real-time renderers must not block on the control path.
    pub fn try_with_insert<R>(&self, f: impl FnOnce(&mut FilterBank) -> R) -> Option<R> {
        self.insert.try_lock().and_then(|mut guard| guard.as_mut().map(f))
    }

    /// Copy of the installed filters with cleared history, for offline rendering.
    pub fn insert_snapshot(&self) -> Option<FilterBank> {
        self.insert.lock().as_ref().map(|bank| {
            let mut copy = bank.clone();
            copy.reset();
            copy
        })
    }

    /// `count` stereo frames starting at the play head, zero-padded past the end.
    pub fn frames_at_playhead(&self, count: usize) -> Vec<(f32, f32)> {
        let start = self.transport.position_frames();
        (0..count as u64).map(|i| self.audio.frame(start + i)).collect()
    }
}

impl fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSession")
            .field("id", &self.id)
            .field("frames", &self.audio.frames())
            .field("sample_rate", &self.audio.sample_rate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session(frames: usize, rate: u32) -> Arc<AudioSession> {
        AudioSession::open(DecodedAudio::new(vec![0.25; frames * 2], rate).unwrap())
    }

    #[test]
    fn sessions_get_distinct_nonzero_ids() {
        let a = session(10, 1_000);
        let b = session(10, 1_000);
        assert!(!a.id().is_none());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn paused_transport_does_not_move() {
        let s = session(10_000, 1_000);
        s.transport().seek(250);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(s.transport().position_frames(), 250);
        assert!(!s.transport().is_running());
    }

    #[test]
    fn running_transport_advances_and_pauses() {
        let s = session(100_000, 1_000);
        s.transport().start();
        std::thread::sleep(Duration::from_millis(30));
        s.transport().pause();
        let pos = s.transport().position_frames();
        assert!(pos >= 25, "position {pos}");
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(s.transport().position_frames(), pos);
    }

    #[test]
    fn transport_stops_at_end() {
        let s = session(10, 1_000);
        s.transport().start();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(s.transport().position_frames(), 10);
        assert!(s.transport().stop_at_end());
        assert!(!s.transport().is_running());
        assert!(!s.transport().stop_at_end());
    }

    #[test]
    fn seek_is_clamped() {
        let s = session(10, 1_000);
        s.transport().seek(99);
        assert_eq!(s.transport().position_frames(), 10);
    }

    #[test]
    fn frames_at_playhead_pad_with_silence() {
        let s = session(4, 1_000);
        s.transport().seek(2);
        let frames = s.frames_at_playhead(4);
        assert_eq!(frames, vec![(0.25, 0.25), (0.25, 0.25), (0.0, 0.0), (0.0, 0.0)]);
    }
}
