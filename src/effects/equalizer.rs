//! Multi-band peaking equalizer bound to one audio session

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::audio::{AudioSession, Generation};
use crate::error::{PlayerError, Result};

const BAND_Q: f32 = 1.41;

/// Band layout and level bounds, in millibels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerConfig {
    pub frequencies_hz: Vec<u32>,
    pub min_level_mb: f32,
    pub max_level_mb: f32,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            frequencies_hz: vec![60, 230, 910, 3_600, 14_000],
            min_level_mb: -1_500.0,
            max_level_mb: 1_500.0,
        }
    }
}

impl EqualizerConfig {
    /// Bounds in ascending order, whatever order the file gave them in.
    pub fn band_range(&self) -> (f32, f32) {
        let (a, b) = (self.min_level_mb, self.max_level_mb);
        if a <= b { (a, b) } else { (b, a) }
    }
}

#[derive(Clone, Debug)]
struct PeakingBand {
    frequency: f32,
    gain_db: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: [f32; 2],
    x2: [f32; 2],
    y1: [f32; 2],
    y2: [f32; 2],
}

impl PeakingBand {
    fn new(frequency: f32) -> Self {
        Self {
            frequency,
            gain_db: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: [0.0; 2],
            x2: [0.0; 2],
            y1: [0.0; 2],
            y2: [0.0; 2],
        }
    }

    fn set_gain(&mut self, gain_db: f32, sample_rate: f32) {
        self.gain_db = gain_db;
        if sample_rate < 1.0 || gain_db.abs() < 0.01 {
            (self.b0, self.b1, self.b2, self.a1, self.a2) = (1.0, 0.0, 0.0, 0.0, 0.0);
            return;
        }

        let a = 10.0_f32.powf(gain_db / 40.0);
        // Keep the centre below Nyquist so high bands stay stable at low rates.
        let omega = 2.0 * PI * self.frequency.min(sample_rate * 0.45) / sample_rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / (2.0 * BAND_Q);

        let a0 = 1.0 + alpha / a;
        self.b0 = (1.0 + alpha * a) / a0;
        self.b1 = (-2.0 * cos) / a0;
        self.b2 = (1.0 - alpha * a) / a0;
        self.a1 = (-2.0 * cos) / a0;
        self.a2 = (1.0 - alpha / a) / a0;
    }

    #[inline]
    fn tick(&mut self, ch: usize, x: f32) -> f32 {
        let mut y = self.b0 * x + self.b1 * self.x1[ch] + self.b2 * self.x2[ch]
            - self.a1 * self.y1[ch]
            - self.a2 * self.y2[ch];
        if y.abs() < 1e-15 {
            y = 0.0;
        }
        self.x2[ch] = self.x1[ch];
        self.x1[ch] = x;
        self.y2[ch] = self.y1[ch];
        self.y1[ch] = y;
        y
    }

    fn reset(&mut self) {
        self.x1 = [0.0; 2];
        self.x2 = [0.0; 2];
        self.y1 = [0.0; 2];
        self.y2 = [0.0; 2];
    }
}

/// Cascade of peaking filters, one per band, processing stereo frames.
#[derive(Clone, Debug)]
pub struct FilterBank {
    sample_rate: f32,
    bands: Vec<PeakingBand>,
}

impl FilterBank {
    pub fn new(sample_rate: u32, frequencies_hz: &[u32]) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            bands: frequencies_hz.iter().map(|&f| PeakingBand::new(f as f32)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Out-of-range indices are ignored.
    pub fn set_gain_db(&mut self, index: usize, gain_db: f32) {
        let sample_rate = self.sample_rate;
        if let Some(band) = self.bands.get_mut(index) {
            band.set_gain(gain_db, sample_rate);
        }
    }

    pub fn gain_db(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(|b| b.gain_db)
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.bands
            .iter_mut()
            .fold((left, right), |(l, r), band| (band.tick(0, l), band.tick(1, r)))
    }

    /// Clear filter history without touching gains.
    pub fn reset(&mut self) {
        self.bands.iter_mut().for_each(PeakingBand::reset);
    }
}

/// Named curves offered by the UI, in millibels per band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Flat,
    Rock,
    Jazz,
    Pop,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Flat, Preset::Rock, Preset::Jazz, Preset::Pop];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Flat => "flat",
            Preset::Rock => "rock",
            Preset::Jazz => "jazz",
            Preset::Pop => "pop",
        }
    }

    pub fn levels(self) -> [f32; 5] {
        match self {
            Preset::Flat => [0.0; 5],
            Preset::Rock => [1_000.0, 500.0, 0.0, 500.0, 1_000.0],
            Preset::Jazz => [0.0, 500.0, 1_000.0, 500.0, 0.0],
            Preset::Pop => [500.0, 1_000.0, 500.0, 1_000.0, 500.0],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlayerError::InvalidCommand(format!("unknown preset '{s}'")))
    }
}

/// Equalizer handle for one session.
///
/// Holds the session weakly: once its resource is freed, every mutation becomes
/// a no-op on the audio side while levels are still tracked here.
#[derive(Debug)]
pub struct Equalizer {
    session: Weak<AudioSession>,
    generation: Generation,
    frequencies_hz: Vec<u32>,
    range: (f32, f32),
    levels: Vec<f32>,
}

impl Equalizer {
    /// Install a flat filter bank into `session`.
    pub fn bind(session: &Arc<AudioSession>, generation: Generation, config: &EqualizerConfig) -> Result<Self> {
        if session.id().is_none() {
            return Err(PlayerError::EffectUnavailable(
                "equalizer needs a prepared session".to_string(),
            ));
        }
        if config.frequencies_hz.is_empty() {
            return Err(PlayerError::EffectUnavailable("no equalizer bands configured".to_string()));
        }

        session.install_insert(FilterBank::new(session.audio().sample_rate(), &config.frequencies_hz));
        Ok(Self {
            session: Arc::downgrade(session),
            generation,
            frequencies_hz: config.frequencies_hz.clone(),
            range: config.band_range(),
            levels: vec![0.0; config.frequencies_hz.len()],
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn band_count(&self) -> usize {
        self.levels.len()
    }

    pub fn band_range(&self) -> (f32, f32) {
        self.range
    }

    pub fn band_frequencies(&self) -> &[u32] {
        &self.frequencies_hz
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// Returns the level actually applied after clamping.
    pub fn set_band_level(&mut self, index: usize, level_mb: f32) -> Result<f32> {
        if index >= self.levels.len() {
            return Err(PlayerError::InvalidCommand(format!(
                "band {index} out of range (0..{})",
                self.levels.len()
            )));
        }
        if !level_mb.is_finite() {
            return Err(PlayerError::InvalidCommand(format!("band level {level_mb} is not a number")));
        }

        let level = level_mb.clamp(self.range.0, self.range.1);
        self.levels[index] = level;
        if let Some(session) = self.session.upgrade() {
            session.with_insert(|bank| bank.set_gain_db(index, level / 100.0));
        }
        Ok(level)
    }

    /// Remove the filters from the session. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(session) = self.session.upgrade() {
            session.clear_insert();
        }
        self.session = Weak::new();
    }
}
