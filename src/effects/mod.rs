//! Audio effects bound to the current session
//!
//! [`EffectsChain`] owns one [`Equalizer`] and one [`Visualizer`] and rebinds
//! both whenever a new resource becomes ready.

mod equalizer;
mod visualizer;

use std::sync::Arc;

pub use equalizer::{Equalizer, EqualizerConfig, FilterBank, Preset};
pub use visualizer::{normalize_capture_size, Visualizer, MAX_CAPTURE_SIZE, MIN_CAPTURE_SIZE};

use crate::audio::{AudioSession, Generation};
use crate::error::{PlayerError, Result};

pub struct EffectsChain {
    config: EqualizerConfig,
    capture_size: usize,
    generation: Option<Generation>,
    equalizer: Option<Equalizer>,
    visualizer: Option<Visualizer>,
}

impl EffectsChain {
    pub fn new(config: EqualizerConfig, capture_size: usize) -> Self {
        Self {
            config,
            capture_size: normalize_capture_size(capture_size),
            generation: None,
            equalizer: None,
            visualizer: None,
        }
    }

    pub fn capture_size(&self) -> usize {
        self.capture_size
    }

    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn is_attached(&self) -> bool {
        self.generation.is_some()
    }

    /// Drop previous handles and bind fresh ones to `session`.
    ///
    /// Binding failures are logged; the chain then reports no bands and/or a
    /// silent waveform while the track keeps playing.
    pub fn attach(&mut self, session: &Arc<AudioSession>, generation: Generation) {
        self.release();
        self.generation = Some(generation);

        match Equalizer::bind(session, generation, &self.config) {
            Ok(eq) => {
                tracing::debug!(session = %session.id(), %generation, bands = eq.band_count(), "Equalizer attached");
                self.equalizer = Some(eq);
            }
            Err(e) => tracing::warn!(session = %session.id(), error = %e, "Equalizer unavailable"),
        }
        match Visualizer::bind(session, self.capture_size) {
            Ok(viz) => self.visualizer = Some(viz),
            Err(e) => tracing::warn!(session = %session.id(), error = %e, "Visualizer unavailable"),
        }
    }

    pub fn band_count(&self) -> usize {
        self.equalizer.as_ref().map(Equalizer::band_count).unwrap_or(0)
    }

    pub fn band_range(&self) -> (f32, f32) {
        self.equalizer.as_ref().map(Equalizer::band_range).unwrap_or((0.0, 0.0))
    }

    pub fn band_frequencies(&self) -> Vec<u32> {
        self.equalizer
            .as_ref()
            .map(|eq| eq.band_frequencies().to_vec())
            .unwrap_or_default()
    }

    fn equalizer_for(&mut self, generation: Generation) -> Result<&mut Equalizer> {
        match self.generation {
            Some(actual) if actual != generation => {
                return Err(PlayerError::StaleGeneration {
                    expected: generation,
                    actual,
                });
            }
            _ => {}
        }
        self.equalizer
            .as_mut()
            .ok_or_else(|| PlayerError::InvalidCommand("no equalizer bands available".to_string()))
    }

    /// Set one band on the equalizer bound to `generation`; returns the clamped level.
    pub fn set_band_level(&mut self, generation: Generation, index: usize, level_mb: f32) -> Result<f32> {
        self.equalizer_for(generation)?.set_band_level(index, level_mb)
    }

    /// Apply a preset to every bound band; returns the full level list.
    pub fn apply_preset(&mut self, generation: Generation, preset: Preset) -> Result<Vec<f32>> {
        let eq = self.equalizer_for(generation)?;
        if eq.band_count() == 0 {
            return Err(PlayerError::InvalidCommand("no equalizer bands available".to_string()));
        }
        let levels = preset.levels();
        for index in 0..eq.band_count() {
            eq.set_band_level(index, levels.get(index).copied().unwrap_or(0.0))?;
        }
        Ok(eq.levels().to_vec())
    }

    /// Waveform of `capture_size` samples, zero-filled when nothing is bound.
    pub fn capture_waveform(&self) -> Vec<i8> {
        match &self.visualizer {
            Some(viz) => viz.capture(),
            None => vec![0; self.capture_size],
        }
    }

    /// Free both handles. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut eq) = self.equalizer.take() {
            eq.release();
        }
        if let Some(mut viz) = self.visualizer.take() {
            viz.release();
        }
        if let Some(generation) = self.generation.take() {
            tracing::debug!(%generation, "Effects released");
        }
    }
}

impl Drop for EffectsChain {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudio;
    use proptest::prelude::*;

    fn session() -> Arc<AudioSession> {
        AudioSession::open(DecodedAudio::new(vec![0.1; 8_000], 8_000).unwrap())
    }

    fn attached() -> (EffectsChain, Arc<AudioSession>, Generation) {
        let s = session();
        let generation = Generation::default().next();
        let mut chain = EffectsChain::new(EqualizerConfig::default(), 256);
        chain.attach(&s, generation);
        (chain, s, generation)
    }

    #[test]
    fn unattached_chain_reports_nothing() {
        let chain = EffectsChain::new(EqualizerConfig::default(), 1_024);
        assert_eq!(chain.band_count(), 0);
        assert_eq!(chain.band_range(), (0.0, 0.0));
        assert_eq!(chain.capture_waveform(), vec![0; 1_024]);
    }

    #[test]
    fn unattached_band_change_is_invalid() {
        let mut chain = EffectsChain::new(EqualizerConfig::default(), 1_024);
        let result = chain.set_band_level(Generation::default(), 0, 100.0);
        assert!(matches!(result, Err(PlayerError::InvalidCommand(_))));
    }

    #[test]
    fn attach_binds_both_effects() {
        let (chain, s, generation) = attached();
        assert_eq!(chain.generation(), Some(generation));
        assert_eq!(chain.band_count(), 5);
        assert_eq!(chain.band_frequencies(), vec![60, 230, 910, 3_600, 14_000]);
        assert_eq!(chain.capture_waveform().len(), 256);
        assert!(s.has_insert());
    }

    #[test]
    fn attach_without_bands_is_recoverable() {
        let config = EqualizerConfig {
            frequencies_hz: Vec::new(),
            ..Default::default()
        };
        let mut chain = EffectsChain::new(config, 256);
        chain.attach(&session(), Generation::default());
        assert_eq!(chain.band_count(), 0);
        assert_eq!(chain.band_range(), (0.0, 0.0));
        assert_eq!(chain.capture_waveform().len(), 256);
    }

    #[test]
    fn stale_generation_is_refused() {
        let (mut chain, _s, generation) = attached();
        let result = chain.set_band_level(generation.next(), 0, 100.0);
        assert!(matches!(result, Err(PlayerError::StaleGeneration { .. })));
    }

    #[test]
    fn reattach_releases_previous_session() {
        let (mut chain, first, generation) = attached();
        let second = session();
        chain.attach(&second, generation.next());
        assert!(!first.has_insert());
        assert!(second.has_insert());
    }

    #[test]
    fn preset_applies_every_band() {
        let (mut chain, _s, generation) = attached();
        let levels = chain.apply_preset(generation, Preset::Rock).unwrap();
        assert_eq!(levels, vec![1_000.0, 500.0, 0.0, 500.0, 1_000.0]);
    }

    #[test]
    fn preset_on_wider_equalizer_zero_fills() {
        let config = EqualizerConfig {
            frequencies_hz: vec![32, 64, 125, 250, 500, 1_000, 2_000],
            ..Default::default()
        };
        let s = session();
        let mut chain = EffectsChain::new(config, 256);
        chain.attach(&s, Generation::default());
        let levels = chain.apply_preset(Generation::default(), Preset::Pop).unwrap();
        assert_eq!(levels, vec![500.0, 1_000.0, 500.0, 1_000.0, 500.0, 0.0, 0.0]);
    }

    #[test]
    fn release_is_idempotent() {
        let (mut chain, s, _) = attached();
        chain.release();
        chain.release();
        assert!(!chain.is_attached());
        assert!(!s.has_insert());
        assert_eq!(chain.band_count(), 0);
    }

    proptest! {
        #[test]
        fn band_level_always_lands_in_range(index in 0usize..5, level in -100_000.0f32..100_000.0) {
            let (mut chain, _s, generation) = attached();
            let (min, max) = chain.band_range();
            let applied = chain.set_band_level(generation, index, level).unwrap();
            prop_assert!(applied >= min && applied <= max);
            prop_assert_eq!(applied, level.clamp(min, max));
        }
    }
}
