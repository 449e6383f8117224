//! Mood/wind smoothing and bloom/wither event detection

use crate::config::TreeConfig;
use crate::source::MoodWind;
use std::fmt;

/// Discrete lifecycle event emitted on a latch transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    Bloom,
    Wither,
}

impl fmt::Display for TreeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeEvent::Bloom => f.write_str("bloom"),
            TreeEvent::Wither => f.write_str("wither"),
        }
    }
}

/// First-order low-pass: each step moves `factor` of the remaining distance
#[derive(Clone, Copy, Debug)]
pub struct Smoother {
    value: f32,
    factor: f32,
}

impl Smoother {
    pub fn new(initial: f32, factor: f32) -> Self {
        Self { value: initial, factor: factor.clamp(f32::EPSILON, 1.0) }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Step toward `target`; a non-finite target leaves the value where it was
    pub fn update(&mut self, target: f32) -> f32 {
        if target.is_finite() {
            self.value += (target - self.value) * self.factor;
        }
        self.value
    }
}

/// Boolean that sets past `on` and only clears once back past `off`.
/// `rising` latches fire when the signal goes up; falling latches mirror it.
#[derive(Clone, Copy, Debug)]
struct Latch {
    on: f32,
    off: f32,
    rising: bool,
    set: bool,
}

impl Latch {
    fn rising(on: f32, off: f32) -> Self {
        Self { on, off, rising: true, set: false }
    }

    fn falling(on: f32, off: f32) -> Self {
        Self { on, off, rising: false, set: false }
    }

    /// Returns true only on the transition into the set state
    fn observe(&mut self, v: f32) -> bool {
        let (crossed_on, crossed_off) = if self.rising {
            (v > self.on, v < self.off)
        } else {
            (v < self.on, v > self.off)
        };

        if !self.set && crossed_on {
            self.set = true;
            return true;
        }
        if self.set && crossed_off {
            self.set = false;
        }
        false
    }
}

/// Hysteresis-gated bloom/wither detector over the smoothed mood
#[derive(Clone, Copy, Debug)]
pub struct EventDetector {
    bloom: Latch,
    wither: Latch,
}

impl EventDetector {
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            bloom: Latch::rising(config.bloom_on, config.bloom_off),
            wither: Latch::falling(config.wither_on, config.wither_off),
        }
    }

    pub fn blooming(&self) -> bool {
        self.bloom.set
    }

    pub fn withering(&self) -> bool {
        self.wither.set
    }

    /// Feed one smoothed mood sample
    pub fn observe(&mut self, mood: f32) -> Option<TreeEvent> {
        // Both latches always see the sample; only one can fire for a given value
        let bloomed = self.bloom.observe(mood);
        let withered = self.wither.observe(mood);
        match (bloomed, withered) {
            (true, _) => Some(TreeEvent::Bloom),
            (false, true) => Some(TreeEvent::Wither),
            _ => None,
        }
    }
}

impl Default for EventDetector {
    fn default() -> Self {
        Self::new(&TreeConfig::default())
    }
}

/// Smoothed mood and wind plus the event detector: the engine's signal state
#[derive(Clone, Debug)]
pub struct SignalState {
    mood: Smoother,
    wind: Smoother,
    detector: EventDetector,
    wither_onset: f32,
}

impl SignalState {
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            mood: Smoother::new(0.0, config.mood_smoothing),
            wind: Smoother::new(0.0, config.wind_smoothing),
            detector: EventDetector::new(config),
            wither_onset: config.wither_off,
        }
    }

    /// Advance one frame toward the latest snapshot
    pub fn update(&mut self, target: MoodWind) -> Option<TreeEvent> {
        let mood = self.mood.update(target.mood);
        self.wind.update(target.wind_force);
        self.detector.observe(mood)
    }

    pub fn mood(&self) -> f32 {
        self.mood.value()
    }

    pub fn wind(&self) -> f32 {
        self.wind.value()
    }

    pub fn detector(&self) -> &EventDetector {
        &self.detector
    }

    /// Smoothed mood remapped to `[0, 1]`; non-positive mood is fully dormant
    pub fn bloom_factor(&self) -> f32 {
        bloom_factor(self.mood())
    }

    /// Starts darkening where the wither latch would clear
    pub fn wither_factor(&self) -> f32 {
        wither_factor(self.mood(), self.wither_onset)
    }
}

pub fn bloom_factor(mood: f32) -> f32 {
    mood.clamp(0.0, 1.0)
}

/// Mood remapped from `[onset, -1]` to `[0, 1]`
pub fn wither_factor(mood: f32, onset: f32) -> f32 {
    let span = (onset + 1.0).max(f32::EPSILON);
    ((onset - mood) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(seq: &[f32]) -> Vec<(usize, TreeEvent)> {
        let mut det = EventDetector::default();
        seq.iter()
            .enumerate()
            .filter_map(|(i, &m)| det.observe(m).map(|e| (i, e)))
            .collect()
    }

    #[test]
    fn smoother_converges_without_overshoot() {
        for &(start, target) in &[(0.0f32, 0.9f32), (0.9, -0.9), (-1.0, 0.3), (0.5, 0.5)] {
            let mut s = Smoother::new(start, 0.10);
            let mut dist = (target - start).abs();
            for _ in 0..200 {
                let v = s.update(target);
                let d = (target - v).abs();
                assert!(d <= dist);
                if dist > 1e-4 {
                    assert!(d < dist);
                }
                // never on the far side of the target
                assert!((v - target) * (start - target) >= -1e-6);
                dist = d;
            }
            assert!(dist < 1e-3);
        }
    }

    #[test]
    fn hysteresis_example_sequence() {
        let got = events(&[0.0, 0.3, 0.65, 0.7, 0.5, 0.1, 0.65]);
        assert_eq!(got, vec![(2, TreeEvent::Bloom), (6, TreeEvent::Bloom)]);
    }

    #[test]
    fn repeat_rise_without_reset_is_silent() {
        let got = events(&[0.7, 0.3, 0.9, 0.25, 0.8, 0.21, 0.95]);
        assert_eq!(got, vec![(0, TreeEvent::Bloom)]);
    }

    #[test]
    fn clearing_emits_nothing() {
        let got = events(&[0.7, 0.1, 0.0, -0.1]);
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn wither_mirrors_bloom() {
        let got = events(&[-0.3, -0.65, -0.7, -0.3, -0.1, -0.61]);
        assert_eq!(got, vec![(1, TreeEvent::Wither), (5, TreeEvent::Wither)]);
    }

    #[test]
    fn latches_are_independent() {
        let mut det = EventDetector::default();
        assert_eq!(det.observe(0.7), Some(TreeEvent::Bloom));
        // straight to distress: bloom clears, wither fires
        assert_eq!(det.observe(-0.7), Some(TreeEvent::Wither));
        assert!(!det.blooming());
        assert!(det.withering());
        assert_eq!(det.observe(0.7), Some(TreeEvent::Bloom));
    }

    #[test]
    fn factors_remap_mood() {
        assert_eq!(bloom_factor(-0.5), 0.0);
        assert_eq!(bloom_factor(0.4), 0.4);
        assert_eq!(wither_factor(0.0, -0.2), 0.0);
        assert_eq!(wither_factor(-0.2, -0.2), 0.0);
        assert!((wither_factor(-0.6, -0.2) - 0.5).abs() < 1e-6);
        assert!((wither_factor(-1.0, -0.2) - 1.0).abs() < 1e-6);
        assert_eq!(wither_factor(-1.0, -1.0), 0.0);
    }

    #[test]
    fn wither_onset_follows_config() {
        let config = TreeConfig {
            wither_on: -0.8,
            wither_off: -0.5,
            ..TreeConfig::default()
        };
        let mut state = SignalState::new(&config);
        let fresh = SignalState::new(&TreeConfig::default());
        for _ in 0..300 {
            state.update(MoodWind::new(-0.4, 0.0));
        }
        // -0.4 is past the default onset but short of the configured one
        assert_eq!(state.wither_factor(), 0.0);
        assert!(wither_factor(state.mood(), TreeConfig::default().wither_off) > 0.2);
        assert_eq!(fresh.wither_factor(), 0.0);

        for _ in 0..300 {
            state.update(MoodWind::new(-1.0, 0.0));
        }
        assert!((state.wither_factor() - 1.0).abs() < 0.01);
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let mut s = Smoother::new(0.4, 0.5);
        assert_eq!(s.update(f32::NAN), 0.4);
        assert_eq!(s.update(f32::INFINITY), 0.4);
        assert!((s.update(0.8) - 0.6).abs() < 1e-6);

        let mut state = SignalState::new(&TreeConfig::default());
        let poisoned = MoodWind { mood: f32::NAN, wind_force: f32::NAN };
        assert_eq!(state.update(poisoned), None);
        assert_eq!(state.mood(), 0.0);
        assert_eq!(state.wind(), 0.0);
        let fired: Vec<_> = (0..299).filter_map(|_| state.update(MoodWind::new(0.9, 0.0))).collect();
        assert_eq!(fired, vec![TreeEvent::Bloom]);
        assert!(state.bloom_factor() > 0.85);
    }

    #[test]
    fn signal_state_reaches_bloom() {
        let mut state = SignalState::new(&TreeConfig::default());
        let target = MoodWind::new(0.9, 0.5);
        let fired: Vec<_> = (0..100).filter_map(|_| state.update(target)).collect();
        assert_eq!(fired, vec![TreeEvent::Bloom]);
        assert!((state.wind() - 0.5).abs() < 0.01);
    }
}
