//! Block-wise dual-tone presence detector
//!
//! Pairs two [`ToneEnergyEstimator`]s, one per coin tone frequency, and
//! emits a single "tone pair present" decision per completed block. Both
//! tones must exceed the threshold simultaneously; single-tone energy
//! (line noise, a stray dial tone component) never triggers.

use tracing::trace;

use crate::config::DetectorConfig;
use crate::dsp::goertzel::ToneEnergyEstimator;

/// Dual-frequency block detector with adaptive sample-rate tuning.
#[derive(Debug, Clone)]
pub struct DualToneBlockDetector {
    tone_a_freq: f64,
    tone_b_freq: f64,
    block_rate: u32,
    threshold: f64,
    tone_a: ToneEnergyEstimator,
    tone_b: ToneEnergyEstimator,
    /// Samples accumulated in the current block, always < block_len
    /// between calls
    sample_index: usize,
    /// Sample rate the estimators were last tuned for
    detector_rate: u32,
}

impl DualToneBlockDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        let rate = config.default_sample_rate;
        let block_len = block_len_for(rate, config.block_rate);
        Self {
            tone_a_freq: config.tone_a_freq,
            tone_b_freq: config.tone_b_freq,
            block_rate: config.block_rate,
            threshold: config.threshold,
            tone_a: ToneEnergyEstimator::new(config.tone_a_freq, rate, block_len),
            tone_b: ToneEnergyEstimator::new(config.tone_b_freq, rate, block_len),
            sample_index: 0,
            detector_rate: rate,
        }
    }

    /// Re-tune both estimators if the audio path renegotiated its sample
    /// rate. A no-op when the rate is unchanged; otherwise the partial
    /// block in progress is discarded.
    pub fn configure(&mut self, sample_rate: u32) {
        if sample_rate == self.detector_rate {
            return;
        }

        let block_len = block_len_for(sample_rate, self.block_rate);
        trace!(
            old_rate = self.detector_rate,
            new_rate = sample_rate,
            block_len,
            "retuning coin detector"
        );

        self.tone_a = ToneEnergyEstimator::new(self.tone_a_freq, sample_rate, block_len);
        self.tone_b = ToneEnergyEstimator::new(self.tone_b_freq, sample_rate, block_len);
        self.sample_index = 0;
        self.detector_rate = sample_rate;
    }

    /// Feed one sample into both estimators. Returns `Some(detected)`
    /// when this sample completes a block, `None` otherwise.
    pub fn feed(&mut self, sample: i16) -> Option<bool> {
        self.tone_a.feed(sample);
        self.tone_b.feed(sample);
        self.sample_index += 1;

        if self.sample_index < self.tone_a.block_len() {
            return None;
        }

        let mag_a = self.tone_a.result();
        let mag_b = self.tone_b.result();
        let detected = mag_a > self.threshold && mag_b > self.threshold;
        if detected {
            trace!(mag_a, mag_b, "coin tone pair present in block");
        }

        self.tone_a.reset();
        self.tone_b.reset();
        self.sample_index = 0;

        Some(detected)
    }

    /// Block length at the current sample-rate regime, in samples.
    pub fn block_len(&self) -> usize {
        self.tone_a.block_len()
    }

    /// Sample rate the estimators are currently tuned for.
    pub fn detector_rate(&self) -> u32 {
        self.detector_rate
    }
}

fn block_len_for(sample_rate: u32, block_rate: u32) -> usize {
    (sample_rate as f64 / block_rate as f64).round().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn dual_tone_sample(i: usize, rate: f64) -> i16 {
        let t = i as f64 / rate;
        let a = 8000.0 * (2.0 * PI * 1700.0 * t).sin();
        let b = 8000.0 * (2.0 * PI * 2200.0 * t).sin();
        (a + b) as i16
    }

    fn single_tone_sample(i: usize, rate: f64) -> i16 {
        let t = i as f64 / rate;
        (12000.0 * (2.0 * PI * 1700.0 * t).sin()) as i16
    }

    #[test]
    fn test_block_len_follows_sample_rate() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());
        assert_eq!(det.block_len(), 133);
        assert_eq!(det.detector_rate(), 8000);

        det.configure(16000);
        assert_eq!(det.block_len(), 267);
        assert_eq!(det.detector_rate(), 16000);

        // Same rate again is a no-op
        det.configure(16000);
        assert_eq!(det.block_len(), 267);
    }

    #[test]
    fn test_decision_only_at_block_boundary() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());
        let n = det.block_len();

        for i in 0..n - 1 {
            assert_eq!(det.feed(dual_tone_sample(i, 8000.0)), None);
        }
        assert!(det.feed(dual_tone_sample(n - 1, 8000.0)).is_some());
    }

    #[test]
    fn test_dual_tone_detected() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());
        let n = det.block_len();

        let mut decision = None;
        for i in 0..n {
            decision = det.feed(dual_tone_sample(i, 8000.0));
        }
        assert_eq!(decision, Some(true));
    }

    #[test]
    fn test_single_tone_rejected() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());
        let n = det.block_len();

        // High-amplitude 1700 Hz alone must never trip the pair decision
        for block in 0..8 {
            let mut decision = None;
            for i in 0..n {
                decision = det.feed(single_tone_sample(block * n + i, 8000.0));
            }
            assert_eq!(decision, Some(false));
        }
    }

    #[test]
    fn test_silence_not_detected() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());
        let n = det.block_len();

        let mut decision = None;
        for _ in 0..n {
            decision = det.feed(0);
        }
        assert_eq!(decision, Some(false));
    }

    #[test]
    fn test_retune_discards_partial_block() {
        let mut det = DualToneBlockDetector::new(&DetectorConfig::default());

        // Half a block of strong dual tone, then a rate change
        for i in 0..det.block_len() / 2 {
            det.feed(dual_tone_sample(i, 8000.0));
        }
        det.configure(16000);

        // A full block of silence after the retune must come out clean
        let n = det.block_len();
        let mut decision = None;
        for _ in 0..n {
            decision = det.feed(0);
        }
        assert_eq!(decision, Some(false));
    }
}
