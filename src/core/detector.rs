//! Per-direction frame processing
//!
//! One [`DirectionalDetector`] handles the ordered sample stream of a
//! single audio direction: it keeps the block detector tuned to the
//! frame's declared sample rate and drives the pulse debouncer with
//! every completed block decision.

use tracing::debug;

use crate::config::DetectorConfig;
use crate::dsp::{DualToneBlockDetector, PulseDebouncer};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DirectionalDetector {
    detector: DualToneBlockDetector,
    debouncer: PulseDebouncer,
}

impl DirectionalDetector {
    pub fn new(config: &DetectorConfig, sample_rate_hint: u32) -> Self {
        let mut detector = DualToneBlockDetector::new(config);
        if sample_rate_hint > 0 {
            detector.configure(sample_rate_hint);
        }
        Self {
            detector,
            debouncer: PulseDebouncer::new(config.confirm_blocks, config.release_blocks),
        }
    }

    /// Process one audio frame in arrival order.
    ///
    /// A zero-length frame is a no-op. A zero sample rate is rejected
    /// without touching accumulated state; the frame is skipped and the
    /// caller may continue with the next one.
    pub fn process_frame(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate { rate: sample_rate });
        }
        if samples.is_empty() {
            return Ok(());
        }

        self.detector.configure(sample_rate);

        for &sample in samples {
            if let Some(detected) = self.detector.feed(sample) {
                if self.debouncer.update(detected) {
                    debug!(total = self.debouncer.pulse_count(), "coin pulse confirmed");
                }
            }
        }
        Ok(())
    }

    /// Debounced, confirmed coin count for this direction.
    pub fn coin_count(&self) -> u64 {
        self.debouncer.pulse_count()
    }

    /// Sample rate the detector is currently tuned for.
    pub fn detector_rate(&self) -> u32 {
        self.detector.detector_rate()
    }

    /// Current block length in samples.
    pub fn block_len(&self) -> usize {
        self.detector.block_len()
    }
}
