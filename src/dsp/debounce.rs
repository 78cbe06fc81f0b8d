//! Hysteresis debouncer for per-block tone decisions
//!
//! Raw per-block detection is noisy near the energy threshold. The
//! debouncer requires a streak of consecutive confirming blocks before
//! flipping state in either direction, which rejects single-block
//! glitches while keeping detection latency bounded to roughly four
//! block periods at the default settings.

/// Two-state pulse confirmation machine.
///
/// `pulse_count` increments exactly once per confirmed pulse, on the
/// idle to in-pulse transition, never on re-entry while a pulse is
/// already ongoing.
#[derive(Debug, Clone)]
pub struct PulseDebouncer {
    in_pulse: bool,
    hit_streak: u32,
    miss_streak: u32,
    pulse_count: u64,
    confirm_blocks: u32,
    release_blocks: u32,
}

impl PulseDebouncer {
    /// Create a debouncer that confirms after more than `confirm_blocks`
    /// consecutive hits and releases after more than `release_blocks`
    /// consecutive misses.
    pub fn new(confirm_blocks: u32, release_blocks: u32) -> Self {
        Self {
            in_pulse: false,
            hit_streak: 0,
            miss_streak: 0,
            pulse_count: 0,
            confirm_blocks,
            release_blocks,
        }
    }

    /// Advance the machine by one block decision. Returns true exactly
    /// when this block confirms a new pulse.
    pub fn update(&mut self, detected: bool) -> bool {
        if self.in_pulse {
            if detected {
                self.miss_streak = 0;
            } else {
                self.miss_streak += 1;
                if self.miss_streak > self.release_blocks {
                    self.in_pulse = false;
                    self.hit_streak = 0;
                }
            }
            return false;
        }

        if detected {
            self.hit_streak += 1;
            self.miss_streak = 0;
            if self.hit_streak > self.confirm_blocks {
                self.in_pulse = true;
                self.pulse_count += 1;
                self.miss_streak = 0;
                return true;
            }
        } else {
            self.hit_streak = 0;
        }
        false
    }

    /// Confirmed pulse count for this debouncer's lifetime.
    pub fn pulse_count(&self) -> u64 {
        self.pulse_count
    }

    /// Whether a pulse is currently considered ongoing.
    pub fn in_pulse(&self) -> bool {
        self.in_pulse
    }
}
