//! Per-call coin detection session
//!
//! A [`ChannelCoinSession`] is the unit attached to one monitored call:
//! two independent [`DirectionalDetector`]s, one per audio direction,
//! plus per-direction enable flags. The session is a plain owned value;
//! it lives exactly as long as the host keeps it and needs no teardown
//! hook.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::core::detector::DirectionalDetector;
use crate::{Error, Result};

/// Audio path direction relative to the monitored channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "rx")]
    Rx,
    #[serde(rename = "tx")]
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "rx"),
            Direction::Tx => write!(f, "tx"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rx" | "read" | "rx_coins" => Ok(Direction::Rx),
            "tx" | "write" | "tx_coins" => Ok(Direction::Tx),
            other => Err(Error::parse(format!("Unknown direction: {}", other))),
        }
    }
}

/// Independent rx/tx coin detectors for one call.
#[derive(Debug, Clone)]
pub struct ChannelCoinSession {
    rx: DirectionalDetector,
    tx: DirectionalDetector,
    rx_enabled: bool,
    tx_enabled: bool,
}

impl ChannelCoinSession {
    /// Allocate fresh detector state for one call, both directions
    /// pre-tuned to `sample_rate_hint`.
    pub fn new(config: &DetectorConfig, sample_rate_hint: u32) -> Self {
        Self {
            rx: DirectionalDetector::new(config, sample_rate_hint),
            tx: DirectionalDetector::new(config, sample_rate_hint),
            rx_enabled: config.rx_enabled,
            tx_enabled: config.tx_enabled,
        }
    }

    /// Feed one audio frame for the given direction. Disabled directions
    /// ignore frames entirely, with no state mutation.
    pub fn process_frame(
        &mut self,
        direction: Direction,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<()> {
        match direction {
            Direction::Rx if self.rx_enabled => self.rx.process_frame(samples, sample_rate),
            Direction::Tx if self.tx_enabled => self.tx.process_frame(samples, sample_rate),
            _ => Ok(()),
        }
    }

    /// Debounced coin count for one direction.
    pub fn coins(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Rx => self.rx.coin_count(),
            Direction::Tx => self.tx.coin_count(),
        }
    }

    /// Toggle whether frames for a direction are processed.
    pub fn set_enabled(&mut self, direction: Direction, enabled: bool) {
        match direction {
            Direction::Rx => self.rx_enabled = enabled,
            Direction::Tx => self.tx_enabled = enabled,
        }
    }

    pub fn is_enabled(&self, direction: Direction) -> bool {
        match direction {
            Direction::Rx => self.rx_enabled,
            Direction::Tx => self.tx_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn deposit_burst(len: usize, rate: f64) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f64 / rate;
                let a = 8000.0 * (2.0 * PI * 1700.0 * t).sin();
                let b = 8000.0 * (2.0 * PI * 2200.0 * t).sin();
                (a + b) as i16
            })
            .collect()
    }

    fn session() -> ChannelCoinSession {
        ChannelCoinSession::new(&DetectorConfig::default(), 8000)
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("rx".parse::<Direction>().unwrap(), Direction::Rx);
        assert_eq!("TX".parse::<Direction>().unwrap(), Direction::Tx);
        assert_eq!("rx_coins".parse::<Direction>().unwrap(), Direction::Rx);
        assert_eq!("write".parse::<Direction>().unwrap(), Direction::Tx);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_directions_are_independent() {
        let mut session = session();
        let burst = deposit_burst(800, 8000.0);

        session.process_frame(Direction::Rx, &burst, 8000).unwrap();
        session.process_frame(Direction::Tx, &vec![0i16; 800], 8000).unwrap();

        assert_eq!(session.coins(Direction::Rx), 1);
        assert_eq!(session.coins(Direction::Tx), 0);
    }

    #[test]
    fn test_disabled_direction_ignores_frames() {
        let mut session = session();
        session.set_enabled(Direction::Rx, false);

        let burst = deposit_burst(800, 8000.0);
        session.process_frame(Direction::Rx, &burst, 8000).unwrap();
        assert_eq!(session.coins(Direction::Rx), 0);

        // Re-enabling resumes processing from clean block state
        session.set_enabled(Direction::Rx, true);
        session.process_frame(Direction::Rx, &burst, 8000).unwrap();
        assert_eq!(session.coins(Direction::Rx), 1);
    }

    #[test]
    fn test_disabled_direction_swallows_bad_rate() {
        let mut session = session();
        session.set_enabled(Direction::Tx, false);

        // Dispatch check happens before any frame validation
        assert!(session.process_frame(Direction::Tx, &[0i16; 160], 0).is_ok());
    }

    #[test]
    fn test_counts_are_monotone_per_direction() {
        let mut session = session();
        let burst = deposit_burst(800, 8000.0);
        let silence = vec![0i16; 800];

        let mut last = 0;
        for _ in 0..5 {
            session.process_frame(Direction::Rx, &burst, 8000).unwrap();
            session.process_frame(Direction::Rx, &silence, 8000).unwrap();
            let count = session.coins(Direction::Rx);
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 5);
    }
}
