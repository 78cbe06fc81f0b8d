//! Configuration management for the Coindetect Gateway

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetectConfig {
    pub general: GeneralConfig,
    pub detector: DetectorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub node_id: String,
    pub description: String,
    pub max_sessions: u32,
}

/// Tunables for the dual-tone coin pulse detector.
///
/// The frequency pair and energy threshold match the North American
/// payphone coin deposit signal; they are configuration, not physics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Lower tone of the coin deposit pair, in Hz
    pub tone_a_freq: f64,
    /// Upper tone of the coin deposit pair, in Hz
    pub tone_b_freq: f64,
    /// Nominal energy-integration block rate, in blocks per second
    pub block_rate: u32,
    /// Per-tone magnitude threshold on the normalized sample scale
    pub threshold: f64,
    /// Consecutive detected blocks beyond which a pulse is confirmed
    pub confirm_blocks: u32,
    /// Consecutive silent blocks beyond which a pulse is released
    pub release_blocks: u32,
    /// Sample rate the detectors are tuned for until the first frame arrives
    pub default_sample_rate: u32,
    pub rx_enabled: bool,
    pub tx_enabled: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tone_a_freq: 1700.0,
            tone_b_freq: 2200.0,
            block_rate: 60,
            threshold: 0.05,
            confirm_blocks: 3,
            release_blocks: 3,
            default_sample_rate: 8000,
            rx_enabled: true,
            tx_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "compact")]
    Compact,
    #[serde(rename = "full")]
    Full,
}

impl CoinDetectConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CoinDetectConfig = toml::from_str(&contents)
            .map_err(|e| Error::parse(format!("Invalid TOML: {}", e)))?;
        Ok(config)
    }

    pub fn load_from_env() -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from environment variables with COINDET_ prefix
        settings = settings.add_source(
            config::Environment::with_prefix("COINDET")
                .separator("_")
        );

        let config = settings.build()?;
        let detect_config = config.try_deserialize()?;
        Ok(detect_config)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;

        if d.tone_a_freq <= 0.0 || d.tone_b_freq <= 0.0 {
            return Err(Error::parse("Tone frequencies must be positive"));
        }

        if d.block_rate == 0 {
            return Err(Error::parse("Block rate must be non-zero"));
        }

        if d.threshold <= 0.0 {
            return Err(Error::parse("Detection threshold must be positive"));
        }

        if d.confirm_blocks == 0 || d.release_blocks == 0 {
            return Err(Error::parse("Debounce streak lengths must be non-zero"));
        }

        if d.default_sample_rate == 0 {
            return Err(Error::parse("Default sample rate must be non-zero"));
        }

        // Both tones must sit below the Nyquist limit of the default rate
        let nyquist = d.default_sample_rate as f64 / 2.0;
        if d.tone_a_freq >= nyquist || d.tone_b_freq >= nyquist {
            return Err(Error::parse("Tone frequencies must be below Nyquist"));
        }

        if self.general.max_sessions == 0 {
            return Err(Error::parse("max_sessions must be non-zero"));
        }

        Ok(())
    }

    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig {
                node_id: "coindetect-gateway-1".to_string(),
                description: "Payphone coin deposit detection gateway".to_string(),
                max_sessions: 500,
            },
            detector: DetectorConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
                format: LogFormat::Compact,
            },
        }
    }
}
