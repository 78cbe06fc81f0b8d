//! Coindetect Gateway - payphone coin deposit detection
//!
//! Detects coin-deposit dual-tone bursts (1700 Hz + 2200 Hz) on the receive
//! and transmit legs of a telephony audio path and maintains a debounced,
//! per-direction coin count for each monitored call.
//!
//! **Sponsored by [Carrier One Inc](https://carrierone.com) - Professional Telecommunications Solutions**

pub mod config;
pub mod core;
pub mod dsp;
pub mod error;
pub mod services;
pub mod utils;

pub use error::{Error, Result};

/// Gateway version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
