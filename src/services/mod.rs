//! Services module for the Coindetect Gateway

pub mod coin_monitor;

pub use coin_monitor::{CoinEvent, CoinMonitorService, MonitoredSession};
