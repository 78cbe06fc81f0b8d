//! Utility modules for the Coindetect Gateway

pub mod logger;

pub use logger::setup_logging;
