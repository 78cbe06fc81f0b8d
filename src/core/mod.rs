//! Core session types for per-call coin detection

pub mod detector;
pub mod session;

pub use detector::DirectionalDetector;
pub use session::{ChannelCoinSession, Direction};
