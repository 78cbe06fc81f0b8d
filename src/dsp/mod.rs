//! Signal processing primitives for coin tone detection

pub mod debounce;
pub mod dual_tone;
pub mod goertzel;

pub use debounce::PulseDebouncer;
pub use dual_tone::DualToneBlockDetector;
pub use goertzel::ToneEnergyEstimator;
