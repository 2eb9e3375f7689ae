//! Quantum Filter DSP core
//!
//! Simulated quantum measurement noise mixed into a live mono signal.
//!
//! Key pieces:
//! - Single-sample and pair-entangled measurement models
//! - Real-time mixer with dry passthrough on numeric faults
//! - Lock-free parameter store shared with the control thread
//! - AVX SIMD rescale-and-clip for the wet signal

pub mod clipping;
pub mod error;
pub mod mixer;
pub mod noise;
pub mod normalize;
pub mod pairs;
pub mod params;
pub mod types;

pub use clipping::*;
pub use error::*;
pub use mixer::*;
pub use noise::*;
pub use normalize::*;
pub use pairs::*;
pub use params::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_creation() {
        let mixer = RealtimeMixer::new(MixerConfig::default());
        assert_eq!(mixer.shots().get(), DEFAULT_SHOTS);
        assert_eq!(mixer.capacity(), DEFAULT_CHUNK_SIZE);
        assert_eq!(mixer.stats(), MixerStats::default());
    }
}
