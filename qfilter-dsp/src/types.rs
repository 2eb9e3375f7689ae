//! Shared data types and configuration constants

use std::fmt;
use std::num::NonZeroU32;

/// Default device sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default period size in frames (128 @ 44.1kHz = ~2.9ms)
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Default number of measurement shots averaged per sample
pub const DEFAULT_SHOTS: u32 = 64;

/// Initial wet/dry ratio
pub const DEFAULT_MIX_RATIO: f32 = 0.75;

/// Initial noise model selection (single-sample)
pub const DEFAULT_PAIR_MODE: bool = false;

/// Number of independent measurement trials averaged per sample
///
/// Always at least one, so the empirical mean is well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShotCount(NonZeroU32);

impl ShotCount {
    /// Returns `None` for zero shots
    pub fn new(shots: u32) -> Option<Self> {
        NonZeroU32::new(shots).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for ShotCount {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_SHOTS).unwrap_or(NonZeroU32::MIN))
    }
}

impl From<NonZeroU32> for ShotCount {
    fn from(shots: NonZeroU32) -> Self {
        Self(shots)
    }
}

impl fmt::Display for ShotCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the user-adjustable parameters for one period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixParameters {
    /// Wet/dry ratio in [0, 1] (0 = dry only)
    pub mix_ratio: f32,
    /// Use the pair entanglement model instead of the single-sample model
    pub pair_mode: bool,
}

impl Default for MixParameters {
    fn default() -> Self {
        Self {
            mix_ratio: DEFAULT_MIX_RATIO,
            pair_mode: DEFAULT_PAIR_MODE,
        }
    }
}

/// Noise model used for a period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    Single,
    Pairs,
}

impl From<bool> for NoiseMode {
    fn from(pair_mode: bool) -> Self {
        if pair_mode {
            NoiseMode::Pairs
        } else {
            NoiseMode::Single
        }
    }
}

/// Mixer configuration (fixed for the lifetime of a stream)
#[derive(Debug, Clone, Copy)]
pub struct MixerConfig {
    pub shots: ShotCount,
    /// Scratch capacity pre-allocated so the audio thread never allocates
    pub max_frames: usize,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            shots: ShotCount::default(),
            max_frames: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Outcome of processing one period
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Noise was generated and mixed in
    Wet = 0,
    /// Peak was zero; the noise stage was skipped
    Silent = 1,
    /// A numeric fault occurred; the dry signal was passed through
    DryFallback = 2,
}

/// Period deadline in seconds for a given chunk size and sample rate
pub fn period_seconds(chunk_size: usize, sample_rate: u32) -> f64 {
    chunk_size as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_count_rejects_zero() {
        assert!(ShotCount::new(0).is_none());
        assert_eq!(ShotCount::new(1).map(ShotCount::get), Some(1));
        assert_eq!(ShotCount::default().get(), DEFAULT_SHOTS);
    }

    #[test]
    fn test_noise_mode_from_flag() {
        assert_eq!(NoiseMode::from(true), NoiseMode::Pairs);
        assert_eq!(NoiseMode::from(false), NoiseMode::Single);
    }

    #[test]
    fn test_period_deadline() {
        let period = period_seconds(DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_RATE);
        assert!((period - 0.0029).abs() < 0.0001, "got {}", period);
    }
}
