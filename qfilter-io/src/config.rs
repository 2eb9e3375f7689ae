//! Stream configuration
//!
//! Sample rate, period size and shot count are fixed for the lifetime of a
//! stream. Only the parameters in `ParameterStore` change at runtime.

use qfilter_dsp::{MixerConfig, ShotCount, DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_RATE};

use crate::error::{AudioError, AudioResult};

/// Largest period the mixer pre-allocates for
pub const MAX_CHUNK_SIZE: usize = 8192;

/// Smallest period accepted (64 @ 44.1kHz = ~1.5ms)
pub const MIN_CHUNK_SIZE: usize = 16;

/// Capture → playback ring size, in periods
pub const DEFAULT_RING_PERIODS: usize = 8;

/// Supported sample rate range (Hz)
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8_000..=192_000;

#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    pub sample_rate: u32,
    /// Frames per period, requested from the device and used by the mixer
    pub chunk_size: usize,
    pub shots: ShotCount,
    /// Input device name (None = host default)
    pub input_device: Option<String>,
    /// Output device name (None = host default)
    pub output_device: Option<String>,
    pub ring_periods: usize,
    /// Fixed noise seed (None = OS entropy)
    pub seed: Option<u64>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            shots: ShotCount::default(),
            input_device: None,
            output_device: None,
            ring_periods: DEFAULT_RING_PERIODS,
            seed: None,
        }
    }
}

impl StreamSettings {
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_chunk_size(mut self, frames: usize) -> Self {
        self.chunk_size = frames;
        self
    }

    pub fn with_shots(mut self, shots: ShotCount) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_input_device(mut self, name: impl Into<String>) -> Self {
        self.input_device = Some(name.into());
        self
    }

    pub fn with_output_device(mut self, name: impl Into<String>) -> Self {
        self.output_device = Some(name.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject settings no device could satisfy
    pub fn validate(&self) -> AudioResult<()> {
        if !SAMPLE_RATE_RANGE.contains(&self.sample_rate) {
            return Err(AudioError::InvalidSettings(format!(
                "sample rate {}Hz outside {}..={}Hz",
                self.sample_rate,
                SAMPLE_RATE_RANGE.start(),
                SAMPLE_RATE_RANGE.end()
            )));
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(AudioError::InvalidSettings(format!(
                "chunk size {} outside {}..={}",
                self.chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
            )));
        }
        if self.ring_periods < 2 {
            return Err(AudioError::InvalidSettings(
                "ring must hold at least 2 periods".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ring_capacity(&self) -> usize {
        self.chunk_size * self.ring_periods
    }

    /// Processing deadline per period in milliseconds
    pub fn period_ms(&self) -> f32 {
        (self.chunk_size as f32 / self.sample_rate as f32) * 1000.0
    }

    pub fn mixer_config(&self) -> MixerConfig {
        MixerConfig {
            shots: self.shots,
            max_frames: self.chunk_size,
        }
    }
}
