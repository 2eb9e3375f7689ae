//! Lock-free parameter store shared by the control and audio threads
//!
//! Each field is an independent atomic. The mix ratio is stored as `f32`
//! bits in an `AtomicU32`, so readers never observe a torn value. No
//! ordering is promised between the two fields.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::types::{MixParameters, DEFAULT_MIX_RATIO, DEFAULT_PAIR_MODE};

/// Upper end of the integer slider range
pub const MIX_PERCENT_MAX: u32 = 100;

#[derive(Debug)]
pub struct ParameterStore {
    mix_ratio: AtomicU32, // f32 bits
    pair_mode: AtomicBool,
}

impl ParameterStore {
    pub fn new(mix_ratio: f32, pair_mode: bool) -> Self {
        let ratio = sanitize_ratio(mix_ratio).unwrap_or(DEFAULT_MIX_RATIO);
        Self {
            mix_ratio: AtomicU32::new(ratio.to_bits()),
            pair_mode: AtomicBool::new(pair_mode),
        }
    }

    /// Current wet/dry ratio in [0, 1]
    pub fn mix_ratio(&self) -> f32 {
        f32::from_bits(self.mix_ratio.load(Ordering::Relaxed))
    }

    /// Store a new ratio, clamped to [0, 1]
    ///
    /// NaN is rejected and the previous value kept. Returns the stored value.
    pub fn set_mix_ratio(&self, ratio: f32) -> f32 {
        match sanitize_ratio(ratio) {
            Some(ratio) => {
                self.mix_ratio.store(ratio.to_bits(), Ordering::Relaxed);
                ratio
            }
            None => {
                log::warn!("Ignoring NaN mix ratio");
                self.mix_ratio()
            }
        }
    }

    /// Map slider units [0, 100] onto [0.0, 1.0]
    pub fn set_mix_percent(&self, percent: u32) -> f32 {
        let percent = percent.min(MIX_PERCENT_MAX);
        self.set_mix_ratio(percent as f32 / MIX_PERCENT_MAX as f32)
    }

    /// Current ratio in slider units
    pub fn mix_percent(&self) -> u32 {
        (self.mix_ratio() * MIX_PERCENT_MAX as f32).round() as u32
    }

    pub fn pair_mode(&self) -> bool {
        self.pair_mode.load(Ordering::Relaxed)
    }

    pub fn set_pair_mode(&self, enabled: bool) {
        self.pair_mode.store(enabled, Ordering::Relaxed);
    }

    /// Flip pair mode and return the new state
    pub fn toggle_pair_mode(&self) -> bool {
        !self.pair_mode.fetch_xor(true, Ordering::Relaxed)
    }

    /// Read both fields for one period
    pub fn snapshot(&self) -> MixParameters {
        MixParameters {
            mix_ratio: self.mix_ratio(),
            pair_mode: self.pair_mode(),
        }
    }

    /// Text for the control panel's ratio display
    pub fn mix_label(&self) -> String {
        format!("Mix Ratio: {:.2}", self.mix_ratio())
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(DEFAULT_MIX_RATIO, DEFAULT_PAIR_MODE)
    }
}

impl From<MixParameters> for ParameterStore {
    fn from(params: MixParameters) -> Self {
        Self::new(params.mix_ratio, params.pair_mode)
    }
}

fn sanitize_ratio(ratio: f32) -> Option<f32> {
    if ratio.is_nan() {
        None
    } else {
        Some(ratio.clamp(0.0, 1.0))
    }
}
