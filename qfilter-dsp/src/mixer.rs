//! Real-time wet/dry mixer
//!
//! One call per audio period. The mixer owns its scratch buffers and random
//! source, so a warmed-up `process_in_place` performs no allocation, no I/O
//! and takes no locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::clipping::{sanitize_non_finite, scale_clip};
use crate::error::{NoiseError, NoiseResult};
use crate::noise::simulate_measurement;
use crate::normalize::normalize_into;
use crate::pairs::simulate_pairs;
use crate::params::ParameterStore;
use crate::types::{MixParameters, MixerConfig, NoiseMode, ProcessStatus, ShotCount};

/// Counters shared with the control thread
#[derive(Debug, Default)]
pub struct MixerCounters {
    periods: AtomicU64,
    silent: AtomicU64,
    fallbacks: AtomicU64,
}

impl MixerCounters {
    pub fn stats(&self) -> MixerStats {
        MixerStats {
            periods_processed: self.periods.load(Ordering::Relaxed),
            silent_periods: self.silent.load(Ordering::Relaxed),
            dry_fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Mixer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerStats {
    pub periods_processed: u64,
    pub silent_periods: u64,
    pub dry_fallbacks: u64,
}

/// Per-period noise mixer, generic over its random source
pub struct RealtimeMixer<R: Rng = SmallRng> {
    shots: ShotCount,
    rng: R,
    normalized: Vec<f32>,
    noise: Vec<f32>,
    counters: Arc<MixerCounters>,
}

impl RealtimeMixer<SmallRng> {
    /// Create a mixer seeded from OS entropy
    pub fn new(config: MixerConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Create a mixer with a reproducible noise sequence
    pub fn seeded(config: MixerConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RealtimeMixer<R> {
    pub fn with_rng(config: MixerConfig, rng: R) -> Self {
        Self {
            shots: config.shots,
            rng,
            normalized: vec![0.0; config.max_frames],
            noise: vec![0.0; config.max_frames],
            counters: Arc::new(MixerCounters::default()),
        }
    }

    pub fn shots(&self) -> ShotCount {
        self.shots
    }

    /// Frames that can be processed without reallocating scratch space
    pub fn capacity(&self) -> usize {
        self.noise.len()
    }

    /// Handle for reading statistics from another thread
    pub fn counters(&self) -> Arc<MixerCounters> {
        self.counters.clone()
    }

    pub fn stats(&self) -> MixerStats {
        self.counters.stats()
    }

    /// Process one period in place
    ///
    /// Never fails: numeric faults leave the dry signal in `buffer` (with
    /// non-finite samples silenced) and report [`ProcessStatus::DryFallback`].
    pub fn process_in_place(&mut self, buffer: &mut [f32], params: &ParameterStore) -> ProcessStatus {
        self.process_with(buffer, params.snapshot())
    }

    /// Process a copy of `input` and return the mixed output
    pub fn process(&mut self, input: &[f32], params: &ParameterStore) -> Vec<f32> {
        let mut output = input.to_vec();
        self.process_in_place(&mut output, params);
        output
    }

    /// Process one period against an explicit parameter snapshot
    pub fn process_with(&mut self, buffer: &mut [f32], params: MixParameters) -> ProcessStatus {
        self.counters.periods.fetch_add(1, Ordering::Relaxed);

        match self.try_process(buffer, params) {
            Ok(status) => {
                if status == ProcessStatus::Silent {
                    self.counters.silent.fetch_add(1, Ordering::Relaxed);
                }
                status
            }
            Err(err) => {
                let count = self.counters.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
                // Rate-limited: this runs on the audio thread
                if count.is_power_of_two() {
                    log::warn!("Noise stage failed ({}), passing dry signal (x{})", err, count);
                }
                sanitize_non_finite(buffer);
                ProcessStatus::DryFallback
            }
        }
    }

    /// Compute noise into scratch, then mix into `buffer`
    ///
    /// `buffer` is only written once the noise stage has succeeded.
    fn try_process(&mut self, buffer: &mut [f32], params: MixParameters) -> NoiseResult<ProcessStatus> {
        let len = buffer.len();
        self.ensure_capacity(len);

        let peak = normalize_into(buffer, &mut self.normalized[..len])?;
        if peak == 0.0 {
            // Silence stays silent; mixing zeros with zero noise is a no-op
            return Ok(ProcessStatus::Silent);
        }

        let mix = params.mix_ratio;
        if !(0.0..=1.0).contains(&mix) {
            return Err(NoiseError::NumericDomain {
                context: "mix ratio",
                value: mix as f64,
            });
        }

        let mode = NoiseMode::from(params.pair_mode);
        let noise_len = match mode {
            NoiseMode::Single => len,
            // Trailing odd sample is left out of the pair computation
            NoiseMode::Pairs => len & !1,
        };

        let normalized = &self.normalized[..noise_len];
        let noise = &mut self.noise[..noise_len];
        match mode {
            NoiseMode::Single => simulate_measurement(normalized, self.shots, &mut self.rng, noise)?,
            NoiseMode::Pairs => simulate_pairs(normalized, self.shots, &mut self.rng, noise)?,
        }

        scale_clip(noise, peak);

        let dry = 1.0 - mix;
        for (sample, &wet) in buffer[..noise_len].iter_mut().zip(noise.iter()) {
            *sample = dry * *sample + mix * wet;
        }
        // buffer[noise_len..] keeps its dry value

        Ok(ProcessStatus::Wet)
    }

    fn ensure_capacity(&mut self, len: usize) {
        if len > self.noise.len() {
            log::debug!("Growing mixer scratch from {} to {} frames", self.noise.len(), len);
            self.normalized.resize(len, 0.0);
            self.noise.resize(len, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipping::scale_clip_scalar;
    use crate::normalize::peak_abs;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;

    fn mixer(shots: u32, seed: u64) -> RealtimeMixer<StdRng> {
        let config = MixerConfig {
            shots: ShotCount::new(shots).unwrap(),
            max_frames: 128,
        };
        RealtimeMixer::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.13).sin() * 0.6).collect()
    }

    #[test]
    fn test_silence_stays_silent() {
        for pair_mode in [false, true] {
            for mix in [0.0, 0.3, 0.75, 1.0] {
                let params = ParameterStore::new(mix, pair_mode);
                let mut m = mixer(64, 1);

                let mut buffer = vec![0.0f32; 128];
                let status = m.process_in_place(&mut buffer, &params);

                assert_eq!(status, ProcessStatus::Silent);
                assert!(buffer.iter().all(|&s| s == 0.0));
            }
        }
    }

    #[test]
    fn test_zero_mix_is_identity() {
        for pair_mode in [false, true] {
            let params = ParameterStore::new(0.0, pair_mode);
            let input = test_signal(128);

            let output = mixer(64, 2).process(&input, &params);

            assert_eq!(output, input);
        }
    }

    #[test]
    fn test_full_mix_is_scaled_noise() {
        let params = ParameterStore::new(1.0, false);
        let input = test_signal(128);
        let peak = peak_abs(&input).unwrap();

        let output = mixer(64, 3).process(&input, &params);

        // Replay the same noise sequence by hand
        let mut rng = StdRng::seed_from_u64(3);
        let normalized = crate::normalize::normalize(&input).unwrap();
        let mut expected =
            crate::noise::measurement_expectations(&normalized, ShotCount::new(64).unwrap(), &mut rng)
                .unwrap();
        scale_clip_scalar(&mut expected, peak);

        assert_eq!(output, expected);
    }

    #[test]
    fn test_output_finite_for_finite_input() {
        let mut m = mixer(16, 4);
        let inputs = [
            test_signal(128),
            vec![f32::MAX; 128],
            vec![f32::MIN_POSITIVE; 128],
            (0..128).map(|i| if i % 2 == 0 { 3.5 } else { -1e-30 }).collect(),
        ];

        for input in &inputs {
            for pair_mode in [false, true] {
                for mix in [0.0, 0.5, 1.0] {
                    let params = ParameterStore::new(mix, pair_mode);
                    let output = m.process(input, &params);
                    assert!(output.iter().all(|s| s.is_finite()));
                }
            }
        }
    }

    #[test]
    fn test_constant_half_scenario() {
        let params = ParameterStore::new(0.75, false);
        let input = vec![0.5f32; 128];

        let output = mixer(64, 5).process(&input, &params);

        assert_eq!(output.len(), 128);
        for sample in output {
            assert_abs_diff_eq!(sample, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_odd_length_pair_mode() {
        let params = ParameterStore::new(0.5, true);
        let input = test_signal(129);

        let mut m = mixer(32, 6);
        let mut buffer = input.clone();
        let status = m.process_in_place(&mut buffer, &params);

        assert_eq!(status, ProcessStatus::Wet);
        assert_eq!(buffer.len(), 129);
        assert_eq!(buffer[128], input[128], "trailing sample passes through dry");
        assert!(buffer.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_nan_input_falls_back_to_dry() {
        let params = ParameterStore::new(0.8, false);
        let mut buffer = test_signal(128);
        buffer[10] = f32::NAN;
        buffer[20] = f32::INFINITY;
        let mut expected = buffer.clone();
        expected[10] = 0.0;
        expected[20] = 0.0;

        let mut m = mixer(8, 7);
        let status = m.process_in_place(&mut buffer, &params);

        assert_eq!(status, ProcessStatus::DryFallback);
        assert_eq!(buffer, expected);
        assert_eq!(m.stats().dry_fallbacks, 1);
    }

    #[test]
    fn test_out_of_range_snapshot_falls_back() {
        let input = test_signal(64);
        let mut buffer = input.clone();

        let status = mixer(8, 8).process_with(
            &mut buffer,
            MixParameters {
                mix_ratio: 1.5,
                pair_mode: false,
            },
        );

        assert_eq!(status, ProcessStatus::DryFallback);
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_scratch_grows_for_long_periods() {
        let params = ParameterStore::new(0.5, true);
        let mut m = mixer(4, 9);

        let output = m.process(&test_signal(1000), &params);

        assert_eq!(output.len(), 1000);
        assert!(m.capacity() >= 1000);
    }

    #[test]
    fn test_stats() {
        let params = ParameterStore::default();
        let mut m = mixer(4, 10);
        let counters = m.counters();

        m.process(&test_signal(128), &params);
        m.process(&[0.0; 128], &params);
        m.process(&[f32::NAN; 128], &params);

        assert_eq!(
            counters.stats(),
            MixerStats {
                periods_processed: 3,
                silent_periods: 1,
                dry_fallbacks: 1,
            }
        );
    }
}
