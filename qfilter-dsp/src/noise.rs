//! Single-sample measurement noise
//!
//! Each normalized sample `x` is read as a rotation angle on one qubit. The
//! probability of measuring `+1` is `cos²(2πx)`; averaging `shots` Bernoulli
//! trials gives an unbiased estimate of `cos(4πx)` whose variance shrinks as
//! `1 / shots`.
//!
//! All functions take the random source as `&mut R where R: Rng + ?Sized`, so
//! callers choose between a fast per-thread generator and a seeded one.

use std::f64::consts::TAU;

use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;

use crate::error::{NoiseError, NoiseResult};
use crate::types::ShotCount;

/// Deviation outside [0, 1] treated as ordinary rounding
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Deviation large enough to indicate a logic bug rather than rounding
pub const DOMAIN_FAULT_THRESHOLD: f64 = 1e-3;

/// Clamp a computed probability into [0, 1]
///
/// Non-finite values fail. Deviations beyond [`DOMAIN_FAULT_THRESHOLD`] are
/// still clamped but logged.
pub fn unit_probability(p: f64, context: &'static str) -> NoiseResult<f64> {
    if !p.is_finite() {
        return Err(NoiseError::NumericDomain { context, value: p });
    }

    let deviation = if p < 0.0 {
        -p
    } else if p > 1.0 {
        p - 1.0
    } else {
        0.0
    };
    if deviation > DOMAIN_FAULT_THRESHOLD {
        log::warn!("{} out of range by {:e}, clamping", context, deviation);
    }

    Ok(p.clamp(0.0, 1.0))
}

/// Probability of measuring `+1` for normalized sample `x`
pub fn measurement_probability(x: f32) -> NoiseResult<f64> {
    let c = (TAU * x as f64).cos();
    unit_probability(c * c, "measurement probability")
}

/// Noise-free expectation `2p - 1 = cos(4πx)`
pub fn expected_outcome(x: f32) -> f64 {
    (2.0 * TAU * x as f64).cos()
}

/// Mean of `shots` trials with outcome `+1` (probability `p`) or `-1`
pub fn measure_shots<R: Rng + ?Sized>(p: f64, shots: ShotCount, rng: &mut R) -> NoiseResult<f32> {
    let trial = Bernoulli::new(p).map_err(|_| NoiseError::NumericDomain {
        context: "bernoulli trial",
        value: p,
    })?;

    let n = shots.get();
    let mut hits: u64 = 0;
    for _ in 0..n {
        if trial.sample(rng) {
            hits += 1;
        }
    }

    let n = n as f64;
    Ok(((2.0 * hits as f64 - n) / n) as f32)
}

/// Measure every sample of `input` into `out`
///
/// `out` must be exactly as long as `input`. On error `out` may be partly
/// written.
pub fn simulate_measurement<R: Rng + ?Sized>(
    input: &[f32],
    shots: ShotCount,
    rng: &mut R,
    out: &mut [f32],
) -> NoiseResult<()> {
    if out.len() != input.len() {
        return Err(NoiseError::LengthMismatch {
            len: out.len(),
            expected: input.len(),
        });
    }

    for (dst, &x) in out.iter_mut().zip(input) {
        let p = measurement_probability(x)?;
        *dst = measure_shots(p, shots, rng)?;
    }
    Ok(())
}

/// Allocating variant of [`simulate_measurement`]
pub fn measurement_expectations<R: Rng + ?Sized>(
    input: &[f32],
    shots: ShotCount,
    rng: &mut R,
) -> NoiseResult<Vec<f32>> {
    let mut out = vec![0.0f32; input.len()];
    simulate_measurement(input, shots, rng, &mut out)?;
    Ok(out)
}
