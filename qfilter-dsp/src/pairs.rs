//! Pair entanglement noise
//!
//! Consecutive samples `(x, y)` are measured jointly as two correlated qubits.
//! The four joint outcomes follow a categorical distribution built from
//! trigonometric cross terms, and each outcome maps to a pair of `±1`
//! values. This is a distinct distribution, not two single-sample draws.

use std::f64::consts::TAU;

use rand::Rng;

use crate::error::{NoiseError, NoiseResult};
use crate::noise::DOMAIN_FAULT_THRESHOLD;
use crate::types::ShotCount;

/// Allowed drift of the joint distribution total from 1 before renormalizing
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Outcome index → (first, second) measurement value
pub const PAIR_OUTCOMES: [[i32; 2]; 4] = [[-1, -1], [-1, 1], [1, -1], [1, 1]];

/// Joint probabilities `[p(--), p(-+), p(+-), p(++)]` for the pair `(x, y)`
pub fn joint_probabilities(x: f32, y: f32) -> NoiseResult<[f64; 4]> {
    let (s1, c1) = (TAU * x as f64).sin_cos();
    let (s2, c2) = (TAU * y as f64).sin_cos();

    let mut probs = [
        (c1 * c2).powi(2),
        (c1 * s2).powi(2),
        (s1 * s2).powi(2),
        (s1 * c2).powi(2),
    ];

    let total: f64 = probs.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(NoiseError::NumericDomain {
            context: "joint distribution total",
            value: total,
        });
    }

    let drift = (total - 1.0).abs();
    if drift > DISTRIBUTION_TOLERANCE {
        if drift > DOMAIN_FAULT_THRESHOLD {
            log::warn!("joint distribution sums to {}, renormalizing", total);
        }
        for p in probs.iter_mut() {
            *p /= total;
        }
    }

    Ok(probs)
}

/// Draw one outcome index from a categorical distribution
///
/// Walks the cumulative sum instead of building a `WeightedIndex`, which
/// would allocate on the audio thread.
pub fn sample_outcome<R: Rng + ?Sized>(probs: &[f64; 4], rng: &mut R) -> usize {
    let u: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (k, &p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return k;
        }
    }
    // Rounding left the total just under `u`
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Measure each pair of `input` into the matching pair of `out`
///
/// `input` must have even length and `out` must match it.
pub fn simulate_pairs<R: Rng + ?Sized>(
    input: &[f32],
    shots: ShotCount,
    rng: &mut R,
    out: &mut [f32],
) -> NoiseResult<()> {
    if input.len() % 2 != 0 {
        return Err(NoiseError::LengthMismatch {
            len: input.len(),
            expected: input.len() - 1,
        });
    }
    if out.len() != input.len() {
        return Err(NoiseError::LengthMismatch {
            len: out.len(),
            expected: input.len(),
        });
    }

    let n = shots.get();
    for (pair, dst) in input.chunks_exact(2).zip(out.chunks_exact_mut(2)) {
        let probs = joint_probabilities(pair[0], pair[1])?;

        let mut sums = [0i64; 2];
        for _ in 0..n {
            let outcome = PAIR_OUTCOMES[sample_outcome(&probs, rng)];
            sums[0] += outcome[0] as i64;
            sums[1] += outcome[1] as i64;
        }

        dst[0] = (sums[0] as f64 / n as f64) as f32;
        dst[1] = (sums[1] as f64 / n as f64) as f32;
    }
    Ok(())
}

/// Allocating variant of [`simulate_pairs`]
pub fn pair_expectations<R: Rng + ?Sized>(
    input: &[f32],
    shots: ShotCount,
    rng: &mut R,
) -> NoiseResult<Vec<f32>> {
    let mut out = vec![0.0f32; input.len()];
    simulate_pairs(input, shots, rng, &mut out)?;
    Ok(out)
}
