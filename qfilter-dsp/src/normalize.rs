//! Peak detection and peak normalization

use crate::error::{NoiseError, NoiseResult};

/// Largest absolute sample value
///
/// Fails on the first NaN or infinite sample, since `f32::max` would
/// silently skip NaN and an infinite peak cannot be normalized by.
pub fn peak_abs(buffer: &[f32]) -> NoiseResult<f32> {
    let mut peak = 0.0f32;
    for (index, sample) in buffer.iter().enumerate() {
        if !sample.is_finite() {
            return Err(NoiseError::NonFiniteInput { index });
        }
        peak = peak.max(sample.abs());
    }
    Ok(peak)
}

/// Write `input / peak` into `out` and return the peak
///
/// An all-zero input yields an all-zero output. `out` must be exactly as
/// long as `input`.
pub fn normalize_into(input: &[f32], out: &mut [f32]) -> NoiseResult<f32> {
    if out.len() != input.len() {
        return Err(NoiseError::LengthMismatch {
            len: out.len(),
            expected: input.len(),
        });
    }

    let peak = peak_abs(input)?;
    if peak == 0.0 {
        out.fill(0.0);
        return Ok(0.0);
    }

    for (dst, &src) in out.iter_mut().zip(input) {
        *dst = src / peak;
    }
    Ok(peak)
}

/// Allocating variant of [`normalize_into`]
pub fn normalize(input: &[f32]) -> NoiseResult<Vec<f32>> {
    let mut out = vec![0.0f32; input.len()];
    normalize_into(input, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_abs() {
        assert_eq!(peak_abs(&[0.1, -0.7, 0.3]), Ok(0.7));
        assert_eq!(peak_abs(&[]), Ok(0.0));
        assert_eq!(
            peak_abs(&[0.1, f32::NAN]),
            Err(NoiseError::NonFiniteInput { index: 1 })
        );
        assert_eq!(
            peak_abs(&[f32::INFINITY]),
            Err(NoiseError::NonFiniteInput { index: 0 })
        );
    }

    #[test]
    fn test_normalize_range() {
        let input = vec![0.2, -0.4, 0.1, 0.0];
        let normalized = normalize(&input).unwrap();

        assert_eq!(normalized[1], -1.0);
        assert!((normalized[0] - 0.5).abs() < 1e-6);
        for value in &normalized {
            assert!((-1.0..=1.0).contains(value), "{} out of range", value);
        }
    }

    #[test]
    fn test_normalize_silence() {
        let normalized = normalize(&[0.0; 16]).unwrap();
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_idempotent() {
        let input: Vec<f32> = (0..128).map(|i| (i as f32 * 0.37).sin() * 0.3).collect();

        let once = normalize(&input).unwrap();
        let twice = normalize(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_length_mismatch() {
        let mut out = [0.0f32; 3];
        assert_eq!(
            normalize_into(&[0.5; 4], &mut out),
            Err(NoiseError::LengthMismatch { len: 3, expected: 4 })
        );
    }
}
