//! Rescale-and-clip for the wet signal, with AVX SIMD
//!
//! Multiplies noise expectations by the period peak, clips to [-1.0, 1.0] and
//! maps NaN to 0.0. The AVX path handles 8 floats per iteration.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Scale by `gain` then clip to [-1.0, 1.0] with AVX SIMD
///
/// # Safety
/// Requires AVX CPU support.
#[target_feature(enable = "avx")]
#[cfg(target_arch = "x86_64")]
pub unsafe fn scale_clip_avx(buffer: &mut [f32], gain: f32) {
    let min_val = _mm256_set1_ps(-1.0);
    let max_val = _mm256_set1_ps(1.0);
    let gain_vec = _mm256_set1_ps(gain);

    let mut i = 0;
    let len = buffer.len();

    while i + 8 <= len {
        let mut val = _mm256_loadu_ps(buffer.as_ptr().add(i));
        val = _mm256_mul_ps(val, gain_vec);

        // NaN → 0.0 (NaN != NaN)
        let nan_mask = _mm256_cmp_ps(val, val, _CMP_EQ_OQ);
        val = _mm256_and_ps(val, nan_mask);

        val = _mm256_min_ps(val, max_val);
        val = _mm256_max_ps(val, min_val);

        _mm256_storeu_ps(buffer.as_mut_ptr().add(i), val);
        i += 8;
    }

    // Tail (< 8 samples)
    scale_clip_scalar(&mut buffer[i..], gain);
}

/// Portable fallback
pub fn scale_clip_scalar(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        let val = *sample * gain;
        *sample = if val.is_nan() {
            0.0
        } else {
            val.clamp(-1.0, 1.0)
        };
    }
}

/// Scale and clip with runtime CPU detection
pub fn scale_clip(buffer: &mut [f32], gain: f32) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            unsafe {
                scale_clip_avx(buffer, gain);
            }
            return;
        }
    }

    scale_clip_scalar(buffer, gain);
}

/// Clip to [-1.0, 1.0] without scaling
pub fn clip_unit(buffer: &mut [f32]) {
    scale_clip(buffer, 1.0);
}

/// Replace NaN and infinities with silence, leaving finite samples untouched
///
/// Used for dry passthrough, where in-range clipping would alter the signal.
pub fn sanitize_non_finite(buffer: &mut [f32]) -> usize {
    let mut replaced = 0;
    for sample in buffer.iter_mut() {
        if !sample.is_finite() {
            *sample = 0.0;
            replaced += 1;
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_in_range() {
        let mut buffer = vec![0.5, -0.5, 0.0, 0.9, -0.9];
        let expected = buffer.clone();

        clip_unit(&mut buffer);

        assert_eq!(buffer, expected, "In-range values should not change");
    }

    #[test]
    fn test_scale_pushes_out_of_range() {
        let mut buffer = vec![1.0, -1.0, 0.5, -0.25];
        scale_clip(&mut buffer, 1.5);

        assert_eq!(buffer[0], 1.0, "1.5 should clip to 1.0");
        assert_eq!(buffer[1], -1.0, "-1.5 should clip to -1.0");
        assert_eq!(buffer[2], 0.75);
        assert_eq!(buffer[3], -0.375);
    }

    #[test]
    fn test_clip_nan() {
        let mut buffer = vec![f32::NAN, 0.5, f32::NAN, -0.5];
        clip_unit(&mut buffer);

        assert_eq!(buffer[0], 0.0, "NaN should become 0.0");
        assert_eq!(buffer[1], 0.5);
        assert_eq!(buffer[2], 0.0, "NaN should become 0.0");
        assert_eq!(buffer[3], -0.5);
    }

    #[test]
    fn test_sanitize_keeps_finite_out_of_range() {
        let mut buffer = vec![2.0, f32::INFINITY, -3.0, f32::NAN, f32::NEG_INFINITY];
        let replaced = sanitize_non_finite(&mut buffer);

        assert_eq!(replaced, 3);
        assert_eq!(buffer, vec![2.0, 0.0, -3.0, 0.0, 0.0]);
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_avx_vs_scalar() {
        if !is_x86_feature_detected!("avx") {
            return;
        }

        let mut buffer_avx = vec![0.0f32; 1027];
        let mut buffer_scalar = vec![0.0f32; 1027];

        for i in 0..buffer_avx.len() {
            let val = ((i as f32) / 10.0).sin();
            buffer_avx[i] = val;
            buffer_scalar[i] = val;
        }

        buffer_avx[100] = f32::NAN;
        buffer_scalar[100] = f32::NAN;
        buffer_avx[1025] = f32::NAN;
        buffer_scalar[1025] = f32::NAN;

        unsafe {
            scale_clip_avx(&mut buffer_avx, 1.8);
        }
        scale_clip_scalar(&mut buffer_scalar, 1.8);

        for (i, (avx, scalar)) in buffer_avx.iter().zip(buffer_scalar.iter()).enumerate() {
            assert!(
                (avx - scalar).abs() < 0.0001,
                "Mismatch at index {}: AVX={}, Scalar={}",
                i,
                avx,
                scalar
            );
        }
    }
}
