//! Quantum Filter FFI - C Foreign Function Interface
//!
//! C-compatible API for hosts that own the control panel and the audio
//! device: the host creates a parameter store for its UI thread and a mixer
//! for its audio callback.

use std::os::raw::{c_char, c_int};

use qfilter_dsp::{MixerConfig, ParameterStore, RealtimeMixer, ShotCount};

mod params_ffi;
pub use params_ffi::*;

/// Opaque handle to RealtimeMixer (C-compatible)
pub struct QFMixer {
    _private: [u8; 0],
}

/// Status returned for null or invalid arguments
pub const QFILTER_STATUS_INVALID: c_int = -1;

/// C-compatible mixer config
#[repr(C)]
pub struct CMixerConfig {
    /// Measurement shots per sample (0 = default)
    pub shots: u32,
    /// Largest period the host will pass (0 = default)
    pub max_frames: u32,
    /// Non-zero to use `seed` instead of OS entropy
    pub use_seed: c_int,
    pub seed: u64,
}

// ============================================================================
// MIXER API
// ============================================================================

/// Create a new mixer
///
/// # Safety
/// Caller must ensure config is valid or null (null = defaults).
#[no_mangle]
pub unsafe extern "C" fn qfilter_mixer_create(config: *const CMixerConfig) -> *mut QFMixer {
    let mut rust_config = MixerConfig::default();
    let mut seed = None;

    if !config.is_null() {
        let c = &*config;
        if let Some(shots) = ShotCount::new(c.shots) {
            rust_config.shots = shots;
        }
        if c.max_frames > 0 {
            rust_config.max_frames = c.max_frames as usize;
        }
        if c.use_seed != 0 {
            seed = Some(c.seed);
        }
    }

    let mixer = match seed {
        Some(seed) => RealtimeMixer::seeded(rust_config, seed),
        None => RealtimeMixer::new(rust_config),
    };
    log::debug!(
        "Created mixer: {} shots, {} frame scratch",
        rust_config.shots,
        rust_config.max_frames
    );

    Box::into_raw(Box::new(mixer)) as *mut QFMixer
}

/// Destroy a mixer
///
/// # Safety
/// Caller must ensure ptr is valid and not already freed.
#[no_mangle]
pub unsafe extern "C" fn qfilter_mixer_destroy(ptr: *mut QFMixer) {
    if !ptr.is_null() {
        let _ = Box::from_raw(ptr as *mut RealtimeMixer);
    }
}

/// Process one period in place
///
/// Returns 0 (wet), 1 (silent) or 2 (dry fallback), or -1 for null
/// arguments. Never aborts the host's audio callback.
///
/// # Safety
/// `mixer` and `params` must be valid; `buffer` must point to `len` floats.
/// Only one thread may process through a given mixer at a time.
#[no_mangle]
pub unsafe extern "C" fn qfilter_mixer_process(
    mixer: *mut QFMixer,
    params: *const QFParams,
    buffer: *mut f32,
    len: usize,
) -> c_int {
    if mixer.is_null() || params.is_null() || (buffer.is_null() && len > 0) {
        return QFILTER_STATUS_INVALID;
    }
    if len == 0 {
        return qfilter_dsp::ProcessStatus::Silent as c_int;
    }

    let mixer = &mut *(mixer as *mut RealtimeMixer);
    let params = &*(params as *const ParameterStore);
    let samples = std::slice::from_raw_parts_mut(buffer, len);

    mixer.process_in_place(samples, params) as c_int
}

/// Get the number of periods processed
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_mixer_get_periods_processed(ptr: *const QFMixer) -> u64 {
    if ptr.is_null() {
        return 0;
    }

    let mixer = &*(ptr as *const RealtimeMixer);
    mixer.stats().periods_processed
}

/// Get the number of periods that fell back to the dry signal
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_mixer_get_dry_fallbacks(ptr: *const QFMixer) -> u64 {
    if ptr.is_null() {
        return 0;
    }

    let mixer = &*(ptr as *const RealtimeMixer);
    mixer.stats().dry_fallbacks
}

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

/// Get the library version string
///
/// # Safety
/// Returns a static string, safe to call.
#[no_mangle]
pub extern "C" fn qfilter_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Check if the AVX clip path is available
///
/// # Safety
/// Safe to call, performs runtime CPU detection.
#[no_mangle]
pub extern "C" fn qfilter_has_avx() -> c_int {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            return 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    #[test]
    fn test_mixer_ffi() {
        unsafe {
            let config = CMixerConfig {
                shots: 32,
                max_frames: 128,
                use_seed: 1,
                seed: 99,
            };

            let mixer = qfilter_mixer_create(&config);
            let params = qfilter_params_create(0.75, 0);
            assert!(!mixer.is_null());

            let mut buffer = vec![0.5f32; 128];
            let status = qfilter_mixer_process(mixer, params, buffer.as_mut_ptr(), buffer.len());
            assert_eq!(status, 0);
            for sample in &buffer {
                assert!((sample - 0.5).abs() < 1e-6);
            }

            let mut silence = vec![0.0f32; 128];
            let status = qfilter_mixer_process(mixer, params, silence.as_mut_ptr(), silence.len());
            assert_eq!(status, 1);

            let mut broken = vec![f32::NAN; 16];
            let status = qfilter_mixer_process(mixer, params, broken.as_mut_ptr(), broken.len());
            assert_eq!(status, 2);
            assert!(broken.iter().all(|&s| s == 0.0));

            assert_eq!(qfilter_mixer_get_periods_processed(mixer), 3);
            assert_eq!(qfilter_mixer_get_dry_fallbacks(mixer), 1);

            qfilter_mixer_destroy(mixer);
            qfilter_params_destroy(params);
        }
    }

    #[test]
    fn test_mixer_defaults_and_null_args() {
        unsafe {
            let mixer = qfilter_mixer_create(ptr::null());
            assert!(!mixer.is_null());

            let mut buffer = [0.1f32; 4];
            assert_eq!(
                qfilter_mixer_process(mixer, ptr::null(), buffer.as_mut_ptr(), 4),
                QFILTER_STATUS_INVALID
            );
            assert_eq!(qfilter_mixer_get_periods_processed(ptr::null()), 0);

            qfilter_mixer_destroy(mixer);
        }
    }

    #[test]
    fn test_cpu_features() {
        let has_avx = qfilter_has_avx();
        println!("AVX: {}", has_avx);
    }

    #[test]
    fn test_version() {
        unsafe {
            let version = qfilter_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, "0.1.0");
        }
    }
}
