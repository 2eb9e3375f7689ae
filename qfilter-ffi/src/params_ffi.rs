//! Parameter store FFI bindings
//!
//! Called from the host's UI thread. Every function here is lock-free and
//! may run concurrently with `qfilter_mixer_process` on the audio thread.

use qfilter_dsp::ParameterStore;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

/// Opaque handle to ParameterStore (C-compatible)
pub struct QFParams {
    _private: [u8; 0],
}

/// Create a parameter store
///
/// # Safety
/// Safe to call. The returned pointer must be freed with
/// `qfilter_params_destroy`.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_create(mix_ratio: f32, pair_mode: c_int) -> *mut QFParams {
    let params = Box::new(ParameterStore::new(mix_ratio, pair_mode != 0));
    Box::into_raw(params) as *mut QFParams
}

/// Destroy a parameter store
///
/// # Safety
/// Caller must ensure ptr is valid, not already freed, and no longer used by
/// any mixer.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_destroy(ptr: *mut QFParams) {
    if !ptr.is_null() {
        let _ = Box::from_raw(ptr as *mut ParameterStore);
    }
}

/// Set the mix ratio from slider units [0, 100]
///
/// Returns the stored ratio, or -1.0 on a null handle.
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_set_mix_percent(ptr: *const QFParams, percent: c_uint) -> f32 {
    if ptr.is_null() {
        return -1.0;
    }

    let params = &*(ptr as *const ParameterStore);
    params.set_mix_percent(percent)
}

/// Set the mix ratio directly (clamped to [0, 1], NaN ignored)
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_set_mix_ratio(ptr: *const QFParams, ratio: f32) -> f32 {
    if ptr.is_null() {
        return -1.0;
    }

    let params = &*(ptr as *const ParameterStore);
    params.set_mix_ratio(ratio)
}

/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_get_mix_ratio(ptr: *const QFParams) -> f32 {
    if ptr.is_null() {
        return -1.0;
    }

    let params = &*(ptr as *const ParameterStore);
    params.mix_ratio()
}

/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_set_pair_mode(ptr: *const QFParams, enabled: c_int) {
    if ptr.is_null() {
        return;
    }

    let params = &*(ptr as *const ParameterStore);
    params.set_pair_mode(enabled != 0);
}

/// Flip pair mode. Returns the new state (1/0), or -1 on a null handle.
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_toggle_pair_mode(ptr: *const QFParams) -> c_int {
    if ptr.is_null() {
        return -1;
    }

    let params = &*(ptr as *const ParameterStore);
    params.toggle_pair_mode() as c_int
}

/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_get_pair_mode(ptr: *const QFParams) -> c_int {
    if ptr.is_null() {
        return -1;
    }

    let params = &*(ptr as *const ParameterStore);
    params.pair_mode() as c_int
}

/// Write the ratio display text ("Mix Ratio: 0.75") as a NUL-terminated string
///
/// Returns the number of bytes written excluding the NUL, or -1 if a
/// pointer is null or the buffer is too small.
///
/// # Safety
/// Caller must ensure ptr is valid and `buf` points to `len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn qfilter_params_mix_label(
    ptr: *const QFParams,
    buf: *mut c_char,
    len: usize,
) -> c_int {
    if ptr.is_null() || buf.is_null() {
        return -1;
    }

    let params = &*(ptr as *const ParameterStore);
    let label = params.mix_label();
    let bytes = label.as_bytes();
    if bytes.len() + 1 > len {
        return -1;
    }

    ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, bytes.len());
    *buf.add(bytes.len()) = 0;
    bytes.len() as c_int
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_params_ffi() {
        unsafe {
            let params = qfilter_params_create(0.75, 0);
            assert!(!params.is_null());

            assert_eq!(qfilter_params_get_mix_ratio(params), 0.75);
            assert_eq!(qfilter_params_set_mix_percent(params, 40), 0.4);
            assert_eq!(qfilter_params_set_mix_ratio(params, 3.0), 1.0);

            assert_eq!(qfilter_params_get_pair_mode(params), 0);
            assert_eq!(qfilter_params_toggle_pair_mode(params), 1);
            qfilter_params_set_pair_mode(params, 0);
            assert_eq!(qfilter_params_get_pair_mode(params), 0);

            qfilter_params_destroy(params);
        }
    }

    #[test]
    fn test_mix_label_ffi() {
        unsafe {
            let params = qfilter_params_create(0.5, 0);
            let mut buf = [0 as c_char; 32];

            let written = qfilter_params_mix_label(params, buf.as_mut_ptr(), buf.len());
            assert_eq!(written, 15);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "Mix Ratio: 0.50");

            let mut tiny = [0 as c_char; 4];
            assert_eq!(qfilter_params_mix_label(params, tiny.as_mut_ptr(), tiny.len()), -1);

            qfilter_params_destroy(params);
        }
    }

    #[test]
    fn test_null_handles() {
        unsafe {
            assert_eq!(qfilter_params_get_mix_ratio(ptr::null()), -1.0);
            assert_eq!(qfilter_params_toggle_pair_mode(ptr::null()), -1);
            qfilter_params_destroy(ptr::null_mut());
        }
    }
}
