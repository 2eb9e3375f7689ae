//! Noise model error types
//!
//! Variants carry only `Copy` data so they can be built on the audio thread
//! without allocating.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NoiseError {
    /// A probability or distribution left its valid domain
    #[error("numeric domain error in {context}: {value}")]
    NumericDomain { context: &'static str, value: f64 },

    /// Buffer lengths do not satisfy the model's contract
    #[error("length mismatch: got {len} samples, expected {expected}")]
    LengthMismatch { len: usize, expected: usize },

    /// Input contained NaN or infinity
    #[error("non-finite input sample at index {index}")]
    NonFiniteInput { index: usize },
}

pub type NoiseResult<T> = Result<T, NoiseError>;
