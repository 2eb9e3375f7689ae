//! Audio boundary error types

use std::fmt;

use thiserror::Error;

/// Errors raised while opening or configuring the stream
///
/// These only ever surface on the control path, never from an audio callback.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No default device for the requested direction
    #[error("No default audio {0} device")]
    NoDefaultDevice(Direction),

    /// Named device not found
    #[error("Audio {direction} device not found: {name}")]
    DeviceNotFound { direction: Direction, name: String },

    /// Device enumeration failed
    #[error("Failed to enumerate audio devices: {0}")]
    Enumeration(String),

    /// Device does not support the requested configuration
    #[error("Unsupported {direction} config: {message}")]
    UnsupportedConfig { direction: Direction, message: String },

    /// Failed to build audio stream
    #[error("Failed to build {direction} stream: {message}")]
    StreamBuildError { direction: Direction, message: String },

    /// Failed to start/play stream
    #[error("Failed to start {direction} stream: {message}")]
    StreamPlayError { direction: Direction, message: String },

    /// Settings rejected before touching any device
    #[error("Invalid stream settings: {0}")]
    InvalidSettings(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Stream direction, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Device-level fault reported while the stream is running
///
/// Not recoverable by the mixer; the control path reports it and tears the
/// stream down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamFault {
    #[error("Audio {0} device disconnected")]
    DeviceDisconnected(Direction),

    #[error("Audio {direction} stream error: {message}")]
    Backend { direction: Direction, message: String },
}

impl StreamFault {
    pub fn from_cpal(direction: Direction, err: cpal::StreamError) -> Self {
        match err {
            cpal::StreamError::DeviceNotAvailable => StreamFault::DeviceDisconnected(direction),
            cpal::StreamError::BackendSpecific { err } => StreamFault::Backend {
                direction,
                message: err.description,
            },
            #[allow(unreachable_patterns)]
            other => StreamFault::Backend {
                direction,
                message: other.to_string(),
            },
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            StreamFault::DeviceDisconnected(direction) => *direction,
            StreamFault::Backend { direction, .. } => *direction,
        }
    }
}
