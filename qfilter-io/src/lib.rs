//! Quantum Filter audio boundary
//!
//! Opens a mono duplex stream with cpal and runs the `qfilter-dsp` mixer
//! inside the playback callback.
//!
//! Key features:
//! - Lock-free capture → playback ring (rtrb SPSC)
//! - Fixed-size mixer periods independent of device callback size
//! - Device faults forwarded to the control thread over a channel

pub mod config;
pub mod device;
pub mod error;
pub mod processor;
pub mod stream;

pub use config::*;
pub use device::{list_devices, AudioDevice};
pub use error::*;
pub use processor::{duplex_pipeline, BlockProcessor, CaptureWriter, StreamCounters, StreamStats};
pub use stream::{start_stream, StreamHandle};
