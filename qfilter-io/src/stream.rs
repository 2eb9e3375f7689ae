//! Duplex cpal stream running the mixer on the playback thread
//!
//! ```text
//! ┌──────────────┐  push()   ┌─────────────────┐  pop()   ┌──────────────────┐
//! │ Capture cb   │──────────►│  rtrb SPSC ring │─────────►│ Playback cb      │
//! │ (1st channel)│           │  (f32 samples)  │          │ BlockProcessor → │
//! └──────────────┘           └─────────────────┘          │ RealtimeMixer    │
//!                                                         └────────┬─────────┘
//!   Control thread ── Relaxed atomics ──► ParameterStore ◄─────────┘
//! ```
//!
//! Device errors are forwarded as [`StreamFault`]s on a bounded channel; the
//! callbacks themselves never block or fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::Stream;
use crossbeam::channel::{self, Receiver, Sender};
use qfilter_dsp::{MixerCounters, ParameterStore, RealtimeMixer};

use crate::config::StreamSettings;
use crate::device::{find_device, select_config};
use crate::error::{AudioError, AudioResult, Direction, StreamFault};
use crate::processor::{duplex_pipeline, snapshot, BlockProcessor, CaptureWriter, StreamCounters, StreamStats};

/// Pending faults kept for the control thread
const FAULT_QUEUE_CAPACITY: usize = 16;

/// Keeps the duplex stream alive. Drop this (or call [`stop`]) to stop audio.
///
/// [`stop`]: StreamHandle::stop
pub struct StreamHandle {
    streams: Option<DuplexStreams>,
    running: Arc<AtomicBool>,
    faults: Receiver<StreamFault>,
    mixer_counters: Arc<MixerCounters>,
    stream_counters: Arc<StreamCounters>,
    sample_rate: u32,
    chunk_size: usize,
}

struct DuplexStreams {
    input: Stream,
    output: Stream,
}

impl StreamHandle {
    /// Receiver for device-level faults
    pub fn faults(&self) -> Receiver<StreamFault> {
        self.faults.clone()
    }

    pub fn stats(&self) -> StreamStats {
        snapshot(&self.mixer_counters, &self.stream_counters)
    }

    pub fn is_running(&self) -> bool {
        self.streams.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// One-way output latency of a single period
    pub fn latency_ms(&self) -> f32 {
        (self.chunk_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Stop delivery, then release the devices
    ///
    /// The running flag is cleared first so a callback already in flight
    /// writes silence instead of touching the mixer. Safe to call twice.
    pub fn stop(&mut self) {
        let Some(streams) = self.streams.take() else {
            return;
        };

        self.running.store(false, Ordering::Release);
        if let Err(e) = streams.input.pause() {
            log::debug!("Pausing input stream failed: {}", e);
        }
        if let Err(e) = streams.output.pause() {
            log::debug!("Pausing output stream failed: {}", e);
        }
        drop(streams);

        log::info!("Audio stream stopped");
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open capture and playback devices and start processing
///
/// Errors here are the only user-visible failures of the audio boundary
/// (device missing, unsupported rate, backend refused to start).
pub fn start_stream(settings: &StreamSettings, params: Arc<ParameterStore>) -> AudioResult<StreamHandle> {
    settings.validate()?;

    let host = cpal::default_host();
    let input_device = find_device(&host, Direction::Input, settings.input_device.as_deref())?;
    let output_device = find_device(&host, Direction::Output, settings.output_device.as_deref())?;
    log::info!(
        "Using input {:?}, output {:?}",
        input_device.name().unwrap_or_else(|_| "Unknown".to_string()),
        output_device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let input_config = select_config(&input_device, Direction::Input, settings)?;
    let output_config = select_config(&output_device, Direction::Output, settings)?;

    let mixer = match settings.seed {
        Some(seed) => RealtimeMixer::seeded(settings.mixer_config(), seed),
        None => RealtimeMixer::new(settings.mixer_config()),
    };

    let running = Arc::new(AtomicBool::new(true));
    let (writer, processor) = duplex_pipeline(
        mixer,
        params,
        settings.chunk_size,
        settings.ring_capacity(),
        running.clone(),
    );
    let (mixer_counters, stream_counters) = processor.counters();
    let (fault_tx, fault_rx) = channel::bounded(FAULT_QUEUE_CAPACITY);

    let input = build_input_stream(&input_device, &input_config, writer, fault_tx.clone())?;
    let output = build_output_stream(&output_device, &output_config, processor, fault_tx)?;

    output.play().map_err(|e| AudioError::StreamPlayError {
        direction: Direction::Output,
        message: e.to_string(),
    })?;
    input.play().map_err(|e| AudioError::StreamPlayError {
        direction: Direction::Input,
        message: e.to_string(),
    })?;

    log::info!(
        "Audio stream started: {}Hz, {} frame periods (~{:.1}ms), {} shots",
        settings.sample_rate,
        settings.chunk_size,
        settings.period_ms(),
        settings.shots
    );

    Ok(StreamHandle {
        streams: Some(DuplexStreams { input, output }),
        running,
        faults: fault_rx,
        mixer_counters,
        stream_counters,
        sample_rate: settings.sample_rate,
        chunk_size: settings.chunk_size,
    })
}

fn build_input_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: CaptureWriter,
    faults: Sender<StreamFault>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    device
        .build_input_stream(
            config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                writer.write(data, channels);
            },
            move |err| report_fault(&faults, Direction::Input, err),
            None,
        )
        .map_err(|e| AudioError::StreamBuildError {
            direction: Direction::Input,
            message: e.to_string(),
        })
}

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut processor: BlockProcessor,
    faults: Sender<StreamFault>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                processor.fill(data, channels);
            },
            move |err| report_fault(&faults, Direction::Output, err),
            None,
        )
        .map_err(|e| AudioError::StreamBuildError {
            direction: Direction::Output,
            message: e.to_string(),
        })
}

fn report_fault(faults: &Sender<StreamFault>, direction: Direction, err: cpal::StreamError) {
    let fault = StreamFault::from_cpal(direction, err);
    log::error!("{}", fault);
    // Full queue: the control thread already has faults to act on
    let _ = faults.try_send(fault);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_fault_queue_never_blocks() {
        let (tx, rx) = channel::bounded(FAULT_QUEUE_CAPACITY);
        for _ in 0..FAULT_QUEUE_CAPACITY * 2 {
            report_fault(&tx, Direction::Output, cpal::StreamError::DeviceNotAvailable);
        }

        assert_eq!(rx.len(), FAULT_QUEUE_CAPACITY);
        assert_eq!(
            rx.try_recv(),
            Ok(StreamFault::DeviceDisconnected(Direction::Output))
        );
    }

    #[test]
    fn test_start_rejects_invalid_settings() {
        let settings = StreamSettings::default().with_chunk_size(1);
        let result = start_stream(&settings, Arc::new(ParameterStore::default()));
        assert!(matches!(result, Err(AudioError::InvalidSettings(_))));
    }
}
