//! Device-independent halves of the duplex stream
//!
//! The capture callback feeds a [`CaptureWriter`]; the playback callback
//! drains a [`BlockProcessor`]. They meet in a lock-free SPSC ring, so the
//! two device threads never wait on each other. The processor always hands
//! the mixer exactly one configured period, whatever size the device asks
//! for.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use qfilter_dsp::{MixerCounters, MixerStats, ParameterStore, RealtimeMixer};
use rand::rngs::SmallRng;
use rand::Rng;

/// Counters written by the device callbacks
#[derive(Debug, Default)]
pub struct StreamCounters {
    /// Captured samples dropped because the ring was full
    pub overruns: AtomicU64,
    /// Periods padded with silence because capture fell behind
    pub underruns: AtomicU64,
}

/// Statistics snapshot for the control path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub mixer: MixerStats,
    pub overruns: u64,
    pub underruns: u64,
}

/// Create a connected capture/playback pair
///
/// The ring is primed with one period of silence so playback starts with
/// a full block instead of an underrun.
pub fn duplex_pipeline<R: Rng>(
    mixer: RealtimeMixer<R>,
    params: Arc<ParameterStore>,
    chunk_size: usize,
    ring_capacity: usize,
    running: Arc<AtomicBool>,
) -> (CaptureWriter, BlockProcessor<R>) {
    let capacity = ring_capacity.max(chunk_size * 2);
    let (mut producer, consumer) = rtrb::RingBuffer::<f32>::new(capacity);
    for _ in 0..chunk_size {
        let _ = producer.push(0.0);
    }

    let counters = Arc::new(StreamCounters::default());
    let writer = CaptureWriter {
        producer,
        counters: counters.clone(),
    };
    let processor = BlockProcessor {
        mixer_counters: mixer.counters(),
        mixer,
        params,
        consumer,
        block: vec![0.0; chunk_size],
        cursor: chunk_size,
        running,
        counters,
    };
    (writer, processor)
}

/// Capture side: pushes the first channel of each frame into the ring
pub struct CaptureWriter {
    producer: rtrb::Producer<f32>,
    counters: Arc<StreamCounters>,
}

impl CaptureWriter {
    pub fn write(&mut self, data: &[f32], channels: usize) {
        let mut dropped = 0u64;
        for frame in data.chunks(channels.max(1)) {
            if self.producer.push(frame[0]).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.counters.overruns.fetch_add(dropped, Ordering::Relaxed);
        }
    }
}

/// Playback side: pulls periods from the ring, runs the mixer, writes frames
pub struct BlockProcessor<R: Rng = SmallRng> {
    mixer: RealtimeMixer<R>,
    mixer_counters: Arc<MixerCounters>,
    params: Arc<ParameterStore>,
    consumer: rtrb::Consumer<f32>,
    block: Vec<f32>,
    cursor: usize,
    running: Arc<AtomicBool>,
    counters: Arc<StreamCounters>,
}

impl<R: Rng> BlockProcessor<R> {
    /// Fill an interleaved device buffer, copying each sample to every channel
    pub fn fill(&mut self, data: &mut [f32], channels: usize) {
        if !self.running.load(Ordering::Acquire) {
            data.fill(0.0);
            return;
        }

        for frame in data.chunks_mut(channels.max(1)) {
            if self.cursor >= self.block.len() {
                self.next_block();
            }
            frame.fill(self.block[self.cursor]);
            self.cursor += 1;
        }
    }

    fn next_block(&mut self) {
        let mut missing = 0usize;
        for sample in self.block.iter_mut() {
            *sample = match self.consumer.pop() {
                Ok(sample) => sample,
                Err(_) => {
                    missing += 1;
                    0.0
                }
            };
        }
        if missing > 0 {
            self.counters.underruns.fetch_add(1, Ordering::Relaxed);
        }

        self.mixer.process_in_place(&mut self.block, &self.params);
        self.cursor = 0;
    }

    pub fn stats(&self) -> StreamStats {
        snapshot(&self.mixer_counters, &self.counters)
    }

    pub fn counters(&self) -> (Arc<MixerCounters>, Arc<StreamCounters>) {
        (self.mixer_counters.clone(), self.counters.clone())
    }
}

pub(crate) fn snapshot(mixer: &MixerCounters, stream: &StreamCounters) -> StreamStats {
    StreamStats {
        mixer: mixer.stats(),
        overruns: stream.overruns.load(Ordering::Relaxed),
        underruns: stream.underruns.load(Ordering::Relaxed),
    }
}
