//! Windowed rolling average of the tachometer signal.
//!
//! ```text
//!   ISR side                          task side
//!   Accumulator ── result (atomic) ──▶ AverageReader
//!   {accumulator, count}               windows counter tells it
//!                                      when a new mean landed
//! ```
//!
//! Only the producer half touches `accumulator`/`count`; the consumer
//! sees nothing but the published `result`.  Publication is a sequence
//! lock: the producer makes `sequence` odd while it writes and even
//! again once the mean is in place, and the reader retries until it has
//! read the mean between two equal even loads.  Atomics are load/store
//! only so the same code runs on cores without compare-and-swap.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering, fence};

use crate::acquisition::SampleSink;
use crate::error::QueueError;
use crate::queue::SampleQueue;

/// Samples per window unless configured otherwise.
pub const DEFAULT_WINDOW: u32 = 100;

/// Shared publish slot.  Split once into its two halves.
pub struct RollingAverage {
    result: AtomicI32,
    /// Twice the published window count, plus one while a write is open.
    sequence: AtomicU32,
    claimed: AtomicBool,
}

impl RollingAverage {
    pub const fn new() -> Self {
        Self {
            result: AtomicI32::new(0),
            sequence: AtomicU32::new(0),
            claimed: AtomicBool::new(false),
        }
    }

    /// Hand out the producer and consumer halves.
    ///
    /// Returns `None` on the second call or for a zero window.
    pub fn split(&self, window_size: u32) -> Option<(Accumulator<'_>, AverageReader<'_>)> {
        if window_size == 0 {
            return None;
        }
        let first = critical_section::with(|_| {
            let taken = self.claimed.load(Ordering::Relaxed);
            self.claimed.store(true, Ordering::Relaxed);
            !taken
        });
        if !first {
            return None;
        }
        Some((
            Accumulator {
                shared: self,
                accumulator: 0,
                count: 0,
                window_size,
            },
            AverageReader {
                shared: self,
                seen: 0,
            },
        ))
    }
}

impl Default for RollingAverage {
    fn default() -> Self {
        Self::new()
    }
}

// ── Producer ──────────────────────────────────────────────────

pub struct Accumulator<'a> {
    shared: &'a RollingAverage,
    accumulator: i64,
    count: u32,
    window_size: u32,
}

impl Accumulator<'_> {
    /// Add one sample.  On the sample that completes a window, publish
    /// and return the mean (truncated toward zero) and start a new window.
    pub fn accumulate(&mut self, millivolts: i32) -> Option<i32> {
        self.accumulator += i64::from(millivolts);
        self.count += 1;
        if self.count < self.window_size {
            return None;
        }

        let mean = (self.accumulator / i64::from(self.window_size)) as i32;
        self.accumulator = 0;
        self.count = 0;

        let seq = self.shared.sequence.load(Ordering::Relaxed);
        self.shared
            .sequence
            .store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.shared.result.store(mean, Ordering::Relaxed);
        self.shared
            .sequence
            .store(seq.wrapping_add(2), Ordering::Release);
        Some(mean)
    }

    /// Samples in the current, unfinished window.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }
}

impl SampleSink for Accumulator<'_> {
    fn deliver(&mut self, millivolts: i32) -> Result<(), QueueError> {
        self.accumulate(millivolts);
        Ok(())
    }
}

// ── Consumer ──────────────────────────────────────────────────

pub struct AverageReader<'a> {
    shared: &'a RollingAverage,
    seen: u32,
}

impl AverageReader<'_> {
    /// Last published mean; 0 before the first window completes.
    pub fn result(&self) -> i32 {
        self.snapshot().1
    }

    /// Windows published so far (wrapping).
    pub fn windows(&self) -> u32 {
        self.shared.sequence.load(Ordering::Acquire) / 2
    }

    /// The mean, but only if a window completed since the last call.
    /// The returned mean always belongs to the window count recorded.
    pub fn fresh(&mut self) -> Option<i32> {
        let (windows, mean) = self.snapshot();
        if windows == self.seen {
            return None;
        }
        self.seen = windows;
        Some(mean)
    }

    /// Window count and the mean published with it, read consistently.
    fn snapshot(&self) -> (u32, i32) {
        loop {
            let before = self.shared.sequence.load(Ordering::Acquire);
            if before % 2 == 0 {
                let mean = self.shared.result.load(Ordering::Relaxed);
                fence(Ordering::Acquire);
                if self.shared.sequence.load(Ordering::Relaxed) == before {
                    return (before / 2, mean);
                }
            }
            core::hint::spin_loop();
        }
    }
}

// ── Averaging sink with task wake-up ──────────────────────────

/// Accumulates in the ISR and pushes each completed mean into the
/// control task's queue, which is what wakes the task.
pub struct WindowedSink<'a, const N: usize> {
    accumulator: Accumulator<'a>,
    queue: &'a SampleQueue<i32, N>,
}

impl<'a, const N: usize> WindowedSink<'a, N> {
    pub fn new(accumulator: Accumulator<'a>, queue: &'a SampleQueue<i32, N>) -> Self {
        Self { accumulator, queue }
    }

    pub fn accumulator(&self) -> &Accumulator<'a> {
        &self.accumulator
    }
}

impl<const N: usize> SampleSink for WindowedSink<'_, N> {
    fn deliver(&mut self, millivolts: i32) -> Result<(), QueueError> {
        match self.accumulator.accumulate(millivolts) {
            Some(mean) => self.queue.put(mean),
            None => Ok(()),
        }
    }
}
