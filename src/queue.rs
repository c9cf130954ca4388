//! Interrupt-to-task sample hand-off.
//!
//! The acquisition handler produces (never blocks), the control task
//! consumes (suspends until data exists).
//!
//! ```text
//! ┌─────────────┐  put   ┌──────────────────────┐  get   ┌──────────────┐
//! │ Ready ISR   │───────▶│  SampleQueue<T, N>   │───────▶│ Control task │
//! │ (producer)  │        │  items_available (#) │        │ (consumer)   │
//! └─────────────┘        │  mutual_exclusion    │        └──────────────┘
//!        │ full          └──────────────────────┘
//!        └──▶ lost_count += 1, value dropped
//! ```
//!
//! `items_available` is a counting semaphore over filled slots.
//! `mutual_exclusion` serializes head removal between consumers; the
//! producer never takes it.  Storage itself is touched only inside
//! short critical sections.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::Deque;

use crate::acquisition::SampleSink;
use crate::error::QueueError;

// ── Counting semaphore ────────────────────────────────────────

/// Counting semaphore whose `release` is safe from interrupt context.
struct CountingSemaphore {
    count: BlockingMutex<CriticalSectionRawMutex, Cell<usize>>,
    released: Signal<CriticalSectionRawMutex, ()>,
}

impl CountingSemaphore {
    const fn new(initial: usize) -> Self {
        Self {
            count: BlockingMutex::new(Cell::new(initial)),
            released: Signal::new(),
        }
    }

    fn release(&self) {
        self.count.lock(|c| c.set(c.get() + 1));
        self.released.signal(());
    }

    fn try_acquire(&self) -> bool {
        self.count.lock(|c| match c.get() {
            0 => false,
            n => {
                c.set(n - 1);
                true
            }
        })
    }

    /// Suspend until a permit is available, then take it.
    ///
    /// A release that lands between the failed `try_acquire` and the
    /// wait leaves the signal set, so no wake-up is lost.
    async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            self.released.wait().await;
        }
    }

    fn value(&self) -> usize {
        self.count.lock(Cell::get)
    }
}

// ── Queue ─────────────────────────────────────────────────────

/// Bounded FIFO with one interrupt-context producer.
pub struct SampleQueue<T, const N: usize> {
    buffer: BlockingMutex<CriticalSectionRawMutex, RefCell<Deque<T, N>>>,
    items_available: CountingSemaphore,
    mutual_exclusion: Mutex<CriticalSectionRawMutex, ()>,
    lost: AtomicU32,
}

impl<T: Copy, const N: usize> SampleQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            buffer: BlockingMutex::new(RefCell::new(Deque::new())),
            items_available: CountingSemaphore::new(0),
            mutual_exclusion: Mutex::new(()),
            lost: AtomicU32::new(0),
        }
    }

    /// Append at the tail.  Producer only; never blocks.
    ///
    /// When `N` items are already held the value is dropped, the lost
    /// counter is bumped and `QueueError::Full` is returned.  The caller
    /// is expected to carry on, not retry.
    pub fn put(&self, value: T) -> Result<(), QueueError> {
        let stored = self
            .buffer
            .lock(|b| b.borrow_mut().push_back(value).is_ok());
        if !stored {
            // Single producer: load/store is enough and works without CAS.
            self.lost
                .store(self.lost.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
            return Err(QueueError::Full);
        }
        self.items_available.release();
        Ok(())
    }

    /// Remove and return the head, suspending until one exists.
    pub async fn get(&self) -> T {
        loop {
            self.items_available.acquire().await;
            let _guard = self.mutual_exclusion.lock().await;
            if let Some(value) = self.buffer.lock(|b| b.borrow_mut().pop_front()) {
                return value;
            }
        }
    }

    /// Non-suspending `get`: `None` when empty or another consumer holds
    /// the lock.
    pub fn try_get(&self) -> Option<T> {
        if !self.items_available.try_acquire() {
            return None;
        }
        let Ok(_guard) = self.mutual_exclusion.try_lock() else {
            self.items_available.release();
            return None;
        };
        self.buffer.lock(|b| b.borrow_mut().pop_front())
    }

    /// Head value without removing it, `None` when empty.
    pub async fn peek(&self) -> Option<T> {
        let _guard = self.mutual_exclusion.lock().await;
        self.buffer.lock(|b| b.borrow().front().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.items_available.value() == 0
    }

    pub fn is_full(&self) -> bool {
        self.items_available.value() == N
    }

    /// Items currently claimable by `get`.
    pub fn len(&self) -> usize {
        self.items_available.value()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Values dropped because the queue was full.
    pub fn lost_count(&self) -> u32 {
        self.lost.load(Ordering::Relaxed)
    }
}

impl<T: Copy, const N: usize> Default for SampleQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw millivolt stream: every conversion goes straight to the consumer.
impl<const N: usize> SampleSink for &SampleQueue<i32, N> {
    fn deliver(&mut self, millivolts: i32) -> Result<(), QueueError> {
        self.put(millivolts)
    }
}
