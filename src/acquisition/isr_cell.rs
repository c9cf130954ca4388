//! Interrupt-masking slot for state shared with an ISR.
//!
//! A handler body run through [`IsrCell::with`] executes inside a
//! critical section, so the thread side can never observe the
//! acquisition machine half-updated.
//!
//! ```ignore
//! static ACQ: IsrCell<Acquisition<Board, WindowedSink<'static, 8>>> = IsrCell::new();
//!
//! #[interrupt]
//! fn TIMER0() {
//!     ACQ.with(|acq| acq.on_timer_tick());
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub struct IsrCell<T> {
    inner: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<T>>>,
}

impl<T> IsrCell<T> {
    pub const fn new() -> Self {
        Self {
            inner: BlockingMutex::new(RefCell::new(None)),
        }
    }

    /// Place `value` in the slot, returning whatever was there.
    pub fn install(&self, value: T) -> Option<T> {
        self.inner.lock(|slot| slot.borrow_mut().replace(value))
    }

    /// Remove the value; handlers become no-ops until the next install.
    pub fn take(&self) -> Option<T> {
        self.inner.lock(|slot| slot.borrow_mut().take())
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock(|slot| slot.borrow().is_some())
    }

    /// Run `f` on the value with interrupts masked.
    ///
    /// Returns `None` when nothing is installed.  Must not be re-entered
    /// on the same cell from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner
            .lock(|slot| slot.borrow_mut().as_mut().map(f))
    }
}

impl<T> Default for IsrCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
