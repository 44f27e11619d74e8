//! Ready signal between the tick source and the pulse engine.
//!
//! Single producer (tick thread) raises, single consumer (engine thread)
//! takes. Raising is one release store plus, for a parked consumer, an
//! unpark. The consumer slot is replaced on every engine run, so a restarted
//! engine thread is the one woken.

use parking_lot::Mutex;
use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};
use std::time::Duration;
use xtrig_common::generator::WaitStrategy;

/// Upper bound on one park, so a stop request is seen without a tick.
pub const PARK_TIMEOUT: Duration = Duration::from_millis(10);

/// One-bit "tick pending" flag.
#[derive(Debug, Default)]
pub struct ReadySignal {
    flag: AtomicBool,
    consumer: Mutex<Option<Thread>>,
}

impl ReadySignal {
    /// Create a lowered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the calling thread as the parked consumer.
    ///
    /// Replaces any earlier registration. Returns `true` if one was replaced.
    pub fn register_consumer(&self) -> bool {
        self.consumer.lock().replace(thread::current()).is_some()
    }

    /// Drop the registered consumer. Raising no longer unparks anyone.
    pub fn clear_consumer(&self) {
        *self.consumer.lock() = None;
    }

    /// Whether a parked consumer is registered.
    pub fn has_consumer(&self) -> bool {
        self.consumer.lock().is_some()
    }

    /// Raise the signal (tick side).
    #[inline]
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Release);
        // Held only by register/clear at run boundaries; uncontended per tick.
        if let Some(consumer) = self.consumer.lock().as_ref() {
            consumer.unpark();
        }
    }

    /// Lower the signal, returning whether it was raised (engine side).
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Whether a tick is pending.
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Block until the signal is taken or `running` goes false.
    ///
    /// Returns `true` when a tick was taken.
    pub fn wait(&self, strategy: WaitStrategy, running: &AtomicBool) -> bool {
        loop {
            if self.take() {
                return true;
            }
            if !running.load(Ordering::Acquire) {
                return false;
            }
            match strategy {
                WaitStrategy::Spin => hint::spin_loop(),
                WaitStrategy::Park => thread::park_timeout(PARK_TIMEOUT),
            }
        }
    }
}
