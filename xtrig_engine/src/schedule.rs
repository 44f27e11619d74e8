//! Per-tick schedule position.
//!
//! `tick_in_cycle` and the completed-cycle counter live in one
//! `AtomicU64` (cycles in the high word) written only by the tick
//! source, so the engine always reads a matching pair.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::wait::ReadySignal;

/// Position within the pulse schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulePosition {
    /// Tick within the current cycle, `0 <= tick_in_cycle < cycle_ticks`.
    pub tick_in_cycle: u32,
    /// Cycles completed since start (wrapping).
    pub cycles_completed: u32,
}

impl SchedulePosition {
    #[inline]
    const fn pack(self) -> u64 {
        ((self.cycles_completed as u64) << 32) | self.tick_in_cycle as u64
    }

    #[inline]
    const fn unpack(word: u64) -> Self {
        Self {
            tick_in_cycle: word as u32,
            cycles_completed: (word >> 32) as u32,
        }
    }

    /// Position after one more tick of a `cycle_ticks` long cycle.
    #[inline]
    pub const fn advanced(self, cycle_ticks: u32) -> Self {
        let tick = self.tick_in_cycle + 1;
        if tick >= cycle_ticks {
            Self {
                tick_in_cycle: 0,
                cycles_completed: self.cycles_completed.wrapping_add(1),
            }
        } else {
            Self {
                tick_in_cycle: tick,
                cycles_completed: self.cycles_completed,
            }
        }
    }

    /// First cycle that will be counted as a whole frame if a burst is
    /// armed at this position.
    ///
    /// Always the cycle after the current one: the engine may already have
    /// evaluated the current position, even at tick 0.
    #[inline]
    pub const fn next_frame_boundary(self) -> u32 {
        self.cycles_completed.wrapping_add(1)
    }
}

/// Tick counters plus the ready signal.
#[derive(Debug, Default)]
pub struct ScheduleState {
    position: AtomicU64,
    ready: ReadySignal,
}

impl ScheduleState {
    /// Counters at zero, signal lowered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick and raise the ready signal.
    ///
    /// Tick source only. O(1), lock-free, no allocation.
    #[inline]
    pub fn advance(&self, cycle_ticks: u32) {
        let pos = SchedulePosition::unpack(self.position.load(Ordering::Relaxed));
        self.position
            .store(pos.advanced(cycle_ticks).pack(), Ordering::Release);
        self.ready.raise();
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> SchedulePosition {
        SchedulePosition::unpack(self.position.load(Ordering::Acquire))
    }

    /// The tick → engine signal.
    #[inline]
    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }
}
