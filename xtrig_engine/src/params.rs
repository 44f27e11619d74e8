//! Bounds-validated runtime parameters and their derived tick counts.
//!
//! Writers (the configuration path) serialize on a small mutex guarding
//! the raw microsecond values. Readers (the pulse engine) never take the
//! lock: `cycle_ticks` and `exposure_ticks` are published together in one
//! packed `AtomicU64`, so a reader can never observe one counter updated
//! and the other stale.

use parking_lot::Mutex;
use static_assertions::const_assert;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;
use xtrig_common::consts::*;
use xtrig_common::generator::ParamsConfig;

// Derived counters at the finest tick period must fit in 32 bits.
const_assert!((EXPOSURE_US_MAX as u64 + DATA_WRITE_US_MAX as u64) * NS_PER_US as u64 <= u32::MAX as u64);
const_assert!(DLP_PULSE_WIDTH_US_MAX as u64 * NS_PER_US as u64 <= u32::MAX as u64);

/// Parameter store construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The tick period does not divide one microsecond.
    #[error("tick period {0}ns must be a non-zero divisor of {NS_PER_US}ns")]
    TickPeriod(u32),

    /// A startup value is outside its bounds.
    #[error("{name} {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: u32,
        /// Lower bound (inclusive).
        min: u32,
        /// Upper bound (inclusive).
        max: u32,
    },
}

/// Tick counts derived from exposure and data-write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedCounters {
    /// Ticks per full cycle (exposure + data write).
    pub cycle_ticks: u32,
    /// Ticks in the exposure window.
    pub exposure_ticks: u32,
}

impl DerivedCounters {
    #[inline]
    const fn pack(self) -> u64 {
        ((self.cycle_ticks as u64) << 32) | self.exposure_ticks as u64
    }

    #[inline]
    const fn unpack(word: u64) -> Self {
        Self {
            cycle_ticks: (word >> 32) as u32,
            exposure_ticks: word as u32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RawTiming {
    exposure_us: u32,
    data_write_us: u32,
}

/// Named integer settings with derived tick counts.
#[derive(Debug)]
pub struct ParameterStore {
    tick_period_ns: u32,
    ticks_per_us: u32,
    dlp_pulse_width_us: u32,
    dlp_ticks: u32,
    raw: Mutex<RawTiming>,
    derived: AtomicU64,
    num_frames: AtomicU32,
}

impl ParameterStore {
    /// Build the store from init-time constants and startup values.
    ///
    /// # Errors
    /// `ParamError::TickPeriod` if `tick_period_ns` does not divide 1000,
    /// `ParamError::OutOfRange` if any startup value is out of bounds.
    pub fn new(
        tick_period_ns: u32,
        dlp_pulse_width_us: u32,
        startup: ParamsConfig,
    ) -> Result<Self, ParamError> {
        if tick_period_ns == 0 || NS_PER_US % tick_period_ns != 0 {
            return Err(ParamError::TickPeriod(tick_period_ns));
        }
        check(
            "dlp_pulse_width_us",
            dlp_pulse_width_us,
            DLP_PULSE_WIDTH_US_MIN,
            DLP_PULSE_WIDTH_US_MAX,
        )?;
        check("exposure_us", startup.exposure_us, EXPOSURE_US_MIN, EXPOSURE_US_MAX)?;
        check(
            "data_write_us",
            startup.data_write_us,
            DATA_WRITE_US_MIN,
            DATA_WRITE_US_MAX,
        )?;
        check("num_frames", startup.num_frames, NUM_FRAMES_MIN, NUM_FRAMES_MAX)?;

        let ticks_per_us = NS_PER_US / tick_period_ns;
        let raw = RawTiming {
            exposure_us: startup.exposure_us,
            data_write_us: startup.data_write_us,
        };
        Ok(Self {
            tick_period_ns,
            ticks_per_us,
            dlp_pulse_width_us,
            dlp_ticks: dlp_pulse_width_us * ticks_per_us,
            derived: AtomicU64::new(derive(raw, ticks_per_us).pack()),
            raw: Mutex::new(raw),
            num_frames: AtomicU32::new(startup.num_frames),
        })
    }

    // ─── Setters ────────────────────────────────────────────────────

    /// Set the exposure time. Out-of-range values are ignored.
    pub fn set_exposure_us(&self, value: u32) {
        if !(EXPOSURE_US_MIN..=EXPOSURE_US_MAX).contains(&value) {
            debug!("exposure_us {value} rejected");
            return;
        }
        let mut raw = self.raw.lock();
        raw.exposure_us = value;
        self.publish(*raw);
    }

    /// Set the data-write time. Out-of-range values are ignored.
    pub fn set_data_write_us(&self, value: u32) {
        if !(DATA_WRITE_US_MIN..=DATA_WRITE_US_MAX).contains(&value) {
            debug!("data_write_us {value} rejected");
            return;
        }
        let mut raw = self.raw.lock();
        raw.data_write_us = value;
        self.publish(*raw);
    }

    /// Set the Once burst length. Out-of-range values are ignored.
    pub fn set_num_frames(&self, value: u32) {
        if !(NUM_FRAMES_MIN..=NUM_FRAMES_MAX).contains(&value) {
            debug!("num_frames {value} rejected");
            return;
        }
        self.num_frames.store(value, Ordering::Release);
    }

    // Called with the raw lock held, so publications are ordered.
    fn publish(&self, raw: RawTiming) {
        self.derived
            .store(derive(raw, self.ticks_per_us).pack(), Ordering::Release);
    }

    // ─── Getters ────────────────────────────────────────────────────

    /// Exposure time [µs].
    pub fn exposure_us(&self) -> u32 {
        self.raw.lock().exposure_us
    }

    /// Data-write time [µs].
    pub fn data_write_us(&self) -> u32 {
        self.raw.lock().data_write_us
    }

    /// Once burst length [frames].
    #[inline]
    pub fn num_frames(&self) -> u32 {
        self.num_frames.load(Ordering::Acquire)
    }

    /// DLP pulse width [µs], fixed at construction.
    pub fn dlp_pulse_width_us(&self) -> u32 {
        self.dlp_pulse_width_us
    }

    /// Tick period [ns], fixed at construction.
    pub fn tick_period_ns(&self) -> u32 {
        self.tick_period_ns
    }

    /// Ticks per microsecond.
    pub fn ticks_per_us(&self) -> u32 {
        self.ticks_per_us
    }

    /// DLP active window [ticks].
    #[inline]
    pub fn dlp_ticks(&self) -> u32 {
        self.dlp_ticks
    }

    /// Consistent snapshot of both derived counters.
    #[inline]
    pub fn derived(&self) -> DerivedCounters {
        DerivedCounters::unpack(self.derived.load(Ordering::Acquire))
    }

    /// Cycle length [ticks].
    #[inline]
    pub fn cycle_ticks(&self) -> u32 {
        self.derived().cycle_ticks
    }

    /// Exposure window [ticks].
    #[inline]
    pub fn exposure_ticks(&self) -> u32 {
        self.derived().exposure_ticks
    }
}

fn derive(raw: RawTiming, ticks_per_us: u32) -> DerivedCounters {
    DerivedCounters {
        cycle_ticks: (raw.exposure_us + raw.data_write_us) * ticks_per_us,
        exposure_ticks: raw.exposure_us * ticks_per_us,
    }
}

fn check(name: &'static str, value: u32, min: u32, max: u32) -> Result<(), ParamError> {
    if value < min || value > max {
        return Err(ParamError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
