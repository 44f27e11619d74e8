//! Periodic tick source.
//!
//! A dedicated thread sleeps one period, fires, and sleeps again. The
//! sleep is relative to the end of the previous firing, so a late wake
//! stretches the effective period instead of producing catch-up ticks.
//!
//! Each firing only advances the [`ScheduleState`] and raises the ready
//! signal: no output writes, no locks, no logging.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use nix::errno::Errno;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::rt::{RtError, ThreadPlacement, detect_rt_mode};
use crate::state::EngineState;

/// Tick source start errors.
#[derive(Debug, Clone, Error)]
pub enum TickError {
    /// A zero period was requested.
    #[error("tick period must be non-zero")]
    ZeroPeriod,

    /// The tick thread could not be spawned.
    #[error("failed to spawn tick thread: {0}")]
    Spawn(String),

    /// RT placement of the tick thread failed.
    #[error(transparent)]
    Rt(#[from] RtError),
}

// ─── Tick Statistics ────────────────────────────────────────────────

/// O(1) tick interval statistics, recorded on the tick thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    /// Configured period [ns].
    pub period_ns: u64,
    /// Ticks fired.
    pub tick_count: u64,
    /// Minimum interval between firings [ns].
    pub min_interval_ns: u64,
    /// Maximum interval between firings [ns].
    pub max_interval_ns: u64,
    /// Running sum for the average.
    pub sum_interval_ns: u64,
    /// Intervals longer than twice the period.
    pub late_ticks: u64,
    /// Sleeps cut short by a signal and resumed.
    pub interrupted_sleeps: u64,
}

impl TickStats {
    /// Zeroed statistics for `period_ns`.
    pub const fn new(period_ns: u64) -> Self {
        Self {
            period_ns,
            tick_count: 0,
            min_interval_ns: u64::MAX,
            max_interval_ns: 0,
            sum_interval_ns: 0,
            late_ticks: 0,
            interrupted_sleeps: 0,
        }
    }

    /// Record one interval.
    #[inline]
    pub fn record(&mut self, interval_ns: u64) {
        self.tick_count += 1;
        self.min_interval_ns = self.min_interval_ns.min(interval_ns);
        self.max_interval_ns = self.max_interval_ns.max(interval_ns);
        self.sum_interval_ns = self.sum_interval_ns.saturating_add(interval_ns);
        if interval_ns > 2 * self.period_ns {
            self.late_ticks += 1;
        }
    }

    /// Count sleeps that had to be resumed after a signal.
    #[inline]
    pub fn record_interruptions(&mut self, count: u32) {
        self.interrupted_sleeps += u64::from(count);
    }

    /// Average interval [ns] (0 before the first tick).
    pub fn avg_interval_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_interval_ns / self.tick_count
        }
    }
}

// ─── Relative Sleep ─────────────────────────────────────────────────

/// Sleep out the full `period` through `sleep`, resuming with the time left
/// whenever it returns `EINTR`. Returns the number of interruptions.
fn sleep_full<F>(period: Duration, mut sleep: F) -> u32
where
    F: FnMut(Duration) -> nix::Result<()>,
{
    let deadline = Instant::now() + period;
    let mut remaining = period;
    let mut interruptions = 0;
    while let Err(Errno::EINTR) = sleep(remaining) {
        interruptions += 1;
        remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
    }
    interruptions
}

#[cfg(feature = "rt")]
#[inline]
fn sleep_relative(period: Duration) -> u32 {
    use nix::sys::time::TimeSpec;
    use nix::time::{ClockId, ClockNanosleepFlags, clock_nanosleep};

    sleep_full(period, |remaining| {
        clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::empty(),
            &TimeSpec::from_duration(remaining),
        )
        .map(drop)
    })
}

// std's sleep already resumes after EINTR.
#[cfg(not(feature = "rt"))]
#[inline]
fn sleep_relative(period: Duration) -> u32 {
    sleep_full(period, |remaining| {
        thread::sleep(remaining);
        Ok(())
    })
}

// ─── Tick Source ────────────────────────────────────────────────────

/// Handle of a running tick thread.
pub struct TickSource {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<TickStats>>,
    period_ns: u32,
}

impl TickSource {
    /// Start ticking `state` every `period_ns` nanoseconds.
    ///
    /// Returns once the thread is running with its placement applied.
    ///
    /// # Errors
    /// `ZeroPeriod`, `Spawn`, or `Rt` if the requested placement fails.
    pub fn start(
        period_ns: u32,
        state: Arc<EngineState>,
        placement: ThreadPlacement,
    ) -> Result<Self, TickError> {
        if period_ns == 0 {
            return Err(TickError::ZeroPeriod);
        }

        let running = Arc::new(AtomicBool::new(true));
        let (setup_tx, setup_rx) = mpsc::sync_channel::<Result<(), RtError>>(1);

        let thread_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("xtrig-tick".to_string())
            .spawn(move || {
                let setup = placement.apply();
                let ok = setup.is_ok();
                let _ = setup_tx.send(setup);
                if !ok {
                    return TickStats::new(u64::from(period_ns));
                }
                debug!("tick thread real-time policy: {}", detect_rt_mode());
                tick_loop(period_ns, &state, &thread_running)
            })
            .map_err(|e| TickError::Spawn(e.to_string()))?;

        match setup_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e.into());
            }
            Err(_) => {
                let _ = handle.join();
                return Err(TickError::Spawn("tick thread exited during setup".to_string()));
            }
        }

        info!("Tick source started: period={}ns", period_ns);
        Ok(Self {
            running,
            handle: Some(handle),
            period_ns,
        })
    }

    /// Configured period [ns].
    pub fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// Stop the thread and return its statistics.
    ///
    /// Blocks for at most one period plus the scheduler wake latency.
    pub fn stop(mut self) -> TickStats {
        self.halt()
    }

    fn halt(&mut self) -> TickStats {
        self.running.store(false, Ordering::Release);
        let stats = match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                warn!("tick thread panicked");
                TickStats::new(u64::from(self.period_ns))
            }),
            None => TickStats::new(u64::from(self.period_ns)),
        };
        info!(
            "Tick source stopped: ticks={} avg={}ns max={}ns late={} interrupted={}",
            stats.tick_count,
            stats.avg_interval_ns(),
            stats.max_interval_ns,
            stats.late_ticks,
            stats.interrupted_sleeps
        );
        stats
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.halt();
        }
    }
}

fn tick_loop(period_ns: u32, state: &EngineState, running: &AtomicBool) -> TickStats {
    let period = Duration::from_nanos(u64::from(period_ns));
    let mut stats = TickStats::new(u64::from(period_ns));
    let mut last = Instant::now();

    while running.load(Ordering::Acquire) {
        let interruptions = sleep_relative(period);
        if interruptions > 0 {
            stats.record_interruptions(interruptions);
        }
        let now = Instant::now();
        stats.record(now.duration_since(last).as_nanos() as u64);
        last = now;
        state.schedule.advance(state.params.cycle_ticks());
    }
    stats
}
