//! Simulation driver.
//!
//! The `SimulationDriver` keeps line levels in atomics so that a
//! [`SimulationProbe`] held by a test (or an operator tool) can observe
//! the outputs while the engine thread owns the driver. Acquisition and
//! release are recorded in an ordered journal.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use tracing::{debug, info};
use xtrig_common::channel::{ChannelId, Level};
use xtrig_common::consts::CHANNEL_COUNT;
use xtrig_common::output::{DriverDiagnostics, LineConfig, OutputDriver, OutputError, OutputSink};

const RAW_LOW: u8 = 0;
const RAW_HIGH: u8 = 1;

/// Acquire/release record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// Line acquired and driven to the contained inactive level.
    Acquired(ChannelId, Level),
    /// Line released at the contained level.
    Released(ChannelId, Level),
}

#[derive(Debug, Default)]
struct SimLines {
    levels: [AtomicU8; CHANNEL_COUNT],
    acquired: [AtomicBool; CHANNEL_COUNT],
    edges: [AtomicU64; CHANNEL_COUNT],
    writes: AtomicU64,
    write_errors: AtomicU64,
    journal: Mutex<Vec<LineEvent>>,
}

impl SimLines {
    fn level(&self, channel: ChannelId) -> Level {
        match self.levels[channel.index()].load(Ordering::Acquire) {
            RAW_HIGH => Level::High,
            _ => Level::Low,
        }
    }

    fn store(&self, channel: ChannelId, level: Level) -> bool {
        let raw = if level.is_high() { RAW_HIGH } else { RAW_LOW };
        self.levels[channel.index()].swap(raw, Ordering::AcqRel) != raw
    }
}

/// Read-only view of a [`SimulationDriver`]'s lines.
#[derive(Debug, Clone)]
pub struct SimulationProbe {
    lines: Arc<SimLines>,
}

impl SimulationProbe {
    /// Current level of a line.
    pub fn level(&self, channel: ChannelId) -> Level {
        self.lines.level(channel)
    }

    /// Whether a line is currently acquired.
    pub fn is_acquired(&self, channel: ChannelId) -> bool {
        self.lines.acquired[channel.index()].load(Ordering::Acquire)
    }

    /// Number of level changes written to a line since acquisition.
    pub fn edges(&self, channel: ChannelId) -> u64 {
        self.lines.edges[channel.index()].load(Ordering::Relaxed)
    }

    /// Ordered acquire/release journal.
    pub fn journal(&self) -> Vec<LineEvent> {
        self.lines.journal.lock().clone()
    }
}

/// Simulation driver implementing the `OutputDriver` trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    lines: Arc<SimLines>,
    /// Acquired lines in acquisition order
    acquired: Vec<LineConfig>,
    /// Channel whose acquisition is forced to fail
    fail_on: Option<ChannelId>,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            lines: Arc::new(SimLines::default()),
            acquired: Vec::new(),
            fail_on: None,
        }
    }

    /// Make acquisition of `channel` fail.
    pub fn failing_on(mut self, channel: ChannelId) -> Self {
        self.fail_on = Some(channel);
        self
    }

    /// Create a probe observing this driver's lines.
    pub fn probe(&self) -> SimulationProbe {
        SimulationProbe {
            lines: Arc::clone(&self.lines),
        }
    }

    fn release(&mut self, cfg: LineConfig) {
        let level = self.lines.level(cfg.channel);
        self.lines.acquired[cfg.channel.index()].store(false, Ordering::Release);
        self.lines
            .journal
            .lock()
            .push(LineEvent::Released(cfg.channel, level));
        debug!("Released {} (line {}) at {:?}", cfg.channel, cfg.line, level);
    }

    fn release_all(&mut self) {
        while let Some(cfg) = self.acquired.pop() {
            self.release(cfg);
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for SimulationDriver {
    fn set_level(&mut self, channel: ChannelId, level: Level) {
        if !self.lines.acquired[channel.index()].load(Ordering::Acquire) {
            self.lines.write_errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.lines.writes.fetch_add(1, Ordering::Relaxed);
        if self.lines.store(channel, level) {
            self.lines.edges[channel.index()].fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl OutputDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, lines: &[LineConfig]) -> Result<(), OutputError> {
        info!("Initializing simulation driver with {} lines", lines.len());

        for cfg in lines {
            if self.fail_on == Some(cfg.channel) {
                let err = OutputError::AcquireFailed {
                    channel: cfg.channel,
                    line: cfg.line,
                    reason: "simulated acquisition failure".to_string(),
                };
                self.release_all();
                return Err(err);
            }

            let level = cfg.polarity.inactive();
            self.lines.store(cfg.channel, level);
            self.lines.edges[cfg.channel.index()].store(0, Ordering::Relaxed);
            self.lines.acquired[cfg.channel.index()].store(true, Ordering::Release);
            self.lines
                .journal
                .lock()
                .push(LineEvent::Acquired(cfg.channel, level));
            self.acquired.push(*cfg);
            debug!("Acquired {} (line {}) at {:?}", cfg.channel, cfg.line, level);
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        info!("Shutting down simulation driver");
        self.release_all();
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(DriverDiagnostics {
            writes: self.lines.writes.load(Ordering::Relaxed),
            write_errors: self.lines.write_errors.load(Ordering::Relaxed),
        })
    }
}
