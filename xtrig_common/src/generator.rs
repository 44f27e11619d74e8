//! Generator configuration (`xtrig.toml`).
//!
//! All sections are optional; omitted fields use the defaults from
//! [`crate::consts`]. Startup values are validated strictly: an
//! out-of-bound startup value is a configuration error, not a silent
//! rejection like a runtime attribute write.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

use crate::channel::{ChannelId, Polarity};
use crate::config::{ConfigError, SharedConfig};
use crate::consts::*;
use crate::mode::{GateMode, TriggerMode};
use crate::output::LineConfig;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Logging and instance naming.
    pub shared: SharedConfig,
    /// Init-time timing constants.
    pub timing: TimingConfig,
    /// Startup values of the runtime-writable parameters.
    pub params: ParamsConfig,
    /// Initial channel modes.
    pub modes: ModesConfig,
    /// Output driver selection.
    pub output: OutputConfig,
    /// Channel → line wiring.
    pub channels: ChannelsConfig,
    /// Real-time thread placement.
    pub rt: RtConfig,
}

impl GeneratorConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timing.validate()?;
        self.params.validate()?;
        self.output.validate()?;
        self.rt.validate()?;

        let lines = self.lines();
        let mut seen = HashSet::new();
        for cfg in &lines {
            if !seen.insert(cfg.line) {
                return Err(ConfigError::ValidationError(format!(
                    "line {} assigned to more than one channel ({})",
                    cfg.line, cfg.channel
                )));
            }
        }

        let cycle_us = self.params.exposure_us + self.params.data_write_us;
        if self.timing.dlp_pulse_width_us > cycle_us {
            warn!(
                "dlp_pulse_width_us={} exceeds the startup cycle of {}us; DLP will stay asserted",
                self.timing.dlp_pulse_width_us, cycle_us
            );
        }
        Ok(())
    }

    /// Resolved line bindings in [`ChannelId::ALL`] order.
    pub fn lines(&self) -> [LineConfig; CHANNEL_COUNT] {
        ChannelId::ALL.map(|channel| self.channels.resolve(channel))
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// How the pulse engine waits for the next tick.
///
/// `Spin` busy-polls the ready signal: lowest wake latency, one core
/// permanently at 100%. `Park` sleeps the engine thread and is woken
/// by the tick source: near-zero idle CPU, wake latency bounded by the
/// OS scheduler (must stay below one tick period to keep timing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Busy-wait with a spin-loop hint.
    #[default]
    Spin,
    /// Park/unpark the engine thread.
    Park,
}

/// Init-time timing constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Tick period [ns]. Must divide 1000 evenly.
    pub tick_period_ns: u32,
    /// DLP pulse width [µs].
    pub dlp_pulse_width_us: u32,
    /// Engine wait strategy.
    pub wait_strategy: WaitStrategy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period_ns: DEFAULT_TICK_PERIOD_NS,
            dlp_pulse_width_us: DEFAULT_DLP_PULSE_WIDTH_US,
            wait_strategy: WaitStrategy::default(),
        }
    }
}

impl TimingConfig {
    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ns == 0 || NS_PER_US % self.tick_period_ns != 0 {
            return Err(ConfigError::ValidationError(format!(
                "tick_period_ns {} must be a non-zero divisor of {NS_PER_US}",
                self.tick_period_ns
            )));
        }
        check_range(
            "dlp_pulse_width_us",
            self.dlp_pulse_width_us,
            DLP_PULSE_WIDTH_US_MIN,
            DLP_PULSE_WIDTH_US_MAX,
        )
    }
}

// ─── Params ─────────────────────────────────────────────────────────

/// Startup values of the runtime-writable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
    /// Exposure [µs].
    pub exposure_us: u32,
    /// Data-write time [µs].
    pub data_write_us: u32,
    /// Once burst length [frames].
    pub num_frames: u32,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            exposure_us: DEFAULT_EXPOSURE_US,
            data_write_us: DEFAULT_DATA_WRITE_US,
            num_frames: DEFAULT_NUM_FRAMES,
        }
    }
}

impl ParamsConfig {
    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("exposure_us", self.exposure_us, EXPOSURE_US_MIN, EXPOSURE_US_MAX)?;
        check_range(
            "data_write_us",
            self.data_write_us,
            DATA_WRITE_US_MIN,
            DATA_WRITE_US_MAX,
        )?;
        check_range("num_frames", self.num_frames, NUM_FRAMES_MIN, NUM_FRAMES_MAX)
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{name} {value} out of range [{min}, {max}]"
        )));
    }
    Ok(())
}

// ─── Modes ──────────────────────────────────────────────────────────

/// Initial channel modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    /// Trigger mode (default: continuous).
    pub trigger: TriggerMode,
    /// DLP trigger mode.
    pub dlp_trigger: GateMode,
    /// Red laser mode.
    pub red_laser: GateMode,
    /// Blue laser mode.
    pub blue_laser: GateMode,
}

// ─── Output ─────────────────────────────────────────────────────────

/// Output driver selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Registered driver name.
    pub driver: String,
    /// GPIO sysfs root for the `sysfs` driver.
    pub sysfs_root: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            driver: "sysfs".to_string(),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl OutputConfig {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "output.driver cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Channels ───────────────────────────────────────────────────────

/// Optional overrides for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelWiring {
    /// Line number override.
    pub line: Option<u32>,
    /// Polarity override.
    pub polarity: Option<Polarity>,
}

/// Channel → line wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Camera trigger (default line 249, active-low).
    pub trigger: ChannelWiring,
    /// DLP trigger (default line 250, active-high).
    pub dlp_trigger: ChannelWiring,
    /// Red laser enable (default line 351, active-high).
    pub red_laser: ChannelWiring,
    /// Blue laser enable (default line 424, active-high).
    pub blue_laser: ChannelWiring,
}

impl ChannelsConfig {
    /// Board default for a channel.
    pub const fn default_line(channel: ChannelId) -> LineConfig {
        let (line, polarity) = match channel {
            ChannelId::Trigger => (DEFAULT_TRIGGER_LINE, Polarity::ActiveLow),
            ChannelId::DlpTrigger => (DEFAULT_DLP_TRIGGER_LINE, Polarity::ActiveHigh),
            ChannelId::RedLaser => (DEFAULT_RED_LASER_LINE, Polarity::ActiveHigh),
            ChannelId::BlueLaser => (DEFAULT_BLUE_LASER_LINE, Polarity::ActiveHigh),
        };
        LineConfig {
            channel,
            line,
            polarity,
        }
    }

    /// Wiring overrides for a channel.
    pub const fn wiring(&self, channel: ChannelId) -> &ChannelWiring {
        match channel {
            ChannelId::Trigger => &self.trigger,
            ChannelId::DlpTrigger => &self.dlp_trigger,
            ChannelId::RedLaser => &self.red_laser,
            ChannelId::BlueLaser => &self.blue_laser,
        }
    }

    /// Board default merged with overrides.
    pub fn resolve(&self, channel: ChannelId) -> LineConfig {
        let base = Self::default_line(channel);
        let wiring = self.wiring(channel);
        LineConfig {
            channel,
            line: wiring.line.unwrap_or(base.line),
            polarity: wiring.polarity.unwrap_or(base.polarity),
        }
    }
}

// ─── RT ─────────────────────────────────────────────────────────────

/// Real-time placement of the tick and engine threads.
///
/// Only honoured when built with the `rt` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RtConfig {
    /// `mlockall` before starting threads.
    pub lock_memory: bool,
    /// CPU core for the tick thread.
    pub tick_cpu: Option<usize>,
    /// SCHED_FIFO priority for the tick thread.
    pub tick_priority: Option<i32>,
    /// CPU core for the engine thread.
    pub engine_cpu: Option<usize>,
    /// SCHED_FIFO priority for the engine thread.
    pub engine_priority: Option<i32>,
}

impl RtConfig {
    /// Validate priorities (SCHED_FIFO range 1..=99).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, prio) in [
            ("tick_priority", self.tick_priority),
            ("engine_priority", self.engine_priority),
        ] {
            if let Some(p) = prio {
                if !(1..=99).contains(&p) {
                    return Err(ConfigError::ValidationError(format!(
                        "rt.{name} {p} out of range [1, 99]"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
