//! Configuration interface: named text attributes.
//!
//! `show` renders a value plus `\n` into a fixed-capacity buffer.
//! `store` reports the whole input as consumed for every writable
//! attribute; a malformed or out-of-range value simply has no effect.

use core::fmt::Write as _;
use core::str::FromStr;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use xtrig_common::channel::ChannelId;
use xtrig_common::mode::{GateMode, TriggerMode};

use crate::state::EngineState;

/// Capacity of one rendered attribute value.
pub const ATTR_VALUE_CAPACITY: usize = 32;

/// Rendered attribute value.
pub type AttrValue = heapless::String<ATTR_VALUE_CAPACITY>;

/// Attribute access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    /// No attribute with that name.
    #[error("unknown attribute: {0:?}")]
    Unknown(String),

    /// The attribute cannot be written.
    #[error("attribute {0} is read-only")]
    ReadOnly(&'static str),
}

/// The attribute set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Trigger mode.
    Mode,
    /// DLP trigger gate.
    DlpMode,
    /// Red laser gate.
    RedLaser,
    /// Blue laser gate.
    BlueLaser,
    /// Exposure [µs].
    Exposure,
    /// Data-write time [µs].
    DataWriteTime,
    /// Once burst length.
    NumFrame,
    /// DLP pulse width [µs].
    DlpPulseWidth,
    /// Tick period [ns].
    TickPeriod,
}

impl Attribute {
    /// Every attribute, in listing order.
    pub const ALL: [Self; 9] = [
        Self::Mode,
        Self::DlpMode,
        Self::RedLaser,
        Self::BlueLaser,
        Self::Exposure,
        Self::DataWriteTime,
        Self::NumFrame,
        Self::DlpPulseWidth,
        Self::TickPeriod,
    ];

    /// Attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::DlpMode => "dlp_mode",
            Self::RedLaser => "red_laser",
            Self::BlueLaser => "blue_laser",
            Self::Exposure => "exposure",
            Self::DataWriteTime => "datawritetime",
            Self::NumFrame => "numframe",
            Self::DlpPulseWidth => "dlp_pulse_width",
            Self::TickPeriod => "tick_period",
        }
    }

    /// Look up by exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Whether `store` is allowed.
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::DlpPulseWidth | Self::TickPeriod)
    }
}

/// JSON-serializable view of the whole generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Exposure [µs].
    pub exposure_us: u32,
    /// Data-write time [µs].
    pub data_write_us: u32,
    /// Once burst length.
    pub num_frames: u32,
    /// DLP pulse width [µs].
    pub dlp_pulse_width_us: u32,
    /// Tick period [ns].
    pub tick_period_ns: u32,
    /// Derived cycle length [ticks].
    pub cycle_ticks: u32,
    /// Derived exposure window [ticks].
    pub exposure_ticks: u32,
    /// DLP window [ticks].
    pub dlp_ticks: u32,
    /// Trigger mode.
    pub trigger: TriggerMode,
    /// DLP gate.
    pub dlp_trigger: GateMode,
    /// Red laser gate.
    pub red_laser: GateMode,
    /// Blue laser gate.
    pub blue_laser: GateMode,
    /// Tick within the current cycle.
    pub tick_in_cycle: u32,
    /// Cycles completed since start.
    pub cycles_completed: u32,
    /// Frame index of the Once burst, when in Once and past its first boundary.
    pub cycle_index: Option<u32>,
}

/// Text get/set access to the shared engine state.
#[derive(Debug, Clone)]
pub struct ConfigurationInterface {
    state: Arc<EngineState>,
}

impl ConfigurationInterface {
    /// Interface over `state`.
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Read an attribute by name.
    pub fn show(&self, name: &str) -> Result<AttrValue, AttrError> {
        let attr = Attribute::from_name(name).ok_or_else(|| AttrError::Unknown(name.to_string()))?;
        Ok(self.show_attr(attr))
    }

    /// Read an attribute.
    pub fn show_attr(&self, attr: Attribute) -> AttrValue {
        let state = &self.state;
        let mut out = AttrValue::new();
        // The longest rendering ("continuous\n", or 10 digits plus '\n') fits.
        let _ = match attr {
            Attribute::Mode => writeln!(out, "{}", state.modes.trigger()),
            Attribute::DlpMode => writeln!(out, "{}", state.modes.gate(ChannelId::DlpTrigger)),
            Attribute::RedLaser => writeln!(out, "{}", state.modes.gate(ChannelId::RedLaser)),
            Attribute::BlueLaser => writeln!(out, "{}", state.modes.gate(ChannelId::BlueLaser)),
            Attribute::Exposure => writeln!(out, "{}", state.params.exposure_us()),
            Attribute::DataWriteTime => writeln!(out, "{}", state.params.data_write_us()),
            Attribute::NumFrame => writeln!(out, "{}", state.params.num_frames()),
            Attribute::DlpPulseWidth => writeln!(out, "{}", state.params.dlp_pulse_width_us()),
            Attribute::TickPeriod => writeln!(out, "{}", state.params.tick_period_ns()),
        };
        out
    }

    /// Write an attribute by name. Returns the number of bytes consumed.
    pub fn store(&self, name: &str, input: &str) -> Result<usize, AttrError> {
        let attr = Attribute::from_name(name).ok_or_else(|| AttrError::Unknown(name.to_string()))?;
        self.store_attr(attr, input)
    }

    /// Write an attribute. Returns the number of bytes consumed.
    pub fn store_attr(&self, attr: Attribute, input: &str) -> Result<usize, AttrError> {
        if !attr.is_writable() {
            return Err(AttrError::ReadOnly(attr.name()));
        }
        let state = &self.state;

        match attr {
            Attribute::Mode => {
                if let Some(mode) = parse::<TriggerMode>(attr, input) {
                    state.modes.select_trigger(mode, || state.schedule.position());
                }
            }
            Attribute::DlpMode => self.store_gate(attr, ChannelId::DlpTrigger, input),
            Attribute::RedLaser => self.store_gate(attr, ChannelId::RedLaser, input),
            Attribute::BlueLaser => self.store_gate(attr, ChannelId::BlueLaser, input),
            Attribute::Exposure => {
                if let Some(v) = parse::<u32>(attr, input) {
                    state.params.set_exposure_us(v);
                }
            }
            Attribute::DataWriteTime => {
                if let Some(v) = parse::<u32>(attr, input) {
                    state.params.set_data_write_us(v);
                }
            }
            Attribute::NumFrame => {
                if let Some(v) = parse::<u32>(attr, input) {
                    state.params.set_num_frames(v);
                }
            }
            Attribute::DlpPulseWidth | Attribute::TickPeriod => {}
        }
        Ok(input.len())
    }

    fn store_gate(&self, attr: Attribute, channel: ChannelId, input: &str) {
        if let Some(mode) = parse::<GateMode>(attr, input) {
            self.state.modes.select_gate(channel, mode);
        }
    }

    /// Snapshot of every parameter, mode and the schedule position.
    pub fn status(&self) -> StatusSnapshot {
        let state = &self.state;
        let derived = state.params.derived();
        let position = state.schedule.position();
        let trigger = state.modes.trigger_state();
        StatusSnapshot {
            exposure_us: state.params.exposure_us(),
            data_write_us: state.params.data_write_us(),
            num_frames: state.params.num_frames(),
            dlp_pulse_width_us: state.params.dlp_pulse_width_us(),
            tick_period_ns: state.params.tick_period_ns(),
            cycle_ticks: derived.cycle_ticks,
            exposure_ticks: derived.exposure_ticks,
            dlp_ticks: state.params.dlp_ticks(),
            trigger: trigger.mode,
            dlp_trigger: state.modes.gate(ChannelId::DlpTrigger),
            red_laser: state.modes.gate(ChannelId::RedLaser),
            blue_laser: state.modes.gate(ChannelId::BlueLaser),
            tick_in_cycle: position.tick_in_cycle,
            cycles_completed: position.cycles_completed,
            cycle_index: match trigger.mode {
                TriggerMode::Once => trigger.frame_index(position),
                _ => None,
            },
        }
    }

    /// Shared state handle.
    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }
}

fn parse<T: FromStr>(attr: Attribute, input: &str) -> Option<T> {
    match input.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!("{}: ignoring malformed value {:?}", attr.name(), input);
            None
        }
    }
}
