//! Channel mode vocabulary and transition functions.
//!
//! Trigger: `Off`, `Once`, `Continuous`. DLP and lasers: `Stop`, `Start`.
//!
//! Transitions are pure functions of (current mode, event). The caller
//! owns the storage and applies the result; the Once→Off edge taken on
//! burst completion is [`TriggerEvent::BurstComplete`].

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected mode string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} mode: {value:?}")]
pub struct ModeParseError {
    /// Which mode family was being parsed.
    pub kind: &'static str,
    /// The offending input (trimmed).
    pub value: String,
}

/// Mode types that can be stored in a single atomic byte.
pub trait ChannelMode: Copy + Eq + fmt::Display + FromStr<Err = ModeParseError> {
    /// Raw storage representation.
    fn to_raw(self) -> u8;
    /// Decode raw storage. Returns `None` for invalid values.
    fn from_raw(raw: u8) -> Option<Self>;
}

// ─── TriggerMode ────────────────────────────────────────────────────

/// Camera trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TriggerMode {
    /// No pulses.
    Off = 0,
    /// A burst of `num_frames` pulses, then latch `Off`.
    Once = 1,
    /// Pulse every cycle.
    #[default]
    Continuous = 2,
}

impl TriggerMode {
    /// Operator-facing name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Once => "once",
            Self::Continuous => "continuous",
        }
    }

    /// Apply an event, returning what the caller must do.
    pub const fn on_event(self, event: TriggerEvent) -> TriggerTransition {
        use TriggerEvent::*;
        use TriggerMode::*;

        match (self, event) {
            // Entering Once always restarts the frame count, even from Once.
            (_, Select(Once)) => TriggerTransition::Rearmed,
            (Off, Select(Off)) | (Continuous, Select(Continuous)) => TriggerTransition::Unchanged,
            (_, Select(next)) => TriggerTransition::Changed(next),
            (Once, BurstComplete) => TriggerTransition::Changed(Off),
            (_, BurstComplete) => TriggerTransition::Unchanged,
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerMode {
    type Err = ModeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "off" => Ok(Self::Off),
            "once" => Ok(Self::Once),
            "continuous" => Ok(Self::Continuous),
            other => Err(ModeParseError {
                kind: "trigger",
                value: other.to_string(),
            }),
        }
    }
}

impl ChannelMode for TriggerMode {
    #[inline]
    fn to_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Off),
            1 => Some(Self::Once),
            2 => Some(Self::Continuous),
            _ => None,
        }
    }
}

/// Event applied to the trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Operator selected a mode.
    Select(TriggerMode),
    /// The engine counted `num_frames` completed cycles in Once.
    BurstComplete,
}

/// Outcome of a trigger mode event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTransition {
    /// Mode unchanged, nothing to do.
    Unchanged,
    /// Mode changes to the contained value.
    Changed(TriggerMode),
    /// Mode becomes `Once` and the frame count restarts at zero.
    Rearmed,
}

// ─── GateMode ───────────────────────────────────────────────────────

/// DLP / laser gate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GateMode {
    /// Line held inactive.
    #[default]
    Stop = 0,
    /// Line pulses in its window every cycle.
    Start = 1,
}

impl GateMode {
    /// Operator-facing name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Start => "start",
        }
    }

    /// Apply an operator selection. `None` when unchanged.
    pub const fn on_select(self, next: Self) -> Option<Self> {
        match (self, next) {
            (Self::Stop, Self::Stop) | (Self::Start, Self::Start) => None,
            (_, next) => Some(next),
        }
    }

    /// `true` for [`GateMode::Start`].
    #[inline]
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateMode {
    type Err = ModeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stop" => Ok(Self::Stop),
            "start" => Ok(Self::Start),
            other => Err(ModeParseError {
                kind: "gate",
                value: other.to_string(),
            }),
        }
    }
}

impl ChannelMode for GateMode {
    #[inline]
    fn to_raw(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Stop),
            1 => Some(Self::Start),
            _ => None,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
