//! Output channel identity, electrical levels and polarity.
//!
//! The generator drives exactly four lines. `ChannelId` names them,
//! `Polarity` maps the logical "active" state to an electrical [`Level`],
//! and [`ChannelSet`] carries the per-tick set of active channels.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::consts::CHANNEL_COUNT;

// ─── ChannelId ──────────────────────────────────────────────────────

/// One of the four output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChannelId {
    /// Camera exposure trigger (XTRIG).
    Trigger = 0,
    /// DLP projector trigger.
    DlpTrigger = 1,
    /// Red laser enable.
    RedLaser = 2,
    /// Blue laser enable.
    BlueLaser = 3,
}

impl ChannelId {
    /// All channels in acquisition order.
    pub const ALL: [Self; CHANNEL_COUNT] =
        [Self::Trigger, Self::DlpTrigger, Self::RedLaser, Self::BlueLaser];

    /// Array index of this channel.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from an array index. Returns `None` for out-of-range values.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Trigger),
            1 => Some(Self::DlpTrigger),
            2 => Some(Self::RedLaser),
            3 => Some(Self::BlueLaser),
            _ => None,
        }
    }

    /// Stable lowercase name, as used in config files and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::DlpTrigger => "dlp_trigger",
            Self::RedLaser => "red_laser",
            Self::BlueLaser => "blue_laser",
        }
    }

    /// The [`ChannelSet`] bit for this channel.
    #[inline]
    pub const fn bit(self) -> ChannelSet {
        match self {
            Self::Trigger => ChannelSet::TRIGGER,
            Self::DlpTrigger => ChannelSet::DLP_TRIGGER,
            Self::RedLaser => ChannelSet::RED_LASER,
            Self::BlueLaser => ChannelSet::BLUE_LASER,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown channel: {s:?}"))
    }
}

// ─── Level ──────────────────────────────────────────────────────────

/// Electrical state of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Line driven low (0).
    #[default]
    Low,
    /// Line driven high (1).
    High,
}

impl Level {
    /// `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// Sysfs `value` representation.
    #[inline]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Low => b"0",
            Self::High => b"1",
        }
    }

    /// Sysfs `direction` representation (output with initial level).
    #[inline]
    pub const fn as_direction(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

// ─── Polarity ───────────────────────────────────────────────────────

/// Which electrical level means "active" on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Active when driven high.
    #[default]
    ActiveHigh,
    /// Active when driven low.
    ActiveLow,
}

impl Polarity {
    /// Electrical level for a logical state.
    #[inline]
    pub const fn level(self, active: bool) -> Level {
        match (self, active) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => Level::High,
            (Self::ActiveHigh, false) | (Self::ActiveLow, true) => Level::Low,
        }
    }

    /// Safe (inactive) level.
    #[inline]
    pub const fn inactive(self) -> Level {
        self.level(false)
    }

    /// Logical state of an electrical level.
    #[inline]
    pub const fn is_active(self, level: Level) -> bool {
        match self {
            Self::ActiveHigh => level.is_high(),
            Self::ActiveLow => !level.is_high(),
        }
    }
}

// ─── ChannelSet ─────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Set of channels, typically the channels active on one tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChannelSet: u8 {
        /// Camera trigger.
        const TRIGGER = 1 << 0;
        /// DLP trigger.
        const DLP_TRIGGER = 1 << 1;
        /// Red laser.
        const RED_LASER = 1 << 2;
        /// Blue laser.
        const BLUE_LASER = 1 << 3;
    }
}

impl ChannelSet {
    /// Whether `channel` is in the set.
    #[inline]
    pub const fn has(self, channel: ChannelId) -> bool {
        self.contains(channel.bit())
    }
}
