//! Prelude module for common re-exports.
//!
//! ```rust
//! use xtrig_common::prelude::*;
//! ```

// ─── Channels ───────────────────────────────────────────────────────
pub use crate::channel::{ChannelId, ChannelSet, Level, Polarity};

// ─── Modes ──────────────────────────────────────────────────────────
pub use crate::mode::{
    ChannelMode, GateMode, ModeParseError, TriggerEvent, TriggerMode, TriggerTransition,
};

// ─── Output ─────────────────────────────────────────────────────────
pub use crate::output::{
    DriverDiagnostics, DriverFactory, DriverOptions, LineConfig, OutputDriver, OutputError,
    OutputSink,
};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::generator::{GeneratorConfig, WaitStrategy};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CHANNEL_COUNT, SERVICE_NAME};
