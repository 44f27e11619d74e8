//! Output sink capability, output driver trait and error types.
//!
//! This module defines:
//! - `OutputSink` trait - The only capability the pulse engine needs
//! - `OutputDriver` trait - Sink plus line acquisition/release lifecycle
//! - `OutputError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type
//! - `LineConfig` struct - One channel-to-line binding

use crate::channel::{ChannelId, Level, Polarity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for output driver operations.
#[derive(Debug, Clone, Error)]
pub enum OutputError {
    /// A line could not be acquired.
    #[error("failed to acquire {channel} (line {line}): {reason}")]
    AcquireFailed {
        /// Channel being acquired.
        channel: ChannelId,
        /// Line number.
        line: u32,
        /// Underlying cause.
        reason: String,
    },

    /// A line could not be released cleanly.
    #[error("failed to release {channel} (line {line}): {reason}")]
    ReleaseFailed {
        /// Channel being released.
        channel: ChannelId,
        /// Line number.
        line: u32,
        /// Underlying cause.
        reason: String,
    },

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&DriverOptions) -> Box<dyn OutputDriver>;

/// Options handed to a driver factory.
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// GPIO sysfs root for the `sysfs` driver.
    pub sysfs_root: Option<std::path::PathBuf>,
}

/// Binding of a channel to a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Logical channel.
    pub channel: ChannelId,
    /// Line (GPIO) number.
    pub line: u32,
    /// Active level of the line.
    #[serde(default)]
    pub polarity: Polarity,
}

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DriverDiagnostics {
    /// Number of level writes forwarded to hardware.
    pub writes: u64,
    /// Number of level writes that failed.
    pub write_errors: u64,
}

/// The capability the pulse engine writes levels through.
///
/// # Timing Contract
/// `set_level` is called from the engine loop and MUST NOT block.
/// Writes are idempotent; there is no return value, failures are
/// absorbed by the implementation.
pub trait OutputSink {
    /// Drive `channel` to `level`.
    fn set_level(&mut self, channel: ChannelId, level: Level);
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    #[inline]
    fn set_level(&mut self, channel: ChannelId, level: Level) {
        (**self).set_level(channel, level);
    }
}

/// Output sink with line lifecycle.
///
/// # Lifecycle
///
/// 1. `init()` - Acquire every line, drive it to its inactive level
/// 2. `set_level()` - Called from the engine loop
/// 3. `shutdown()` - Release every acquired line
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | `init()` | None (pre-RT) |
/// | `set_level()` | **HARD**, non-blocking |
/// | `shutdown()` | None (post-RT) |
pub trait OutputDriver: OutputSink + Send {
    /// Returns the driver's unique identifier (e.g., "simulation", "sysfs").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Acquire `lines` in order.
    ///
    /// On failure the driver MUST release the lines it already acquired,
    /// in reverse acquisition order, before returning the error.
    fn init(&mut self, lines: &[LineConfig]) -> Result<(), OutputError>;

    /// Release all acquired lines, in reverse acquisition order.
    fn shutdown(&mut self) -> Result<(), OutputError>;

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
