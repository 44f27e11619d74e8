//! System-wide constants for the xtrig workspace.
//!
//! Single source of truth for parameter bounds, startup defaults and the
//! default board wiring. Imported by all crates; values are never duplicated.

use static_assertions::const_assert;

/// Canonical service name (used for logging and the attribute group).
pub const SERVICE_NAME: &str = "xtrig";

/// Number of output channels driven by the generator.
pub const CHANNEL_COUNT: usize = 4;

/// Nanoseconds per microsecond; every tick period must divide it evenly.
pub const NS_PER_US: u32 = 1000;

// ─── Runtime-writable parameter bounds ──────────────────────────────

/// Minimum accepted exposure [µs].
pub const EXPOSURE_US_MIN: u32 = 2;
/// Maximum accepted exposure [µs].
pub const EXPOSURE_US_MAX: u32 = 100_000;

/// Minimum accepted data-write time [µs].
pub const DATA_WRITE_US_MIN: u32 = 2;
/// Maximum accepted data-write time [µs].
pub const DATA_WRITE_US_MAX: u32 = 100_000;

/// Minimum accepted frame count for a Once burst.
pub const NUM_FRAMES_MIN: u32 = 2;
/// Maximum accepted frame count for a Once burst.
pub const NUM_FRAMES_MAX: u32 = 10_000;

// ─── Init-time constants ────────────────────────────────────────────

/// Minimum DLP pulse width [µs].
pub const DLP_PULSE_WIDTH_US_MIN: u32 = 1;
/// Maximum DLP pulse width [µs].
pub const DLP_PULSE_WIDTH_US_MAX: u32 = 100_000;

// ─── Startup defaults ───────────────────────────────────────────────

/// Default exposure [µs].
pub const DEFAULT_EXPOSURE_US: u32 = 200;
/// Default data-write time [µs].
pub const DEFAULT_DATA_WRITE_US: u32 = 2400;
/// Default Once burst length [frames].
pub const DEFAULT_NUM_FRAMES: u32 = 13;
/// Default DLP pulse width [µs].
pub const DEFAULT_DLP_PULSE_WIDTH_US: u32 = 100;
/// Default tick period [ns] (1 tick per µs).
pub const DEFAULT_TICK_PERIOD_NS: u32 = 1000;

// ─── Default wiring (Jetson Xavier carrier) ─────────────────────────

/// Camera XTRIG input line.
pub const DEFAULT_TRIGGER_LINE: u32 = 249;
/// DLP projector trigger line.
pub const DEFAULT_DLP_TRIGGER_LINE: u32 = 250;
/// Red laser enable line.
pub const DEFAULT_RED_LASER_LINE: u32 = 351;
/// Blue laser enable line.
pub const DEFAULT_BLUE_LASER_LINE: u32 = 424;

/// Default GPIO sysfs root.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/xtrig/xtrig.toml";

const_assert!(DEFAULT_TICK_PERIOD_NS > 0);
const_assert!(NS_PER_US % DEFAULT_TICK_PERIOD_NS == 0);
const_assert!(EXPOSURE_US_MIN <= DEFAULT_EXPOSURE_US && DEFAULT_EXPOSURE_US <= EXPOSURE_US_MAX);
const_assert!(DATA_WRITE_US_MIN <= DEFAULT_DATA_WRITE_US && DEFAULT_DATA_WRITE_US <= DATA_WRITE_US_MAX);
const_assert!(NUM_FRAMES_MIN <= DEFAULT_NUM_FRAMES && DEFAULT_NUM_FRAMES <= NUM_FRAMES_MAX);

// Worst case cycle at 1 ns ticks must fit the 32-bit tick counters.
const_assert!(
    (EXPOSURE_US_MAX as u64 + DATA_WRITE_US_MAX as u64) * NS_PER_US as u64 <= u32::MAX as u64
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lines_are_distinct() {
        let lines = [
            DEFAULT_TRIGGER_LINE,
            DEFAULT_DLP_TRIGGER_LINE,
            DEFAULT_RED_LASER_LINE,
            DEFAULT_BLUE_LASER_LINE,
        ];
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn runtime_minimums_exclude_one() {
        assert_eq!(EXPOSURE_US_MIN, 2);
        assert_eq!(DATA_WRITE_US_MIN, 2);
        assert_eq!(NUM_FRAMES_MIN, 2);
    }
}
