//! Linux GPIO sysfs driver.
//!
//! Each line is exported through `<root>/export`, configured as an output
//! whose initial level is the inactive level (`direction` = `high`/`low`,
//! so the line never glitches active), and driven through its `value`
//! file. The `value` file is opened once at acquisition; the hot path is
//! a single positioned write.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xtrig_common::channel::{ChannelId, Level};
use xtrig_common::consts::{CHANNEL_COUNT, DEFAULT_SYSFS_ROOT};
use xtrig_common::output::{DriverDiagnostics, LineConfig, OutputDriver, OutputError, OutputSink};

struct SysfsLine {
    config: LineConfig,
    value: File,
    /// Whether we exported the line (and must unexport it).
    exported_by_us: bool,
}

/// GPIO sysfs driver implementing the `OutputDriver` trait.
pub struct SysfsDriver {
    root: PathBuf,
    /// Acquired lines in acquisition order
    lines: Vec<SysfsLine>,
    /// Index into `lines` per channel
    slots: [Option<usize>; CHANNEL_COUNT],
    writes: u64,
    write_errors: u64,
}

impl SysfsDriver {
    /// Driver using the standard `/sys/class/gpio` root.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT)
    }

    /// Driver using a custom sysfs root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            lines: Vec::new(),
            slots: [None; CHANNEL_COUNT],
            writes: 0,
            write_errors: 0,
        }
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{line}"))
    }

    fn acquire(&self, cfg: &LineConfig) -> io::Result<SysfsLine> {
        let dir = self.line_dir(cfg.line);
        let exported_by_us = if dir.exists() {
            warn!("Line {} already exported, reusing it", cfg.line);
            false
        } else {
            fs::write(self.root.join("export"), cfg.line.to_string())?;
            true
        };

        let result = (|| {
            fs::write(dir.join("direction"), cfg.polarity.inactive().as_direction())?;
            OpenOptions::new().write(true).open(dir.join("value"))
        })();

        match result {
            Ok(value) => Ok(SysfsLine {
                config: *cfg,
                value,
                exported_by_us,
            }),
            Err(e) => {
                if exported_by_us {
                    let _ = fs::write(self.root.join("unexport"), cfg.line.to_string());
                }
                Err(e)
            }
        }
    }

    fn release(&self, line: &SysfsLine) -> io::Result<()> {
        let cfg = &line.config;
        line.value.write_at(cfg.polarity.inactive().as_bytes(), 0)?;
        if line.exported_by_us {
            fs::write(self.root.join("unexport"), cfg.line.to_string())?;
        }
        debug!("Released {} (line {})", cfg.channel, cfg.line);
        Ok(())
    }

    /// Release every acquired line in reverse order, returning the first failure.
    fn release_all(&mut self) -> Result<(), OutputError> {
        self.slots = [None; CHANNEL_COUNT];
        let mut first_err = None;
        while let Some(line) = self.lines.pop() {
            if let Err(e) = self.release(&line) {
                warn!("Release of line {} failed: {}", line.config.line, e);
                first_err.get_or_insert(OutputError::ReleaseFailed {
                    channel: line.config.channel,
                    line: line.config.line,
                    reason: e.to_string(),
                });
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Default for SysfsDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for SysfsDriver {
    fn set_level(&mut self, channel: ChannelId, level: Level) {
        let Some(slot) = self.slots[channel.index()] else {
            self.write_errors += 1;
            return;
        };
        self.writes += 1;
        if self.lines[slot].value.write_at(level.as_bytes(), 0).is_err() {
            self.write_errors += 1;
        }
    }
}

impl OutputDriver for SysfsDriver {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, lines: &[LineConfig]) -> Result<(), OutputError> {
        info!(
            "Initializing sysfs driver at {} with {} lines",
            self.root.display(),
            lines.len()
        );

        for cfg in lines {
            match self.acquire(cfg) {
                Ok(line) => {
                    debug!(
                        "Acquired {} (line {}) at {:?}",
                        cfg.channel,
                        cfg.line,
                        cfg.polarity.inactive()
                    );
                    self.slots[cfg.channel.index()] = Some(self.lines.len());
                    self.lines.push(line);
                }
                Err(e) => {
                    let err = OutputError::AcquireFailed {
                        channel: cfg.channel,
                        line: cfg.line,
                        reason: e.to_string(),
                    };
                    if let Err(release_err) = self.release_all() {
                        warn!("Cleanup after failed acquisition: {}", release_err);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        info!("Shutting down sysfs driver");
        self.release_all()
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(DriverDiagnostics {
            writes: self.writes,
            write_errors: self.write_errors,
        })
    }
}
