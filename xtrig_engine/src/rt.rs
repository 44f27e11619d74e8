//! Real-time thread setup.
//!
//! With the `rt` feature: `mlockall`, stack prefaulting, CPU pinning via
//! `sched_setaffinity` and `SCHED_FIFO` via `sched_setscheduler`.
//! Without it every call is a no-op so the generator runs unprivileged.

use thiserror::Error;
use tracing::{info, warn};
use xtrig_common::generator::RtConfig;

/// RT setup failure.
#[derive(Debug, Clone, Error)]
pub enum RtError {
    /// A system call failed.
    #[error("RT setup error: {0}")]
    Setup(String),
}

/// CPU and priority requested for one thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadPlacement {
    /// CPU core to pin to.
    pub cpu: Option<usize>,
    /// `SCHED_FIFO` priority.
    pub priority: Option<i32>,
}

impl ThreadPlacement {
    /// Placement of the tick thread.
    pub const fn tick(rt: &RtConfig) -> Self {
        Self {
            cpu: rt.tick_cpu,
            priority: rt.tick_priority,
        }
    }

    /// Placement of the engine thread.
    pub const fn engine(rt: &RtConfig) -> Self {
        Self {
            cpu: rt.engine_cpu,
            priority: rt.engine_priority,
        }
    }

    /// Whether anything is requested.
    pub const fn is_requested(&self) -> bool {
        self.cpu.is_some() || self.priority.is_some()
    }

    /// Apply to the calling thread.
    pub fn apply(&self) -> Result<(), RtError> {
        if !self.is_requested() {
            return Ok(());
        }
        if !cfg!(feature = "rt") {
            warn!("RT placement {:?} ignored: built without the `rt` feature", self);
            return Ok(());
        }
        prefault_stack();
        if let Some(cpu) = self.cpu {
            set_affinity(cpu)?;
        }
        if let Some(priority) = self.priority {
            set_scheduler(priority)?;
        }
        info!("RT placement applied: {:?}", self);
        Ok(())
    }
}

/// Lock all current and future pages.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
pub fn lock_memory() -> Result<(), RtError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RtError::Setup(format!("mlockall failed: {e}")))?;
    info!("Memory locked (mlockall)");
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn lock_memory() -> Result<(), RtError> {
    warn!("lock_memory ignored: built without the `rt` feature");
    Ok(())
}

/// Touch stack pages so the RT loop does not fault them in.
fn prefault_stack() {
    // Well below the default 2 MiB thread stack.
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn set_affinity(cpu: usize) -> Result<(), RtError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RtError::Setup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RtError::Setup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn set_affinity(_cpu: usize) -> Result<(), RtError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn set_scheduler(priority: i32) -> Result<(), RtError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtError::Setup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn set_scheduler(_priority: i32) -> Result<(), RtError> {
    Ok(())
}

/// Whether the calling thread runs under a real-time policy.
pub fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: pid 0 queries the calling thread; no pointers involved.
        let policy = unsafe { sched_getscheduler(0) };
        policy == SCHED_FIFO || policy == SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_from_config() {
        let rt = RtConfig {
            tick_cpu: Some(2),
            tick_priority: Some(90),
            engine_cpu: Some(3),
            ..RtConfig::default()
        };
        assert_eq!(
            ThreadPlacement::tick(&rt),
            ThreadPlacement {
                cpu: Some(2),
                priority: Some(90)
            }
        );
        let engine = ThreadPlacement::engine(&rt);
        assert_eq!(engine.cpu, Some(3));
        assert_eq!(engine.priority, None);
        assert!(engine.is_requested());
        assert!(!ThreadPlacement::default().is_requested());
    }

    #[test]
    fn empty_placement_is_noop() {
        assert!(ThreadPlacement::default().apply().is_ok());
    }

    #[test]
    fn placement_without_rt_feature_is_noop() {
        #[cfg(not(feature = "rt"))]
        {
            let p = ThreadPlacement {
                cpu: Some(0),
                priority: Some(80),
            };
            assert!(p.apply().is_ok());
            assert!(lock_memory().is_ok());
        }
    }

    #[test]
    fn unprivileged_tests_are_not_rt() {
        assert!(!detect_rt_mode());
    }
}
