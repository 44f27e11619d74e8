//! # xtrig HAL Library
//!
//! Output line drivers with a pluggable driver architecture.
//!
//! Drivers implement the `OutputDriver` trait defined in
//! `xtrig_common::output`. The pulse engine only ever sees the
//! `OutputSink` half of that trait; acquisition and release belong to
//! the generator lifecycle.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (`simulation`, `sysfs`)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   xtrig_hal                               │
//! │  ┌──────────────────┐          ┌───────────────────────┐  │
//! │  │ DriverRegistry   │─create──►│ OutputDriver (dyn)    │  │
//! │  │ name → factory   │          │ init / set_level /    │  │
//! │  └──────────────────┘          │ shutdown              │  │
//! │                                └───────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::simulation::{LineEvent, SimulationDriver, SimulationProbe};
pub use crate::drivers::sysfs::SysfsDriver;
