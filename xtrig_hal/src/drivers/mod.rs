//! Output driver implementations.
//!
//! - [`simulation`] - In-memory lines for development and testing
//! - [`sysfs`] - Linux GPIO sysfs lines
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `OutputDriver` from `xtrig_common::output`
//! 3. Register the factory in [`register_all_drivers`]

pub mod simulation;
pub mod sysfs;

use xtrig_common::output::{DriverOptions, OutputDriver};

use crate::driver_registry::DriverRegistry;

/// Register every built-in driver.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", create_simulation_driver);
    registry.register("sysfs", create_sysfs_driver);
}

fn create_simulation_driver(_options: &DriverOptions) -> Box<dyn OutputDriver> {
    Box::new(simulation::SimulationDriver::new())
}

fn create_sysfs_driver(options: &DriverOptions) -> Box<dyn OutputDriver> {
    match &options.sysfs_root {
        Some(root) => Box::new(sysfs::SysfsDriver::with_root(root)),
        None => Box::new(sysfs::SysfsDriver::new()),
    }
}
