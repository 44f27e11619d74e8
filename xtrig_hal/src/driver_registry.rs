//! Driver registry for output drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving
//! output driver factories. Constructed at startup and passed to the
//! generator; there is no global registry.

use std::collections::HashMap;
use xtrig_common::output::{DriverFactory, DriverOptions, OutputDriver, OutputError};

use crate::drivers::register_all_drivers;

/// Registry of available output drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `OutputError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(
        &self,
        name: &str,
        options: &DriverOptions,
    ) -> Result<Box<dyn OutputDriver>, OutputError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| OutputError::DriverNotFound(name.to_string()))?;
        Ok(factory(options))
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
