//! xtrig Common Library
//!
//! This crate provides the shared vocabulary of the xtrig pulse generator:
//! channel identities, polarity, mode state machines, the output sink
//! capability and configuration loading.
//!
//! # Module Structure
//!
//! - [`channel`] - Channel ids, electrical levels, polarity, channel sets
//! - [`mode`] - Trigger and gate modes with their transition functions
//! - [`output`] - `OutputSink` / `OutputDriver` traits and errors
//! - [`config`] - Configuration loading traits and types
//! - [`generator`] - The `xtrig.toml` configuration
//! - [`consts`] - Bounds, defaults and board wiring
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! xtrig_common = { path = "../xtrig_common" }
//! ```
//!
//! ```rust
//! use xtrig_common::prelude::*;
//! ```

pub mod channel;
pub mod config;
pub mod consts;
pub mod generator;
pub mod mode;
pub mod output;
pub mod prelude;
