//! # xtrig Engine Library
//!
//! Tick-driven pulse timing for a structured-light rig: a camera
//! trigger, a DLP trigger and two laser enables, phase-aligned from
//! integer tick arithmetic.
//!
//! ## Execution Contexts
//!
//! ```text
//!  tick thread                      engine thread
//!  ───────────                      ─────────────
//!  sleep(period)                    wait(ready)
//!  schedule.advance(cycle_ticks) ─► evaluate(inputs) → set_level(...)
//!  ready.raise()                    Once→Off edge (CAS)
//!                  ▲
//!                  │ ParameterStore / ModeBank
//!          configuration path (attributes, console)
//! ```
//!
//! 1. **TickSource** (`tick`) - O(1), lock-free, no output, no logging.
//! 2. **PulseEngine** (`engine`) - sole writer of output levels.
//! 3. **ConfigurationInterface** (`attr`) - text get/set of parameters and modes.
//!
//! All three share one [`state::EngineState`] through an `Arc`.

pub mod attr;
pub mod console;
pub mod engine;
pub mod error;
pub mod generator;
pub mod modes;
pub mod params;
pub mod rt;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod wait;

pub use crate::attr::{AttrError, Attribute, ConfigurationInterface, StatusSnapshot};
pub use crate::engine::{Evaluation, PulseEngine, TickInputs, evaluate};
pub use crate::error::GeneratorError;
pub use crate::generator::{Generator, RunSummary};
pub use crate::state::EngineState;
