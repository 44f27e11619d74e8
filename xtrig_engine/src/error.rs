//! Top-level generator error.
//!
//! Every layer keeps its own `thiserror` enum; `GeneratorError` wraps
//! them so startup and shutdown can use `?` throughout.

use thiserror::Error;
use xtrig_common::config::ConfigError;
use xtrig_common::output::OutputError;

use crate::params::ParamError;
use crate::rt::RtError;
use crate::tick::TickError;

/// Generator lifecycle errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parameter store construction failed.
    #[error(transparent)]
    Params(#[from] ParamError),

    /// Output driver creation, acquisition or release failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Tick source failed to start.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// RT setup failed.
    #[error(transparent)]
    Rt(#[from] RtError),

    /// The engine thread could not be spawned or failed during setup.
    #[error("engine thread: {0}")]
    Engine(String),

    /// `start` called on a running generator.
    #[error("generator already started")]
    AlreadyStarted,
}
