//! Generator lifecycle.
//!
//! Startup: acquire output lines → spawn the engine thread → start the
//! tick source. Shutdown runs the reverse: stop ticks → stop and join
//! the engine → force every channel inactive → release the lines.
//! A failure at any startup step undoes the steps before it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};
use xtrig_common::generator::GeneratorConfig;
use xtrig_common::output::{DriverOptions, OutputDriver, OutputError};
use xtrig_hal::DriverRegistry;

use crate::attr::ConfigurationInterface;
use crate::engine::{EngineStats, PulseEngine};
use crate::error::GeneratorError;
use crate::rt::{self, RtError, ThreadPlacement};
use crate::state::EngineState;
use crate::tick::{TickSource, TickStats};

type DriverEngine = PulseEngine<Box<dyn OutputDriver>>;

/// Counters of one start/shutdown run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Tick thread statistics.
    pub ticks: TickStats,
    /// Engine counters (`None` if the engine thread panicked).
    pub engine: Option<EngineStats>,
}

struct Runtime {
    ticks: TickSource,
    engine: JoinHandle<Option<DriverEngine>>,
    engine_running: Arc<AtomicBool>,
}

/// Owns the shared state and, while started, the tick and engine threads.
pub struct Generator {
    config: GeneratorConfig,
    state: Arc<EngineState>,
    /// Cleared by signal handlers or the console to request shutdown.
    running: Arc<AtomicBool>,
    runtime: Option<Runtime>,
}

impl Generator {
    /// Validate `config` and build the shared state.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let state = Arc::new(EngineState::new(&config)?);
        info!(
            "Generator '{}' created: tick={}ns cycle={} ticks exposure={} ticks dlp={} ticks",
            config.shared.service_name,
            state.params.tick_period_ns(),
            state.params.cycle_ticks(),
            state.params.exposure_ticks(),
            state.params.dlp_ticks()
        );
        Ok(Self {
            config,
            state,
            running: Arc::new(AtomicBool::new(false)),
            runtime: None,
        })
    }

    /// Create the configured driver from `registry` and start.
    pub fn start(&mut self, registry: &DriverRegistry) -> Result<(), GeneratorError> {
        let options = DriverOptions {
            sysfs_root: Some(self.config.output.sysfs_root.clone()),
        };
        let driver = registry.create_driver(&self.config.output.driver, &options)?;
        self.start_with_driver(driver)
    }

    /// Start with an already created driver.
    pub fn start_with_driver(
        &mut self,
        mut driver: Box<dyn OutputDriver>,
    ) -> Result<(), GeneratorError> {
        if self.runtime.is_some() {
            return Err(GeneratorError::AlreadyStarted);
        }
        if self.config.rt.lock_memory {
            rt::lock_memory()?;
        }

        let lines = self.config.lines();
        info!(
            "Acquiring {} lines with driver '{}' v{}",
            lines.len(),
            driver.name(),
            driver.version()
        );
        driver.init(&lines)?;

        let engine = PulseEngine::new(Arc::clone(&self.state), driver, &lines);
        let engine_running = Arc::new(AtomicBool::new(true));
        let handle = spawn_engine(engine, &self.config, Arc::clone(&engine_running))?;

        let ticks = match TickSource::start(
            self.state.params.tick_period_ns(),
            Arc::clone(&self.state),
            ThreadPlacement::tick(&self.config.rt),
        ) {
            Ok(ticks) => ticks,
            Err(e) => {
                match stop_engine(handle, &engine_running) {
                    Ok(engine) => release_quietly(engine),
                    Err(stop) => warn!("Cleanup after tick start failure: {stop}"),
                }
                return Err(e.into());
            }
        };

        self.running.store(true, Ordering::Release);
        self.runtime = Some(Runtime {
            ticks,
            engine: handle,
            engine_running,
        });
        info!("Generator started");
        Ok(())
    }

    /// Stop everything and release the lines. `None` if not started.
    pub fn shutdown(&mut self) -> Result<Option<RunSummary>, GeneratorError> {
        self.running.store(false, Ordering::Release);
        let Some(runtime) = self.runtime.take() else {
            return Ok(None);
        };
        info!("Generator shutting down");

        let ticks = runtime.ticks.stop();
        let engine = match stop_engine(runtime.engine, &runtime.engine_running) {
            Ok(engine) => {
                let stats = engine.stats();
                teardown(engine)?;
                Some(stats)
            }
            Err(e) => {
                error!("{e}; output lines could not be released");
                None
            }
        };

        info!("Generator stopped, all lines released");
        Ok(Some(RunSummary { ticks, engine }))
    }

    /// Flag that stays true while started; clear it to request shutdown.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Whether the threads are running.
    pub fn is_started(&self) -> bool {
        self.runtime.is_some()
    }

    /// Attribute interface over the shared state.
    pub fn interface(&self) -> ConfigurationInterface {
        ConfigurationInterface::new(Arc::clone(&self.state))
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        if self.runtime.is_some() {
            if let Err(e) = self.shutdown() {
                error!("Shutdown on drop failed: {e}");
            }
        }
    }
}

/// Spawn the engine thread and wait until its placement is applied.
///
/// The engine is handed over through a channel after the spawn succeeds,
/// so every failure path still owns it and can release the lines.
fn spawn_engine(
    engine: DriverEngine,
    config: &GeneratorConfig,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<Option<DriverEngine>>, GeneratorError> {
    let placement = ThreadPlacement::engine(&config.rt);
    let strategy = config.timing.wait_strategy;
    let (engine_tx, engine_rx) = mpsc::sync_channel::<DriverEngine>(1);
    let (setup_tx, setup_rx) = mpsc::sync_channel::<Result<(), RtError>>(1);

    let spawned = thread::Builder::new()
        .name("xtrig-engine".to_string())
        .spawn(move || {
            let mut engine = engine_rx.recv().ok()?;
            let setup = placement.apply();
            let ok = setup.is_ok();
            let _ = setup_tx.send(setup);
            if ok {
                engine.run(strategy, &running);
            }
            Some(engine)
        });

    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => {
            release_quietly(engine);
            return Err(GeneratorError::Engine(e.to_string()));
        }
    };
    if let Err(mpsc::SendError(engine)) = engine_tx.send(engine) {
        release_quietly(engine);
        let _ = handle.join();
        return Err(GeneratorError::Engine("engine thread exited early".to_string()));
    }

    match setup_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            if let Ok(Some(engine)) = handle.join() {
                release_quietly(engine);
            }
            Err(e.into())
        }
        Err(_) => {
            if let Ok(Some(engine)) = handle.join() {
                release_quietly(engine);
            }
            Err(GeneratorError::Engine("engine thread exited during setup".to_string()))
        }
    }
}

/// Signal the engine loop to stop and take the engine back.
fn stop_engine(
    handle: JoinHandle<Option<DriverEngine>>,
    running: &AtomicBool,
) -> Result<DriverEngine, GeneratorError> {
    running.store(false, Ordering::Release);
    handle.thread().unpark();
    match handle.join() {
        Ok(Some(engine)) => Ok(engine),
        Ok(None) => Err(GeneratorError::Engine("engine was never received".to_string())),
        Err(_) => Err(GeneratorError::Engine("engine thread panicked".to_string())),
    }
}

/// Force all channels inactive, then release the lines.
fn teardown(mut engine: DriverEngine) -> Result<(), OutputError> {
    engine.force_inactive();
    let mut driver = engine.into_sink();
    if let Some(diag) = driver.diagnostics() {
        info!(
            "Driver '{}': {} writes, {} write errors",
            driver.name(),
            diag.writes,
            diag.write_errors
        );
    }
    driver.shutdown()
}

fn release_quietly(engine: DriverEngine) {
    if let Err(e) = teardown(engine) {
        warn!("Line release failed during startup cleanup: {e}");
    }
}
