//! # xtrig
//!
//! Multi-channel pulse generator for structured-light capture.
//!
//! # Usage
//!
//! ```bash
//! # Simulation driver, interactive console on stdin
//! xtrig --simulate
//!
//! # Board wiring from a config file, GPIO sysfs driver
//! xtrig --config /etc/xtrig/xtrig.toml
//!
//! # Headless, JSON logs
//! xtrig --config xtrig.toml --no-console --json
//! ```

use clap::Parser;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use xtrig_common::config::{ConfigError, ConfigLoader, LogLevel};
use xtrig_common::consts::DEFAULT_CONFIG_PATH;
use xtrig_common::generator::GeneratorConfig;
use xtrig_engine::attr::ConfigurationInterface;
use xtrig_engine::console::{Console, ConsoleExit};
use xtrig_engine::generator::Generator;
use xtrig_hal::DriverRegistry;

/// xtrig - camera / DLP / laser trigger generator
#[derive(Parser, Debug)]
#[command(name = "xtrig")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Tick-driven multi-channel trigger generator")]
struct Args {
    /// Path to the configuration file (TOML). Defaults apply when omitted
    /// and the default path does not exist.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force the simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// Output driver name (overrides the config file)
    #[arg(short, long)]
    driver: Option<String>,

    /// Do not read operator commands from stdin
    #[arg(long)]
    no_console: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args);

    let log_level = match &loaded {
        Ok(config) => config.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, log_level);

    info!("xtrig v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match loaded {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("xtrig shutdown complete");
}

fn run(args: &Args, mut config: GeneratorConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.simulate {
        info!("Simulation mode enabled");
        config.output.driver = "simulation".to_string();
    } else if let Some(driver) = &args.driver {
        config.output.driver = driver.clone();
    }

    let registry = DriverRegistry::with_builtin();
    info!("Available drivers: {:?}", registry.list_drivers());

    let mut generator = Generator::new(config)?;

    let running = generator.running_flag();
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    generator.start(&registry)?;

    if !args.no_console {
        spawn_console(generator.interface(), Arc::clone(&running))?;
    }

    while running.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(100));
    }

    if let Some(summary) = generator.shutdown()? {
        info!(
            "Run summary: {} ticks ({} late), {} evaluations",
            summary.ticks.tick_count,
            summary.ticks.late_ticks,
            summary.engine.map_or(0, |e| e.evaluations)
        );
    }
    Ok(())
}

/// Load `--config`, or the default path if it exists, or built-in defaults.
fn load_config(args: &Args) -> Result<GeneratorConfig, ConfigError> {
    match &args.config {
        Some(path) => GeneratorConfig::load(path),
        None => match GeneratorConfig::load(std::path::Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::FileNotFound) => Ok(GeneratorConfig::default()),
            other => other,
        },
    }
}

/// Operator console on stdin/stdout. `quit` requests shutdown.
fn spawn_console(iface: ConfigurationInterface, running: Arc<AtomicBool>) -> io::Result<()> {
    thread::Builder::new()
        .name("xtrig-console".to_string())
        .spawn(move || {
            let console = Console::new(&iface, true);
            let stdin = io::stdin();
            let mut out = BufWriter::new(io::stdout());
            match console.run(stdin.lock(), &mut out) {
                Ok(ConsoleExit::Quit) => {
                    info!("Console quit");
                    running.store(false, Ordering::SeqCst);
                }
                Ok(ConsoleExit::Eof) => info!("Console input closed, generator keeps running"),
                Err(e) => warn!("Console I/O error: {e}"),
            }
        })?;
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the config level.
///
/// `RUST_LOG` takes precedence over both.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // Logs go to stderr; stdout belongs to the console.
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}
