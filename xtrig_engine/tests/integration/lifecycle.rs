//! Integration test: generator lifecycle.
//!
//! Validates start → run → shutdown with real tick and engine threads,
//! against the simulation driver and a fake GPIO sysfs tree.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use xtrig_common::channel::{ChannelId, Level};
use xtrig_common::config::ConfigLoader;
use xtrig_common::generator::{GeneratorConfig, WaitStrategy};
use xtrig_common::mode::TriggerMode;
use xtrig_engine::generator::Generator;
use xtrig_hal::{DriverRegistry, LineEvent, SimulationDriver};

const XTRIG_TOML: &str = r#"
[shared]
service_name = "xtrig-test"

[params]
exposure_us = 10
data_write_us = 10
num_frames = 2

[modes]
trigger = "once"
red_laser = "start"

[output]
driver = "simulation"

[channels.blue_laser]
line = 425
"#;

fn settle() {
    thread::sleep(Duration::from_millis(30));
}

fn run_with_simulation(strategy: WaitStrategy) {
    let mut config = GeneratorConfig::default();
    config.timing.wait_strategy = strategy;
    config.params.exposure_us = 2;
    config.params.data_write_us = 2;

    let driver = SimulationDriver::new();
    let probe = driver.probe();
    let mut generator = Generator::new(config).unwrap();
    generator.start_with_driver(Box::new(driver)).unwrap();
    settle();

    assert!(probe.edges(ChannelId::Trigger) > 0);
    generator.interface().store("red_laser", "start").unwrap();
    settle();
    assert!(probe.edges(ChannelId::RedLaser) > 0);

    let summary = generator.shutdown().unwrap().unwrap();
    assert!(summary.ticks.tick_count > 0);
    assert!(summary.engine.unwrap().evaluations > 1);

    assert_eq!(probe.level(ChannelId::Trigger), Level::High);
    assert_eq!(probe.level(ChannelId::RedLaser), Level::Low);
    let journal = probe.journal();
    assert_eq!(journal.len(), 8);
    assert_eq!(journal[4], LineEvent::Released(ChannelId::BlueLaser, Level::Low));
    assert_eq!(journal[7], LineEvent::Released(ChannelId::Trigger, Level::High));
}

#[test]
fn spin_engine_runs_and_releases() {
    run_with_simulation(WaitStrategy::Spin);
}

#[test]
fn parked_engine_runs_and_releases() {
    run_with_simulation(WaitStrategy::Park);
}

/// Start, run and shut down the same generator twice. Each run's engine
/// must keep pace with its ticks, not just wake on the park timeout.
fn restart_with_simulation(strategy: WaitStrategy) {
    let mut config = GeneratorConfig::default();
    config.timing.wait_strategy = strategy;
    let mut generator = Generator::new(config).unwrap();

    for run in 0..2 {
        let driver = SimulationDriver::new();
        let observer = driver.probe();
        generator.start_with_driver(Box::new(driver)).unwrap();
        thread::sleep(Duration::from_millis(200));

        let summary = generator.shutdown().unwrap().unwrap();
        let evaluations = summary.engine.unwrap().evaluations;
        let ticks = summary.ticks.tick_count;
        assert!(ticks > 100, "run {run}: only {ticks} ticks");
        assert!(
            evaluations * 2 >= ticks,
            "run {run}: {evaluations} evaluations for {ticks} ticks"
        );
        assert_eq!(observer.level(ChannelId::Trigger), Level::High);
        assert!(!generator.is_started());
    }
}

#[test]
fn spin_engine_survives_restart() {
    restart_with_simulation(WaitStrategy::Spin);
}

#[test]
fn parked_engine_survives_restart() {
    restart_with_simulation(WaitStrategy::Park);
}

#[test]
fn config_file_drives_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xtrig.toml");
    fs::write(&path, XTRIG_TOML).unwrap();

    let config = GeneratorConfig::load(&path).unwrap();
    assert_eq!(config.lines()[3].line, 425);

    let mut generator = Generator::new(config).unwrap();
    generator.start(&DriverRegistry::with_builtin()).unwrap();
    let iface = generator.interface();
    assert_eq!(iface.show("numframe").unwrap().as_str(), "2\n");

    let deadline = Instant::now() + Duration::from_secs(2);
    while generator.state().modes.trigger() == TriggerMode::Once && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(generator.state().modes.trigger(), TriggerMode::Off);
    let summary = generator.shutdown().unwrap().unwrap();
    assert_eq!(summary.engine.unwrap().bursts_completed, 1);
}

#[test]
fn invalid_startup_value_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xtrig.toml");
    fs::write(&path, "[params]\nexposure_us = 1\n").unwrap();

    let config = GeneratorConfig::load(&path).unwrap();
    assert!(Generator::new(config).is_err());
}

fn fake_sysfs(lines: &[u32]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("export"), "").unwrap();
    fs::write(dir.path().join("unexport"), "").unwrap();
    for line in lines {
        let gpio = dir.path().join(format!("gpio{line}"));
        fs::create_dir(&gpio).unwrap();
        fs::write(gpio.join("direction"), "in").unwrap();
        fs::write(gpio.join("value"), "0").unwrap();
    }
    dir
}

fn value(root: &Path, line: u32) -> String {
    fs::read_to_string(root.join(format!("gpio{line}")).join("value")).unwrap()
}

#[test]
fn sysfs_lines_end_inactive() {
    let root = fake_sysfs(&[249, 250, 351, 424]);
    let mut config = GeneratorConfig::default();
    config.output.driver = "sysfs".to_string();
    config.output.sysfs_root = root.path().to_path_buf();
    config.modes.red_laser = xtrig_common::mode::GateMode::Start;

    let mut generator = Generator::new(config).unwrap();
    generator.start(&DriverRegistry::with_builtin()).unwrap();
    settle();
    generator.shutdown().unwrap();

    assert_eq!(value(root.path(), 249), "1");
    assert_eq!(value(root.path(), 250), "0");
    assert_eq!(value(root.path(), 351), "0");
    assert_eq!(value(root.path(), 424), "0");
    let direction = fs::read_to_string(root.path().join("gpio249").join("direction")).unwrap();
    assert_eq!(direction, "high");
}

#[test]
fn sysfs_missing_line_fails_start() {
    let root = fake_sysfs(&[249, 250]);
    let mut config = GeneratorConfig::default();
    config.output.sysfs_root = root.path().to_path_buf();

    let mut generator = Generator::new(config).unwrap();
    assert!(generator.start(&DriverRegistry::with_builtin()).is_err());
    assert!(!generator.is_started());
    // Already-exported lines were left at their inactive level.
    assert_eq!(value(root.path(), 249), "1");
}
