//! Integration test: attribute interface and operator console.
//!
//! Validates the text semantics of `show`/`store` and that accepted
//! writes reach the engine on its next evaluation.

use std::io::Cursor;
use xtrig_common::channel::ChannelId;
use xtrig_common::generator::GeneratorConfig;
use xtrig_common::mode::TriggerMode;
use xtrig_engine::attr::{AttrError, Attribute};
use xtrig_engine::console::{Console, ConsoleExit};

use super::Rig;

#[test]
fn status_tracks_burst_progress() {
    let mut config = Rig::short_cycle();
    config.modes.trigger = TriggerMode::Once;
    config.params.num_frames = 4;
    let mut rig = Rig::new(&config);
    let iface = rig.interface();

    for _ in 0..12 {
        rig.next();
    }
    let status = iface.status();
    assert_eq!(status.trigger, TriggerMode::Once);
    assert_eq!(status.cycles_completed, 2);
    assert_eq!(status.tick_in_cycle, 3);
    assert_eq!(status.cycle_index, Some(2));

    for _ in 0..5 {
        rig.next();
    }
    let status = iface.status();
    assert_eq!(status.trigger, TriggerMode::Off);
    assert_eq!(status.cycle_index, None);
}

#[test]
fn show_renders_value_and_newline() {
    let rig = Rig::new(&GeneratorConfig::default());
    let iface = rig.interface();

    let rendered: Vec<_> = Attribute::ALL
        .into_iter()
        .map(|a| iface.show_attr(a).as_str().to_string())
        .collect();
    assert_eq!(
        rendered,
        [
            "continuous\n",
            "stop\n",
            "stop\n",
            "stop\n",
            "200\n",
            "2400\n",
            "13\n",
            "100\n",
            "1000\n"
        ]
    );
    assert_eq!(
        iface.show("exposure_us"),
        Err(AttrError::Unknown("exposure_us".to_string()))
    );
}

#[test]
fn derived_counters_follow_writes() {
    let rig = Rig::new(&GeneratorConfig::default());
    let iface = rig.interface();
    iface.store("datawritetime", "100").unwrap();
    iface.store("exposure", "50").unwrap();

    let status = iface.status();
    assert_eq!(status.cycle_ticks, 150);
    assert_eq!(status.exposure_ticks, 50);
    assert_eq!(status.dlp_ticks, 100);
}

#[test]
fn gate_write_reaches_the_engine() {
    let mut rig = Rig::new(&Rig::short_cycle());
    rig.next();
    assert!(!rig.is_active(ChannelId::BlueLaser));

    rig.interface().store("blue_laser", "start").unwrap();
    rig.next();
    assert!(rig.is_active(ChannelId::BlueLaser));
    assert!(!rig.is_active(ChannelId::RedLaser));
}

#[test]
fn console_session_reads_and_writes() {
    let rig = Rig::new(&GeneratorConfig::default());
    let iface = rig.interface();
    let console = Console::new(&iface, false);

    let script = "exposure=300\nexposure\nred_laser start\ntick_period=10\nquit\nexposure=9\n";
    let mut out = Vec::new();
    let exit = console.run(Cursor::new(script), &mut out).unwrap();
    assert_eq!(exit, ConsoleExit::Quit);

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines[0], "ok (3 bytes)");
    assert_eq!(lines[1], "300");
    assert_eq!(lines[2], "ok (5 bytes)");
    assert!(lines[3].starts_with("error:"));
    assert_eq!(lines.len(), 4);

    // Nothing after `quit` was executed.
    assert_eq!(rig.state.params.exposure_us(), 300);
    assert_eq!(rig.interface().show("red_laser").unwrap().as_str(), "start\n");
}
