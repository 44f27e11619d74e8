//! Integration test: continuous trigger and gated channels.
//!
//! Validates the per-cycle windows on the physical line levels, with
//! polarity applied by the engine and parameters changed at runtime.

use xtrig_common::channel::{ChannelId, Level};
use xtrig_common::generator::GeneratorConfig;
use xtrig_common::mode::GateMode;

use super::Rig;

#[test]
fn default_cycle_has_200_active_trigger_ticks() {
    let mut rig = Rig::new(&GeneratorConfig::default());
    assert_eq!(rig.state.params.cycle_ticks(), 2600);
    assert_eq!(rig.count_active(ChannelId::Trigger, 2600), 200);

    // One falling and one rising edge on the active-low line per cycle.
    assert_eq!(rig.probe.edges(ChannelId::Trigger), 2);
    assert_eq!(rig.probe.level(ChannelId::Trigger), Level::High);

    rig.next();
    assert_eq!(rig.probe.level(ChannelId::Trigger), Level::Low);
    assert_eq!(rig.probe.edges(ChannelId::Trigger), 3);
}

#[test]
fn trigger_window_repeats_every_cycle() {
    let mut rig = Rig::new(&Rig::short_cycle());
    assert_eq!(rig.count_active(ChannelId::Trigger, 40), 20);
    assert_eq!(rig.probe.edges(ChannelId::Trigger), 20);
}

#[test]
fn gates_start_and_stop_independently() {
    let mut config = Rig::short_cycle();
    config.modes.red_laser = GateMode::Start;
    config.modes.dlp_trigger = GateMode::Start;
    let mut rig = Rig::new(&config);

    let mut red = 0;
    let mut blue = 0;
    let mut dlp = 0;
    for _ in 0..40 {
        rig.next();
        red += usize::from(rig.is_active(ChannelId::RedLaser));
        blue += usize::from(rig.is_active(ChannelId::BlueLaser));
        dlp += usize::from(rig.is_active(ChannelId::DlpTrigger));
    }
    assert_eq!(red, 20);
    assert_eq!(blue, 0);
    assert_eq!(dlp, 10);

    rig.interface().store("red_laser", "stop").unwrap();
    assert_eq!(rig.count_active(ChannelId::RedLaser, 8), 0);
    assert_eq!(rig.state.modes.gate(ChannelId::RedLaser), GateMode::Stop);
}

#[test]
fn exposure_change_applies_from_next_evaluation() {
    let mut rig = Rig::new(&GeneratorConfig::default());
    let iface = rig.interface();
    iface.store("exposure", "500").unwrap();
    iface.store("red_laser", "start").unwrap();

    assert_eq!(rig.state.params.cycle_ticks(), 2900);
    assert_eq!(rig.count_active(ChannelId::Trigger, 2900), 500);
    assert_eq!(rig.state.schedule.position().cycles_completed, 0);

    let mut red = 0;
    for _ in 0..2900 {
        rig.next();
        red += usize::from(rig.is_active(ChannelId::RedLaser));
    }
    assert_eq!(red, 500);
}

#[test]
fn dlp_window_does_not_follow_exposure() {
    let mut config = GeneratorConfig::default();
    config.modes.dlp_trigger = GateMode::Start;
    let mut rig = Rig::new(&config);
    rig.interface().store("exposure", "50").unwrap();

    assert_eq!(rig.state.params.dlp_ticks(), 100);
    assert_eq!(rig.count_active(ChannelId::DlpTrigger, 2450), 100);
    assert_eq!(rig.count_active(ChannelId::Trigger, 2450), 50);
}

#[test]
fn trigger_off_keeps_line_inactive() {
    let mut rig = Rig::new(&Rig::short_cycle());
    rig.interface().store("mode", "off").unwrap();
    assert_eq!(rig.count_active(ChannelId::Trigger, 16), 0);
    assert_eq!(rig.probe.level(ChannelId::Trigger), Level::High);
    // Only the forced first write, which matched the acquired level.
    assert_eq!(rig.probe.edges(ChannelId::Trigger), 0);
}
