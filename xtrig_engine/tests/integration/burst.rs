//! Integration test: Once bursts.
//!
//! Validates exactly `numframe` whole active cycles per burst, the
//! latched Off state afterwards, and re-arming from and during a burst.

use xtrig_common::channel::ChannelId;
use xtrig_common::generator::GeneratorConfig;
use xtrig_common::mode::TriggerMode;

use super::Rig;

const CYCLE: usize = 4;
const EXPOSURE: usize = 2;

fn once_rig() -> Rig {
    let mut config = Rig::short_cycle();
    config.modes.trigger = TriggerMode::Once;
    Rig::new(&config)
}

#[test]
fn burst_of_13_frames_then_latched_off() {
    let mut rig = once_rig();
    assert_eq!(rig.state.params.num_frames(), 13);

    assert_eq!(rig.count_active(ChannelId::Trigger, 13 * CYCLE), 13 * EXPOSURE);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Once);

    // First tick of frame 13 retires the burst.
    let eval = rig.next();
    assert!(eval.burst_complete);
    assert!(!rig.is_active(ChannelId::Trigger));
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
    assert_eq!(rig.interface().show("mode").unwrap().as_str(), "off\n");

    assert_eq!(rig.count_active(ChannelId::Trigger, 10 * CYCLE), 0);
    assert_eq!(rig.engine.stats().bursts_completed, 1);
    assert_eq!(rig.probe.edges(ChannelId::Trigger), 26);
}

#[test]
fn reselecting_once_starts_a_new_burst_on_the_next_cycle() {
    let mut rig = once_rig();
    rig.count_active(ChannelId::Trigger, 13 * CYCLE + 1);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);

    // Armed at tick 0 of cycle 13; the rest of that cycle stays inactive.
    rig.interface().store("mode", "once").unwrap();
    assert_eq!(rig.interface().status().cycle_index, None);
    assert_eq!(rig.count_active(ChannelId::Trigger, CYCLE - 1), 0);

    assert_eq!(rig.count_active(ChannelId::Trigger, 13 * CYCLE), 13 * EXPOSURE);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Once);
    rig.next();
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
    assert_eq!(rig.engine.stats().bursts_completed, 2);
}

#[test]
fn rearm_during_burst_restarts_the_count() {
    let mut rig = once_rig();
    assert_eq!(rig.count_active(ChannelId::Trigger, 5 * CYCLE), 5 * EXPOSURE);

    rig.interface().store("mode", "once\n").unwrap();
    assert_eq!(rig.count_active(ChannelId::Trigger, 13 * CYCLE), 13 * EXPOSURE);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Once);

    rig.next();
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
    assert_eq!(rig.engine.stats().bursts_completed, 1);
}

#[test]
fn operator_off_aborts_the_burst() {
    let mut rig = once_rig();
    rig.count_active(ChannelId::Trigger, 3 * CYCLE);
    rig.interface().store("mode", "off").unwrap();

    assert_eq!(rig.count_active(ChannelId::Trigger, 20 * CYCLE), 0);
    assert_eq!(rig.engine.stats().bursts_completed, 0);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
}

#[test]
fn continuous_during_once_keeps_triggering() {
    let mut rig = once_rig();
    rig.count_active(ChannelId::Trigger, 2 * CYCLE);
    rig.interface().store("mode", "continuous").unwrap();

    assert_eq!(rig.count_active(ChannelId::Trigger, 30 * CYCLE), 30 * EXPOSURE);
    assert_eq!(rig.engine.stats().bursts_completed, 0);
}

#[test]
fn shorter_numframe_ends_a_running_burst() {
    let mut rig = once_rig();
    rig.count_active(ChannelId::Trigger, CYCLE);
    rig.interface().store("numframe", "3").unwrap();

    assert_eq!(rig.count_active(ChannelId::Trigger, 2 * CYCLE), 2 * EXPOSURE);
    assert!(rig.next().burst_complete);
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
}

#[test]
fn once_at_default_timing_produces_13_exposures() {
    let mut config = GeneratorConfig::default();
    config.modes.trigger = TriggerMode::Once;
    let mut rig = Rig::new(&config);

    assert_eq!(rig.count_active(ChannelId::Trigger, 13 * 2600), 13 * 200);
    rig.next();
    assert_eq!(rig.state.modes.trigger(), TriggerMode::Off);
    assert_eq!(rig.count_active(ChannelId::Trigger, 2600), 0);
}
