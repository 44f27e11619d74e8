//! Live channel modes.
//!
//! Gate modes are single atomic bytes. The trigger cell packs the mode
//! together with the frame baseline of the current Once burst into one
//! `AtomicU64`, so re-arming is a single store and the engine's
//! Once→Off edge is a compare-and-swap that fails if the operator
//! re-armed in between.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tracing::info;
use xtrig_common::channel::ChannelId;
use xtrig_common::consts::CHANNEL_COUNT;
use xtrig_common::generator::ModesConfig;
use xtrig_common::mode::{ChannelMode, GateMode, TriggerEvent, TriggerMode, TriggerTransition};

use crate::schedule::SchedulePosition;

/// Trigger mode plus Once burst baseline, as read in one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    /// Current mode.
    pub mode: TriggerMode,
    /// `cycles_completed` value at which frame 0 of the burst starts.
    pub frame_base: u32,
}

impl TriggerState {
    #[inline]
    const fn pack(self) -> u64 {
        ((self.mode as u64) << 32) | self.frame_base as u64
    }

    #[inline]
    fn unpack(word: u64) -> Self {
        Self {
            // Only `pack` writes the cell, so the mode byte is always valid.
            mode: TriggerMode::from_raw((word >> 32) as u8).unwrap_or(TriggerMode::Off),
            frame_base: word as u32,
        }
    }

    /// Frame index of the burst at `pos` (the cycle index since Once
    /// was entered). `None` while the first whole frame has not begun.
    #[inline]
    pub const fn frame_index(self, pos: SchedulePosition) -> Option<u32> {
        let delta = pos.cycles_completed.wrapping_sub(self.frame_base);
        if (delta as i32) < 0 { None } else { Some(delta) }
    }
}

/// Atomic mode storage for all four channels.
#[derive(Debug)]
pub struct ModeBank {
    trigger: AtomicU64,
    gates: [AtomicU8; CHANNEL_COUNT],
}

impl ModeBank {
    /// Initial modes, with a Once burst armed at schedule position zero.
    pub fn new(initial: &ModesConfig) -> Self {
        let trigger = TriggerState {
            mode: initial.trigger,
            frame_base: 0,
        };
        let gates = [
            AtomicU8::new(GateMode::Stop.to_raw()),
            AtomicU8::new(initial.dlp_trigger.to_raw()),
            AtomicU8::new(initial.red_laser.to_raw()),
            AtomicU8::new(initial.blue_laser.to_raw()),
        ];
        Self {
            trigger: AtomicU64::new(trigger.pack()),
            gates,
        }
    }

    /// Current trigger state.
    #[inline]
    pub fn trigger_state(&self) -> TriggerState {
        TriggerState::unpack(self.trigger.load(Ordering::Acquire))
    }

    /// Current trigger mode.
    #[inline]
    pub fn trigger(&self) -> TriggerMode {
        self.trigger_state().mode
    }

    /// Gate mode of `channel`. The trigger channel has no gate and reads `Stop`.
    #[inline]
    pub fn gate(&self, channel: ChannelId) -> GateMode {
        if channel == ChannelId::Trigger {
            return GateMode::Stop;
        }
        GateMode::from_raw(self.gates[channel.index()].load(Ordering::Acquire))
            .unwrap_or(GateMode::Stop)
    }

    /// Operator selection of a trigger mode.
    ///
    /// Selecting Once (also from Once) arms a new burst whose first frame
    /// is the next whole cycle after the schedule position. `position` is
    /// read on every attempt, right before the exchange.
    pub fn select_trigger<P>(&self, next: TriggerMode, position: P) -> TriggerTransition
    where
        P: Fn() -> SchedulePosition,
    {
        let mut current = self.trigger.load(Ordering::Acquire);
        loop {
            let state = TriggerState::unpack(current);
            let transition = state.mode.on_event(TriggerEvent::Select(next));
            let target = match transition {
                TriggerTransition::Unchanged => return transition,
                TriggerTransition::Changed(mode) => TriggerState {
                    mode,
                    frame_base: state.frame_base,
                },
                TriggerTransition::Rearmed => TriggerState {
                    mode: TriggerMode::Once,
                    frame_base: position().next_frame_boundary(),
                },
            };
            match self.trigger.compare_exchange_weak(
                current,
                target.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    info!("trigger mode {} -> {}", state.mode, target.mode);
                    return transition;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Engine-side Once→Off edge for the burst described by `seen`.
    ///
    /// Returns `false` if the trigger state changed since `seen` was read
    /// (operator re-armed or left Once), in which case nothing is done.
    pub fn complete_burst(&self, seen: TriggerState) -> bool {
        let TriggerTransition::Changed(mode) = seen.mode.on_event(TriggerEvent::BurstComplete)
        else {
            return false;
        };
        let target = TriggerState {
            mode,
            frame_base: seen.frame_base,
        };
        self.trigger
            .compare_exchange(seen.pack(), target.pack(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Operator selection of a gate mode. Returns the new mode if it changed.
    ///
    /// Selecting a gate mode for the trigger channel is ignored.
    pub fn select_gate(&self, channel: ChannelId, next: GateMode) -> Option<GateMode> {
        if channel == ChannelId::Trigger {
            return None;
        }
        let prev = self.gates[channel.index()].swap(next.to_raw(), Ordering::AcqRel);
        let prev = GateMode::from_raw(prev).unwrap_or(GateMode::Stop);
        let changed = prev.on_select(next);
        if changed.is_some() {
            info!("{channel} mode {prev} -> {next}");
        }
        changed
    }
}
