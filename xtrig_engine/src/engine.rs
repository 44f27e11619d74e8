//! Pulse engine: per-tick channel evaluation.
//!
//! [`evaluate`] is a pure function of one [`TickInputs`] snapshot. The
//! [`PulseEngine`] wraps it with the side effects: polarity mapping,
//! change-only writes to the [`OutputSink`] and the Once→Off edge.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};
use xtrig_common::channel::{ChannelId, ChannelSet, Level, Polarity};
use xtrig_common::consts::CHANNEL_COUNT;
use xtrig_common::generator::WaitStrategy;
use xtrig_common::mode::{GateMode, TriggerMode};
use xtrig_common::output::{LineConfig, OutputSink};

use crate::modes::TriggerState;
use crate::params::DerivedCounters;
use crate::schedule::SchedulePosition;
use crate::state::EngineState;

// ─── Evaluation ─────────────────────────────────────────────────────

/// Inputs of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInputs {
    /// Schedule position.
    pub position: SchedulePosition,
    /// Cycle and exposure length.
    pub derived: DerivedCounters,
    /// DLP window length.
    pub dlp_ticks: u32,
    /// Once burst length.
    pub num_frames: u32,
    /// Trigger mode and burst baseline.
    pub trigger: TriggerState,
    /// DLP gate.
    pub dlp: GateMode,
    /// Red laser gate.
    pub red: GateMode,
    /// Blue laser gate.
    pub blue: GateMode,
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Channels that are logically active.
    pub active: ChannelSet,
    /// Set when the Once burst has counted all its frames and the
    /// trigger must leave Once.
    pub burst_complete: bool,
}

/// Decide every channel's logical state for one tick.
#[inline]
pub fn evaluate(inputs: &TickInputs) -> Evaluation {
    let tick = inputs.position.tick_in_cycle;
    let in_exposure = tick < inputs.derived.exposure_ticks;
    let mut active = ChannelSet::empty();
    let mut burst_complete = false;

    if inputs.dlp.is_started() && tick < inputs.dlp_ticks {
        active |= ChannelSet::DLP_TRIGGER;
    }
    if inputs.red.is_started() && in_exposure {
        active |= ChannelSet::RED_LASER;
    }
    if inputs.blue.is_started() && in_exposure {
        active |= ChannelSet::BLUE_LASER;
    }

    if in_exposure {
        let trigger_on = match inputs.trigger.mode {
            TriggerMode::Off => false,
            TriggerMode::Continuous => true,
            TriggerMode::Once => match inputs.trigger.frame_index(inputs.position) {
                None => false,
                Some(frame) if frame < inputs.num_frames => true,
                Some(_) => {
                    burst_complete = true;
                    false
                }
            },
        };
        if trigger_on {
            active |= ChannelSet::TRIGGER;
        }
    }

    Evaluation {
        active,
        burst_complete,
    }
}

// ─── Channels ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Channel {
    id: ChannelId,
    polarity: Polarity,
    /// `None` until the first write.
    last: Option<Level>,
}

impl Channel {
    /// Level to write, if it differs from the last one.
    #[inline]
    fn update(&mut self, active: bool) -> Option<Level> {
        let level = self.polarity.level(active);
        if self.last == Some(level) {
            return None;
        }
        self.last = Some(level);
        Some(level)
    }
}

/// Engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Evaluations performed.
    pub evaluations: u64,
    /// Level writes forwarded to the sink.
    pub writes: u64,
    /// Once bursts retired.
    pub bursts_completed: u64,
}

// ─── PulseEngine ────────────────────────────────────────────────────

/// Consumer side of the schedule. Sole writer of the output levels.
pub struct PulseEngine<S: OutputSink> {
    state: Arc<EngineState>,
    sink: S,
    channels: [Channel; CHANNEL_COUNT],
    stats: EngineStats,
}

impl<S: OutputSink> PulseEngine<S> {
    /// Create an engine writing through `sink`.
    ///
    /// Lines are matched to channels by id; channels without a line
    /// default to active-high.
    pub fn new(state: Arc<EngineState>, sink: S, lines: &[LineConfig]) -> Self {
        let channels = ChannelId::ALL.map(|id| Channel {
            id,
            polarity: lines
                .iter()
                .find(|l| l.channel == id)
                .map(|l| l.polarity)
                .unwrap_or_default(),
            last: None,
        });
        Self {
            state,
            sink,
            channels,
            stats: EngineStats::default(),
        }
    }

    /// Evaluate the current position and write changed levels.
    pub fn step(&mut self) -> Evaluation {
        let inputs = self.state.inputs();
        let eval = evaluate(&inputs);
        self.stats.evaluations += 1;

        for ch in &mut self.channels {
            if let Some(level) = ch.update(eval.active.has(ch.id)) {
                self.sink.set_level(ch.id, level);
                self.stats.writes += 1;
            }
        }

        if eval.burst_complete && self.state.modes.complete_burst(inputs.trigger) {
            self.stats.bursts_completed += 1;
            info!(
                "Once burst of {} frames complete, trigger latched off",
                inputs.num_frames
            );
        }
        eval
    }

    /// Step if a tick is pending. Returns whether a step was taken.
    #[inline]
    pub fn service(&mut self) -> bool {
        // Taken before evaluating so a tick landing mid-step is not lost.
        if self.state.schedule.ready().take() {
            self.step();
            true
        } else {
            false
        }
    }

    /// Engine loop: evaluate the initial position, then once per tick
    /// until `running` goes false.
    pub fn run(&mut self, strategy: WaitStrategy, running: &AtomicBool) {
        let state = Arc::clone(&self.state);
        let ready = state.schedule.ready();
        if strategy == WaitStrategy::Park && ready.register_consumer() {
            debug!("replaced a stale ready-signal consumer");
        }
        info!("Pulse engine running ({strategy:?} wait)");

        self.step();
        while ready.wait(strategy, running) {
            self.step();
        }
        if strategy == WaitStrategy::Park {
            ready.clear_consumer();
        }
        info!(
            "Pulse engine stopped after {} evaluations, {} writes",
            self.stats.evaluations, self.stats.writes
        );
    }

    /// Drive every channel to its inactive level, unconditionally.
    pub fn force_inactive(&mut self) {
        for ch in &mut self.channels {
            let level = ch.polarity.inactive();
            ch.last = Some(level);
            self.sink.set_level(ch.id, level);
        }
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Last written level of `channel`.
    pub fn level(&self, channel: ChannelId) -> Option<Level> {
        self.channels[channel.index()].last
    }

    /// Shared state handle.
    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Recover the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
