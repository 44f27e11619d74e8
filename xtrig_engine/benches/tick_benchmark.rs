//! Tick path benchmark - cost of one tick on the tick and engine threads.
//!
//! The engine must finish a step well inside one tick period (1 µs by
//! default). Measures the pure evaluation per trigger mode, a full engine
//! step with change-only writes, and the tick-side schedule advance.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use xtrig_common::channel::{ChannelId, Level};
use xtrig_common::generator::GeneratorConfig;
use xtrig_common::mode::{GateMode, TriggerMode};
use xtrig_common::output::OutputSink;
use xtrig_engine::engine::{PulseEngine, evaluate};
use xtrig_engine::state::EngineState;

/// Sink that only counts writes.
#[derive(Default)]
struct CountingSink {
    writes: u64,
}

impl OutputSink for CountingSink {
    #[inline]
    fn set_level(&mut self, _channel: ChannelId, _level: Level) {
        self.writes += 1;
    }
}

fn state_with(trigger: TriggerMode) -> (GeneratorConfig, Arc<EngineState>) {
    let mut config = GeneratorConfig::default();
    config.modes.trigger = trigger;
    config.modes.dlp_trigger = GateMode::Start;
    config.modes.red_laser = GateMode::Start;
    config.modes.blue_laser = GateMode::Start;
    let state = Arc::new(EngineState::new(&config).expect("default config is valid"));
    (config, state)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.significance_level(0.01);
    group.sample_size(500);

    for trigger in [TriggerMode::Off, TriggerMode::Continuous, TriggerMode::Once] {
        let (_, state) = state_with(trigger);
        let cycle_ticks = state.params.cycle_ticks();

        group.bench_with_input(
            BenchmarkId::new("trigger", trigger),
            &trigger,
            |b, _| {
                b.iter(|| {
                    state.schedule.advance(cycle_ticks);
                    black_box(evaluate(black_box(&state.inputs())))
                });
            },
        );
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let (config, state) = state_with(TriggerMode::Continuous);
    let lines = config.lines();
    let mut engine = PulseEngine::new(Arc::clone(&state), CountingSink::default(), &lines);
    let cycle_ticks = state.params.cycle_ticks();

    c.bench_function("engine_step", |b| {
        b.iter(|| {
            state.schedule.advance(cycle_ticks);
            black_box(engine.step())
        });
    });
}

fn bench_advance(c: &mut Criterion) {
    let (_, state) = state_with(TriggerMode::Continuous);

    c.bench_function("schedule_advance", |b| {
        b.iter(|| {
            state.schedule.advance(black_box(state.params.cycle_ticks()));
            black_box(state.schedule.ready().take())
        });
    });
}

criterion_group!(benches, bench_evaluate, bench_step, bench_advance);
criterion_main!(benches);
