//! Shared rig for the integration tests.

mod attributes;
mod burst;
mod continuous;
mod lifecycle;

use std::sync::Arc;
use xtrig_common::prelude::*;
use xtrig_engine::attr::ConfigurationInterface;
use xtrig_engine::engine::{Evaluation, PulseEngine};
use xtrig_engine::state::EngineState;
use xtrig_hal::{SimulationDriver, SimulationProbe};

/// Engine plus simulated lines, advanced by hand instead of a tick thread.
pub struct Rig {
    pub state: Arc<EngineState>,
    pub engine: PulseEngine<SimulationDriver>,
    pub probe: SimulationProbe,
    lines: Vec<LineConfig>,
    started: bool,
}

impl Rig {
    pub fn new(config: &GeneratorConfig) -> Self {
        let lines = config.lines().to_vec();
        let mut driver = SimulationDriver::new();
        let probe = driver.probe();
        driver.init(&lines).unwrap();
        let state = Arc::new(EngineState::new(config).unwrap());
        let engine = PulseEngine::new(Arc::clone(&state), driver, &lines);
        Self {
            state,
            engine,
            probe,
            lines,
            started: false,
        }
    }

    /// Config with a 4-tick cycle: 2 ticks exposure, 2 ticks data write.
    pub fn short_cycle() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.params.exposure_us = 2;
        config.params.data_write_us = 2;
        config.timing.dlp_pulse_width_us = 1;
        config
    }

    pub fn interface(&self) -> ConfigurationInterface {
        ConfigurationInterface::new(Arc::clone(&self.state))
    }

    /// Evaluate the next position: the start position on the first call,
    /// one tick later on every following call.
    pub fn next(&mut self) -> Evaluation {
        if self.started {
            self.state
                .schedule
                .advance(self.state.params.cycle_ticks());
        }
        self.started = true;
        self.engine.step()
    }

    /// Evaluate `ticks` positions and count those where `channel`'s line
    /// was physically at its active level.
    pub fn count_active(&mut self, channel: ChannelId, ticks: usize) -> usize {
        (0..ticks)
            .filter(|_| {
                self.next();
                self.is_active(channel)
            })
            .count()
    }

    /// Whether `channel`'s line currently sits at its active level.
    pub fn is_active(&self, channel: ChannelId) -> bool {
        let polarity = self
            .lines
            .iter()
            .find(|l| l.channel == channel)
            .map(|l| l.polarity)
            .unwrap_or_default();
        polarity.is_active(self.probe.level(channel))
    }
}
