//! Process-wide engine state shared by the tick source, the pulse engine
//! and the configuration path.

use xtrig_common::channel::ChannelId;
use xtrig_common::generator::GeneratorConfig;

use crate::engine::TickInputs;
use crate::modes::ModeBank;
use crate::params::{ParamError, ParameterStore};
use crate::schedule::ScheduleState;

/// Shared aggregate, held in an `Arc`.
#[derive(Debug)]
pub struct EngineState {
    /// Runtime parameters and derived counters.
    pub params: ParameterStore,
    /// Tick position and ready signal.
    pub schedule: ScheduleState,
    /// Live channel modes.
    pub modes: ModeBank,
}

impl EngineState {
    /// Build the state from a configuration.
    ///
    /// # Errors
    /// Fails if the tick period or a startup value is invalid.
    pub fn new(config: &GeneratorConfig) -> Result<Self, ParamError> {
        Ok(Self {
            params: ParameterStore::new(
                config.timing.tick_period_ns,
                config.timing.dlp_pulse_width_us,
                config.params,
            )?,
            schedule: ScheduleState::new(),
            modes: ModeBank::new(&config.modes),
        })
    }

    /// Everything one evaluation needs, read once.
    #[inline]
    pub fn inputs(&self) -> TickInputs {
        TickInputs {
            position: self.schedule.position(),
            derived: self.params.derived(),
            dlp_ticks: self.params.dlp_ticks(),
            num_frames: self.params.num_frames(),
            trigger: self.modes.trigger_state(),
            dlp: self.modes.gate(ChannelId::DlpTrigger),
            red: self.modes.gate(ChannelId::RedLaser),
            blue: self.modes.gate(ChannelId::BlueLaser),
        }
    }
}
