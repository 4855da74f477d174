use thiserror::Error;

use crate::channel::ChannelError;
use crate::sim::config::ConfigError;
use crate::sim::trace::TraceError;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Simulation interrupted")]
    Interrupted,

    #[error("{0} panicked")]
    UnitPanicked(String),
}

impl SimulationError {
    /// A unit that only stopped because the channel was closed under it
    pub fn is_closed(&self) -> bool {
        matches!(self, SimulationError::Channel(ChannelError::Closed))
    }
}
