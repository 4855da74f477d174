use serde::Serialize;
use thiserror::Error;

use crate::channel::TurnPolicy;
use crate::common::types::DEFAULT_CHANNEL_CAPACITY;

/// Rejected startup parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationConfig {
    /// Faults tolerated since the last flush before the next one flushes (k)
    pub fault_window: u64,

    /// Frames shared by both producers, split evenly by floor division
    pub total_frames: usize,

    /// References a replayer may send per turn (q)
    pub quantum: usize,

    /// Slots in the request channel
    pub channel_capacity: usize,

    /// Processed references between progress snapshots, 0 disables them
    pub progress_interval: u64,

    /// Turn behavior of a replayer whose trace has ended
    pub turn_policy: TurnPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fault_window: 0,
            total_frames: 0,
            quantum: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            progress_interval: 20_000,
            turn_policy: TurnPolicy::Strict,
        }
    }
}

impl SimulationConfig {
    pub fn new(fault_window: u64, total_frames: usize, quantum: usize) -> Self {
        Self {
            fault_window,
            total_frames,
            quantum,
            ..Self::default()
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_turn_policy(mut self, policy: TurnPolicy) -> Self {
        self.turn_policy = policy;
        self
    }

    /// Frames owned by each producer's engine
    pub fn frames_per_producer(&self) -> usize {
        self.total_frames / 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantum == 0 {
            return Err(ConfigError::InvalidArgument(
                "turn quantum q must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidArgument(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_split_with_floor_division() {
        assert_eq!(SimulationConfig::new(3, 9, 5).frames_per_producer(), 4);
        assert_eq!(SimulationConfig::new(3, 1, 5).frames_per_producer(), 0);
    }

    #[test]
    fn test_zero_quantum_rejected() {
        let config = SimulationConfig::new(1, 4, 0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SimulationConfig::new(1, 4, 2).with_channel_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = SimulationConfig::new(2, 10, 4)
            .with_channel_capacity(8)
            .with_progress_interval(0)
            .with_turn_policy(TurnPolicy::RetireOnExit);
        assert!(config.validate().is_ok());
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.progress_interval, 0);
        assert_eq!(config.turn_policy, TurnPolicy::RetireOnExit);
    }
}
