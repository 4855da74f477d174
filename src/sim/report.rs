use std::fmt;
use serde::Serialize;

use crate::common::types::ProducerId;
use crate::paging::EngineStats;

/// Final statistics for one producer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProducerReport {
    pub producer: ProducerId,
    #[serde(flatten)]
    pub stats: EngineStats,
    pub hit_count: u64,
    /// `None` when the producer sent no references
    pub hit_rate: Option<f64>,
}

impl ProducerReport {
    pub fn new(producer: ProducerId, stats: EngineStats) -> Self {
        Self {
            producer,
            stats,
            hit_count: stats.hit_count(),
            hit_rate: stats.hit_rate(),
        }
    }
}

impl fmt::Display for ProducerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "=== Stats for {} ===", self.producer)?;
        writeln!(f, "Page faults : {}", s.total_pf)?;
        writeln!(f, "Disk reads  : {}", s.disk_reads)?;
        writeln!(f, "Disk writes : {}", s.disk_writes)?;
        writeln!(f, "Peak frames : {}", s.peak_frames)?;
        writeln!(f, "Frames@exit : {}/{}", s.used_frames, s.max_frames)?;
        writeln!(f, "Entries     : {}", s.trace_count)?;
        writeln!(f, "Hits        : {}", self.hit_count)?;
        match self.hit_rate {
            Some(rate) => writeln!(f, "Hit rate    : {:.2}%", rate * 100.0)?,
            None => writeln!(f, "Hit rate    : n/a")?,
        }
        writeln!(f, "Flushes     : {}", s.flush_count)
    }
}

/// Outcome of a completed simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub producers: [ProducerReport; 2],
    /// Every message the dispatcher took off the channel, control messages included
    pub messages: u64,
}

impl SimulationReport {
    pub fn producer(&self, producer: ProducerId) -> &ProducerReport {
        &self.producers[producer.index()]
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.producers {
            writeln!(f, "{}", report)?;
        }
        Ok(())
    }
}
