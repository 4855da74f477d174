use std::sync::Arc;
use log::{debug, warn};

use crate::channel::{SharedChannel, TurnArbiter, TurnPolicy};
use crate::common::types::{ProducerId, Request};
use crate::sim::error::SimulationError;
use crate::sim::trace::{TraceError, TraceReader, TraceRecord, TraceSource};

/// What one replayer sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayStats {
    /// References (Read/Write) put on the channel
    pub sent: u64,
    /// Trace lines dropped as malformed
    pub skipped: u64,
    /// Completed quanta, each ending in a hand-off
    pub handoffs: u64,
}

/// Producer side of the simulation: turns a trace into channel requests.
///
/// The sequence is always CountInit, the references, then Terminate. The two
/// control messages ignore turn arbitration; references are sent in quanta of
/// `quantum`, each started by taking this producer's turn and ended by handing
/// the turn to the peer.
pub struct TraceReplayer {
    producer: ProducerId,
    channel: Arc<SharedChannel>,
    arbiter: Arc<TurnArbiter>,
    quantum: usize,
    policy: TurnPolicy,
}

impl TraceReplayer {
    pub fn new(
        producer: ProducerId,
        channel: Arc<SharedChannel>,
        arbiter: Arc<TurnArbiter>,
        quantum: usize,
        policy: TurnPolicy,
    ) -> Self {
        Self { producer, channel, arbiter, quantum, policy }
    }

    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    /// Replay a whole source
    pub fn run(&self, source: TraceSource) -> Result<ReplayStats, SimulationError> {
        let expected = source.prescan()?;

        match source {
            TraceSource::File(path) => {
                let mut reader = TraceReader::open(&path)?;
                let mut stats = self.replay(expected, &mut reader)?;
                stats.skipped = reader.skipped();
                Ok(stats)
            }
            TraceSource::Memory(records) => self.replay(expected, records.into_iter().map(Ok)),
        }
    }

    /// Send CountInit, every record, then Terminate
    pub fn replay<I>(&self, expected: u64, records: I) -> Result<ReplayStats, SimulationError>
    where
        I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    {
        let producer = self.producer;
        let mut stats = ReplayStats::default();

        self.channel.send(Request::count_init(producer, expected))?;

        let mut in_quantum = 0;
        for record in records {
            let record = record?;

            if in_quantum == 0 {
                self.arbiter.acquire_turn(producer)?;
            }

            self.channel.send(Request::reference(producer, record.page(), record.op))?;
            stats.sent += 1;
            in_quantum += 1;

            if in_quantum == self.quantum {
                self.arbiter.hand_off(producer);
                stats.handoffs += 1;
                in_quantum = 0;
            }
        }

        self.channel.send(Request::terminate(producer))?;

        match self.policy {
            TurnPolicy::Strict if in_quantum > 0 => {
                warn!(
                    "{} finished mid-quantum ({} of {} references); {} is not handed the turn and may stall",
                    producer, in_quantum, self.quantum, producer.peer()
                );
            }
            TurnPolicy::Strict => {}
            TurnPolicy::RetireOnExit => self.arbiter.retire(producer),
        }

        debug!("{} done: {} references, {} hand-offs", producer, stats.sent, stats.handoffs);
        Ok(stats)
    }
}
