use std::sync::atomic::{AtomicBool, Ordering};
use log::debug;
use serde::Serialize;

use crate::common::types::ProducerId;
use crate::channel::error::{ChannelError, Result};
use crate::channel::semaphore::Semaphore;

/// What a replayer does with the turn when its trace runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TurnPolicy {
    /// Release nothing. A replayer that ends mid-quantum, or whose peer
    /// still has references left, leaves the peer waiting for a turn that
    /// never comes.
    #[default]
    Strict,
    /// Hand the turn to the peer and stop taking part in arbitration
    RetireOnExit,
}

/// Round-robin hand-off between the two replayers.
///
/// Each producer owns one binary permit; producer one's starts available.
/// A replayer takes its own permit at the start of every quantum and
/// releases its peer's permit once the quantum is complete.
#[derive(Debug)]
pub struct TurnArbiter {
    turns: [Semaphore; 2],
    retired: [AtomicBool; 2],
}

impl TurnArbiter {
    pub fn new() -> Self {
        Self {
            turns: [Semaphore::binary("turn_a", true), Semaphore::binary("turn_b", false)],
            retired: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Block until `producer` holds the turn.
    ///
    /// Returns immediately once the peer has retired.
    pub fn acquire_turn(&self, producer: ProducerId) -> Result<()> {
        let own = &self.turns[producer.index()];
        if self.is_retired(producer.peer()) {
            return if own.is_closed() { Err(ChannelError::Closed) } else { Ok(()) };
        }
        own.acquire()
    }

    /// Give the turn to the peer at the end of a full quantum
    pub fn hand_off(&self, producer: ProducerId) {
        debug!("{} hands the turn to {}", producer, producer.peer());
        self.turns[producer.peer().index()].release();
    }

    /// Withdraw `producer` from arbitration and wake its peer
    pub fn retire(&self, producer: ProducerId) {
        self.retired[producer.index()].store(true, Ordering::SeqCst);
        debug!("{} retires from turn arbitration", producer);
        self.turns[producer.peer().index()].release();
    }

    pub fn is_retired(&self, producer: ProducerId) -> bool {
        self.retired[producer.index()].load(Ordering::SeqCst)
    }

    /// Whether `producer`'s permit could be taken right now
    pub fn has_turn(&self, producer: ProducerId) -> bool {
        self.turns[producer.index()].available_permits() > 0
    }

    /// Fail every pending and future turn wait
    pub fn close(&self) {
        for turn in &self.turns {
            turn.close();
        }
    }
}

impl Default for TurnArbiter {
    fn default() -> Self {
        Self::new()
    }
}
