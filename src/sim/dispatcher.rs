use log::{info, warn};

use crate::channel::{ChannelError, SharedChannel};
use crate::common::types::{OpKind, ProducerId, Request};
use crate::paging::PagingEngine;
use crate::sim::config::SimulationConfig;
use crate::sim::progress::{ProgressObserver, ProgressSnapshot};
use crate::sim::report::{ProducerReport, SimulationReport};

/// Whether the dispatch loop keeps going after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStep {
    Continue,
    /// Both producers have terminated
    Finished,
}

/// Consumer side of the simulation.
///
/// Owns both paging engines; nothing else touches them. Routes each request
/// to the engine of the producer that sent it and stops once each producer
/// has sent its Terminate.
pub struct Dispatcher {
    engines: [PagingEngine; 2],
    terminated: [bool; 2],
    processed: u64,
    received: u64,
    progress_interval: u64,
}

impl Dispatcher {
    pub fn new(config: &SimulationConfig) -> Self {
        let frames = config.frames_per_producer();
        Self {
            engines: ProducerId::ALL.map(|p| PagingEngine::new(p, frames, config.fault_window)),
            terminated: [false; 2],
            processed: 0,
            received: 0,
            progress_interval: config.progress_interval,
        }
    }

    pub fn engine(&self, producer: ProducerId) -> &PagingEngine {
        &self.engines[producer.index()]
    }

    /// References processed across both producers
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn is_terminated(&self, producer: ProducerId) -> bool {
        self.terminated[producer.index()]
    }

    /// Drain the channel until both producers terminate
    pub fn run(
        mut self,
        channel: &SharedChannel,
        observer: &mut dyn ProgressObserver,
    ) -> Result<SimulationReport, ChannelError> {
        info!("Dispatcher ready, waiting for requests");

        loop {
            let request = channel.recv()?;
            if self.handle(request, observer) == DispatchStep::Finished {
                break;
            }
        }

        observer.finish();
        info!("Received termination from both producers after {} messages", self.received);
        Ok(self.into_report())
    }

    /// Apply one request
    pub fn handle(&mut self, request: Request, observer: &mut dyn ProgressObserver) -> DispatchStep {
        self.received += 1;
        let slot = request.producer.index();

        match request.op {
            OpKind::CountInit => {
                self.engines[slot].set_expected(request.page);
            }
            OpKind::Terminate => {
                if self.terminated[slot] {
                    warn!("Ignoring repeated termination from {}", request.producer);
                } else {
                    self.terminated[slot] = true;
                    info!("{} terminated", request.producer);
                }
                if self.terminated.iter().all(|&t| t) {
                    return DispatchStep::Finished;
                }
            }
            OpKind::Read | OpKind::Write => {
                self.engines[slot].access(request.page, request.op);
                self.processed += 1;
                self.report_progress(request.producer, observer);
            }
        }

        DispatchStep::Continue
    }

    /// Final per-producer statistics; the engines are dropped here
    pub fn into_report(self) -> SimulationReport {
        let received = self.received;
        let [first, second] = self.engines;
        SimulationReport {
            producers: [
                ProducerReport::new(ProducerId::One, first.into_stats()),
                ProducerReport::new(ProducerId::Two, second.into_stats()),
            ],
            messages: received,
        }
    }

    fn report_progress(&self, producer: ProducerId, observer: &mut dyn ProgressObserver) {
        let total_expected: u64 = self.engines.iter().map(|e| e.total_expected()).sum();
        if self.progress_interval == 0
            || total_expected == 0
            || self.processed % self.progress_interval != 0
        {
            return;
        }

        let engine = &self.engines[producer.index()];
        observer.observe(&ProgressSnapshot {
            producer,
            processed: engine.trace_count(),
            expected: engine.total_expected(),
            total_processed: self.processed,
            total_expected,
        });
    }
}
