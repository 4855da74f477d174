use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crossbeam::channel::{unbounded, Sender};
use log::{error, info};

use crate::channel::{SharedChannel, TurnArbiter};
use crate::common::types::ProducerId;
use crate::sim::config::SimulationConfig;
use crate::sim::dispatcher::Dispatcher;
use crate::sim::error::SimulationError;
use crate::sim::progress::ProgressObserver;
use crate::sim::replayer::{ReplayStats, TraceReplayer};
use crate::sim::report::SimulationReport;
use crate::sim::trace::TraceSource;

/// One of the three execution units of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dispatcher,
    Replayer(ProducerId),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Dispatcher => write!(f, "dispatcher"),
            Unit::Replayer(producer) => write!(f, "replayer {}", producer),
        }
    }
}

/// Sent to the supervisor when a unit's thread ends, panics included
struct ExitNotice {
    unit: Unit,
    clean: bool,
    tx: Sender<(Unit, bool)>,
}

impl ExitNotice {
    fn new(unit: Unit, tx: Sender<(Unit, bool)>) -> Self {
        Self { unit, clean: false, tx }
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        // The supervisor may already be gone if the scope is unwinding
        let _ = self.tx.send((self.unit, self.clean));
    }
}

/// Stops a running simulation from outside, e.g. from a signal handler
#[derive(Clone)]
pub struct ShutdownHandle {
    channel: Arc<SharedChannel>,
    arbiter: Arc<TurnArbiter>,
    interrupted: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Interrupt the run: every blocked unit wakes up and exits
    pub fn shutdown(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.close_all();
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn close_all(&self) {
        self.channel.close();
        self.arbiter.close();
    }
}

/// Runs the dispatcher and both replayers as supervised threads.
///
/// If any unit fails or panics, or once the dispatcher exits, the channel
/// and arbiter are closed so no sibling stays blocked. All three threads are
/// joined before `run` returns.
pub struct Simulation {
    config: SimulationConfig,
    channel: Arc<SharedChannel>,
    arbiter: Arc<TurnArbiter>,
    interrupted: Arc<AtomicBool>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let channel = Arc::new(SharedChannel::new(config.channel_capacity)?);

        Ok(Self {
            config,
            channel,
            arbiter: Arc::new(TurnArbiter::new()),
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            channel: self.channel.clone(),
            arbiter: self.arbiter.clone(),
            interrupted: self.interrupted.clone(),
        }
    }

    /// Replay `sources[0]` as producer one and `sources[1]` as producer two
    pub fn run(
        self,
        sources: [TraceSource; 2],
        observer: &mut dyn ProgressObserver,
    ) -> Result<SimulationReport, SimulationError> {
        let handle = self.shutdown_handle();
        let dispatcher = Dispatcher::new(&self.config);
        let replayers = ProducerId::ALL.map(|producer| {
            TraceReplayer::new(
                producer,
                self.channel.clone(),
                self.arbiter.clone(),
                self.config.quantum,
                self.config.turn_policy,
            )
        });

        info!(
            "Starting simulation: k={}, {} frames per producer, q={}, channel capacity {}",
            self.config.fault_window,
            self.config.frames_per_producer(),
            self.config.quantum,
            self.channel.capacity()
        );

        let (exit_tx, exit_rx) = unbounded();
        let shared = &self.channel;

        let outcome = crossbeam::thread::scope(|s| {
            let dispatcher_thread = {
                let mut notice = ExitNotice::new(Unit::Dispatcher, exit_tx.clone());
                s.spawn(move |_| {
                    let result = dispatcher.run(shared, observer);
                    notice.clean = result.is_ok();
                    result
                })
            };

            let replay_threads: Vec<_> = replayers
                .into_iter()
                .zip(sources)
                .map(|(replayer, source)| {
                    let unit = Unit::Replayer(replayer.producer());
                    let mut notice = ExitNotice::new(unit, exit_tx.clone());
                    s.spawn(move |_| {
                        let result = replayer.run(source);
                        notice.clean = result.is_ok();
                        result
                    })
                })
                .collect();
            drop(exit_tx);

            // Exits arrive in any order; the sender side of each notice is
            // dropped with its thread, so this loop always terminates.
            while let Ok((unit, clean)) = exit_rx.recv() {
                if !clean {
                    if handle.is_interrupted() {
                        info!("{} stopped by shutdown", unit);
                    } else {
                        error!("{} exited abnormally, shutting down its siblings", unit);
                    }
                    handle.close_all();
                } else if unit == Unit::Dispatcher {
                    handle.close_all();
                }
            }

            let dispatched = dispatcher_thread
                .join()
                .map_err(|_| SimulationError::UnitPanicked(Unit::Dispatcher.to_string()));
            let replayed: Vec<Result<ReplayStats, SimulationError>> = replay_threads
                .into_iter()
                .zip(ProducerId::ALL)
                .map(|(thread, producer)| {
                    thread
                        .join()
                        .map_err(|_| SimulationError::UnitPanicked(Unit::Replayer(producer).to_string()))
                        .and_then(|result| result)
                })
                .collect();
            (dispatched, replayed)
        });

        let (dispatched, replayed) =
            outcome.map_err(|_| SimulationError::UnitPanicked("simulation scope".to_string()))?;

        if handle.is_interrupted() {
            return Err(SimulationError::Interrupted);
        }

        let dispatched = dispatched?;
        for (result, producer) in replayed.into_iter().zip(ProducerId::ALL) {
            match result {
                Ok(stats) => info!(
                    "{} replayed {} references ({} lines skipped, {} hand-offs)",
                    producer, stats.sent, stats.skipped, stats.handoffs
                ),
                Err(e) if !e.is_closed() => return Err(e),
                Err(_) => {}
            }
        }

        let report = dispatched?;
        info!("Simulation finished: {} messages dispatched", report.messages);
        Ok(report)
    }
}
