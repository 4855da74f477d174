// Simulation units and the supervisor that runs them

pub mod config;
pub mod error;
pub mod trace;
pub mod replayer;
pub mod dispatcher;
pub mod progress;
pub mod report;
pub mod supervisor;

pub use config::{ConfigError, SimulationConfig};
pub use error::SimulationError;
pub use trace::{TraceError, TraceReader, TraceRecord, TraceSource};
pub use replayer::{ReplayStats, TraceReplayer};
pub use dispatcher::{DispatchStep, Dispatcher};
pub use progress::{NoProgress, ProgressObserver, ProgressSnapshot, TextProgress};
pub use report::{ProducerReport, SimulationReport};
pub use supervisor::{ShutdownHandle, Simulation, Unit};
