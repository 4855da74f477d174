// fwfsim: two-workload paging simulator

pub mod common;
pub mod paging;
pub mod channel;
pub mod sim;

// Re-export key items for convenient access
pub use common::types::{OpKind, ProducerId, Request, PAGE_SIZE, DEFAULT_CHANNEL_CAPACITY};
pub use paging::{PageIndex, PagingEngine, PagingError};
pub use channel::{ChannelError, SharedChannel, TurnArbiter, TurnPolicy};
pub use sim::{Simulation, SimulationConfig, SimulationError, SimulationReport, TraceSource};
