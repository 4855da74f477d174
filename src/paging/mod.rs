// FWF paging module

pub mod error;
pub mod page_index;
pub mod engine;

pub use error::PagingError;
pub use page_index::PageIndex;
pub use engine::{AccessOutcome, EngineStats, FlushReason, FlushSummary, Frame, PagingEngine};
