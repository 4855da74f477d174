use thiserror::Error;
use crate::common::types::PageId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    #[error("Page index exhausted: no free slot for page {page} in a table of {table_size} slots")]
    ResourceExhausted { page: PageId, table_size: usize },
}

/// Result type for paging operations
pub type Result<T> = std::result::Result<T, PagingError>;
