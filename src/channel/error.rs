use thiserror::Error;

/// Error type for channel and permit operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel unavailable: {0}")]
    Unavailable(String),

    #[error("Channel closed")]
    Closed,

    #[error("Invalid channel state: {0}")]
    InvalidState(String),
}

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;
