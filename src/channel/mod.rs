// Request channel and turn arbitration between the two replayers

pub mod error;
pub mod semaphore;
pub mod shared;
pub mod turn;

pub use error::ChannelError;
pub use semaphore::Semaphore;
pub use shared::SharedChannel;
pub use turn::{TurnArbiter, TurnPolicy};
