use std::fmt;
use serde::Serialize;

/// Page size in bytes (4KB); the low 12 bits of a trace address are the in-page offset
pub const PAGE_SIZE: u64 = 4096;

/// Reference sizing of the shared request channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Page number type
pub type PageId = u64;

/// Index of a frame inside one producer's frame array
pub type FrameId = usize;

/// Identity of one of the two trace producers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProducerId {
    One,
    Two,
}

impl ProducerId {
    pub const ALL: [ProducerId; 2] = [ProducerId::One, ProducerId::Two];

    /// Zero-based slot used to index per-producer arrays
    pub fn index(self) -> usize {
        match self {
            ProducerId::One => 0,
            ProducerId::Two => 1,
        }
    }

    /// The one-based number used on the wire and in reports
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn peer(self) -> ProducerId {
        match self {
            ProducerId::One => ProducerId::Two,
            ProducerId::Two => ProducerId::One,
        }
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PM{}", self.number())
    }
}

/// Kind of message carried on the request channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpKind {
    Read,
    Write,
    /// Carries the expected trace length in the page field
    CountInit,
    Terminate,
}

impl OpKind {
    pub fn is_write(self) -> bool {
        self == OpKind::Write
    }

    /// Read and Write are references; the other two are control messages
    pub fn is_reference(self) -> bool {
        matches!(self, OpKind::Read | OpKind::Write)
    }
}

/// A single message travelling from a replayer to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub producer: ProducerId,
    pub page: PageId,
    pub op: OpKind,
}

impl Request {
    pub fn reference(producer: ProducerId, page: PageId, op: OpKind) -> Self {
        Self { producer, page, op }
    }

    pub fn count_init(producer: ProducerId, lines: u64) -> Self {
        Self { producer, page: lines, op: OpKind::CountInit }
    }

    pub fn terminate(producer: ProducerId) -> Self {
        Self { producer, page: 0, op: OpKind::Terminate }
    }
}

/// Translate a raw trace address into its page number
pub fn page_of(address: u64) -> PageId {
    address / PAGE_SIZE
}
