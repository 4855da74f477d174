use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use log::warn;
use thiserror::Error;

use crate::common::types::{page_of, OpKind, PageId, PAGE_SIZE};

/// Why a single trace line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("empty line")]
    Empty,
    #[error("invalid hexadecimal address {0:?}")]
    BadAddress(String),
    #[error("missing operation")]
    MissingOp,
    #[error("unknown operation {0:?}")]
    BadOp(String),
    #[error("line is not valid UTF-8")]
    NotUtf8,
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed trace line {line}: {source}")]
    MalformedLine { line: u64, source: LineError },
}

/// Result type for trace operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// One parsed reference: `<hex address> <R|W>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub address: u64,
    pub op: OpKind,
}

impl TraceRecord {
    pub fn new(address: u64, op: OpKind) -> Self {
        Self { address, op }
    }

    /// Build a record that lands on `page` at offset zero
    pub fn at_page(page: PageId, op: OpKind) -> Self {
        Self { address: page * PAGE_SIZE, op }
    }

    pub fn page(&self) -> PageId {
        page_of(self.address)
    }

    /// Parse one trace line. An optional `0x` prefix is accepted and
    /// anything after the operation is ignored.
    pub fn parse(line: &str) -> std::result::Result<Self, LineError> {
        let mut tokens = line.split_whitespace();

        let address_token = tokens.next().ok_or(LineError::Empty)?;
        let digits = address_token
            .strip_prefix("0x")
            .or_else(|| address_token.strip_prefix("0X"))
            .unwrap_or(address_token);
        let address = u64::from_str_radix(digits, 16)
            .map_err(|_| LineError::BadAddress(address_token.to_string()))?;

        let op = match tokens.next().ok_or(LineError::MissingOp)? {
            "R" => OpKind::Read,
            "W" => OpKind::Write,
            other => return Err(LineError::BadOp(other.to_string())),
        };

        Ok(Self { address, op })
    }
}

/// Parse one raw trace line as read from disk, trailing newline included
pub fn parse_bytes(line: &[u8]) -> std::result::Result<TraceRecord, LineError> {
    let line = std::str::from_utf8(line).map_err(|_| LineError::NotUtf8)?;
    TraceRecord::parse(line)
}

/// Iterates the references of a trace stream.
///
/// Malformed lines, undecodable bytes included, are logged and skipped; only
/// I/O failures are yielded as errors.
pub struct TraceReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_no: u64,
    skipped: u64,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines dropped so far because they did not parse
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
            self.line_no += 1;

            match parse_bytes(&self.buf) {
                Ok(record) => return Some(Ok(record)),
                Err(LineError::Empty) => self.skipped += 1,
                Err(source) => {
                    self.skipped += 1;
                    let err = TraceError::MalformedLine { line: self.line_no, source };
                    warn!("Skipping {}", err);
                }
            }
        }
    }
}

/// Count every line of a trace file, parsable or not
pub fn count_lines(path: impl AsRef<Path>) -> Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Where a replayer gets its references from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceSource {
    File(PathBuf),
    Memory(Vec<TraceRecord>),
}

impl TraceSource {
    /// Expected trace length announced to the dispatcher
    pub fn prescan(&self) -> Result<u64> {
        match self {
            TraceSource::File(path) => count_lines(path),
            TraceSource::Memory(records) => Ok(records.len() as u64),
        }
    }
}
