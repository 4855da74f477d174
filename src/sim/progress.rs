use std::io::{self, Write};
use log::debug;

use crate::common::types::ProducerId;

/// Read-only view of dispatcher progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Producer whose reference triggered the snapshot
    pub producer: ProducerId,
    /// References processed for that producer
    pub processed: u64,
    /// Trace length that producer announced
    pub expected: u64,
    pub total_processed: u64,
    pub total_expected: u64,
}

impl ProgressSnapshot {
    /// Completed fraction of both traces, clamped to 1.0
    pub fn fraction(&self) -> f64 {
        if self.total_expected == 0 {
            return 0.0;
        }
        (self.total_processed as f64 / self.total_expected as f64).min(1.0)
    }
}

/// Receives progress from the dispatcher thread
pub trait ProgressObserver: Send {
    fn observe(&mut self, snapshot: &ProgressSnapshot);

    /// Called once when the dispatcher leaves its loop
    fn finish(&mut self) {}
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn observe(&mut self, _snapshot: &ProgressSnapshot) {}
}

/// Single-line text progress bar: `\rProcessing [=====>     ]  42%`
pub struct TextProgress<W: Write + Send> {
    out: W,
    label: String,
    width: usize,
    drawn: bool,
}

impl<W: Write + Send> TextProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label: "Processing".to_string(),
            width: 40,
            drawn: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, fraction: f64) -> io::Result<()> {
        let pos = (self.width as f64 * fraction) as usize;
        let bar: String = (0..self.width)
            .map(|i| match i.cmp(&pos) {
                std::cmp::Ordering::Less => '=',
                std::cmp::Ordering::Equal => '>',
                std::cmp::Ordering::Greater => ' ',
            })
            .collect();

        write!(self.out, "\r{} [{}] {:3}%", self.label, bar, (fraction * 100.0) as u32)?;
        self.out.flush()
    }
}

impl TextProgress<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ProgressObserver for TextProgress<W> {
    fn observe(&mut self, snapshot: &ProgressSnapshot) {
        match self.render(snapshot.fraction()) {
            Ok(()) => self.drawn = true,
            Err(e) => debug!("Progress output failed: {}", e),
        }
    }

    fn finish(&mut self) {
        if self.drawn {
            if let Err(e) = writeln!(self.out) {
                debug!("Progress output failed: {}", e);
            }
        }
    }
}
