use log::{debug, error};
use serde::Serialize;

use crate::common::types::{FrameId, OpKind, PageId, ProducerId};
use crate::paging::page_index::PageIndex;

/// One slot of a producer's simulated physical memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub page: PageId,
    pub dirty: bool,
    pub valid: bool,
}

/// Why a fault emptied the resident set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// More than `k` faults since the last flush
    WindowExceeded,
    /// Every frame was in use
    FramesExhausted,
}

/// Result of a single reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit { frame: FrameId },
    /// `frame` is `None` only when the engine owns no frames at all
    Fault { frame: Option<FrameId>, flush: Option<FlushReason> },
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessOutcome::Hit { .. })
    }
}

/// What a flush discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushSummary {
    pub cleared: usize,
    pub written: usize,
}

/// Point-in-time copy of an engine's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineStats {
    pub max_frames: usize,
    pub used_frames: usize,
    pub peak_frames: usize,
    pub trace_count: u64,
    pub pf_count: u64,
    pub total_pf: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    pub flush_count: u64,
    pub total_expected: u64,
}

impl EngineStats {
    pub fn hit_count(&self) -> u64 {
        self.trace_count.saturating_sub(self.total_pf)
    }

    /// Fraction of references that hit, `None` before the first reference
    pub fn hit_rate(&self) -> Option<f64> {
        if self.trace_count == 0 {
            None
        } else {
            Some(self.hit_count() as f64 / self.trace_count as f64)
        }
    }
}

/// Per-producer simulated memory running the flush-window-full (FWF) policy.
///
/// On a miss the engine counts a fault and, once more than `fault_window`
/// faults have accumulated since the last flush (or when no frame is free),
/// discards the whole resident set before loading the page into the
/// lowest-numbered free frame.
#[derive(Debug)]
pub struct PagingEngine {
    producer: ProducerId,
    fault_window: u64,
    frames: Vec<Frame>,
    index: PageIndex,
    used_frames: usize,
    peak_frames: usize,
    trace_count: u64,
    pf_count: u64,
    total_pf: u64,
    disk_reads: u64,
    disk_writes: u64,
    flush_count: u64,
    total_expected: u64,
}

impl PagingEngine {
    pub fn new(producer: ProducerId, max_frames: usize, fault_window: u64) -> Self {
        Self {
            producer,
            fault_window,
            frames: vec![Frame::default(); max_frames],
            index: PageIndex::new(max_frames),
            used_frames: 0,
            peak_frames: 0,
            trace_count: 0,
            pf_count: 0,
            total_pf: 0,
            disk_reads: 0,
            disk_writes: 0,
            flush_count: 0,
            total_expected: 0,
        }
    }

    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    pub fn max_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn used_frames(&self) -> usize {
        self.used_frames
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn trace_count(&self) -> u64 {
        self.trace_count
    }

    pub fn total_expected(&self) -> u64 {
        self.total_expected
    }

    /// Record the trace length announced by the producer
    pub fn set_expected(&mut self, total_expected: u64) {
        self.total_expected = total_expected;
    }

    /// Whether `page` is currently resident
    pub fn is_resident(&self, page: PageId) -> bool {
        self.index.lookup(page).is_some()
    }

    /// Apply one reference to the simulated memory
    pub fn access(&mut self, page: PageId, op: OpKind) -> AccessOutcome {
        self.trace_count += 1;

        if let Some(frame) = self.index.lookup(page) {
            if op.is_write() {
                self.frames[frame].dirty = true;
            }
            return AccessOutcome::Hit { frame };
        }

        self.total_pf += 1;
        self.pf_count += 1;

        let flush = if self.pf_count > self.fault_window {
            Some(FlushReason::WindowExceeded)
        } else if self.used_frames >= self.frames.len() {
            Some(FlushReason::FramesExhausted)
        } else {
            None
        };
        if flush.is_some() {
            self.flush();
        }

        let frame = self.load(page, op);
        AccessOutcome::Fault { frame, flush }
    }

    /// Discard the whole resident set, counting a disk write per dirty frame
    pub fn flush(&mut self) -> FlushSummary {
        let mut summary = FlushSummary::default();

        for frame in self.frames.iter_mut() {
            if frame.valid {
                summary.cleared += 1;
                if frame.dirty {
                    summary.written += 1;
                }
            }
            frame.valid = false;
            frame.dirty = false;
        }

        self.disk_writes += summary.written as u64;
        self.index.clear();
        self.used_frames = 0;
        self.pf_count = 0;
        self.flush_count += 1;

        debug!(
            "Flush: {} cleared {} frames, wrote {} dirty pages",
            self.producer, summary.cleared, summary.written
        );
        summary
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            max_frames: self.frames.len(),
            used_frames: self.used_frames,
            peak_frames: self.peak_frames,
            trace_count: self.trace_count,
            pf_count: self.pf_count,
            total_pf: self.total_pf,
            disk_reads: self.disk_reads,
            disk_writes: self.disk_writes,
            flush_count: self.flush_count,
            total_expected: self.total_expected,
        }
    }

    /// Final counters; the frame array and index are released here
    pub fn into_stats(self) -> EngineStats {
        self.stats()
    }

    /// Load `page` into the lowest-numbered free frame
    fn load(&mut self, page: PageId, op: OpKind) -> Option<FrameId> {
        let frame_id = self.frames.iter().position(|f| !f.valid)?;

        self.frames[frame_id] = Frame {
            page,
            dirty: op.is_write(),
            valid: true,
        };
        self.used_frames += 1;
        self.peak_frames = self.peak_frames.max(self.used_frames);
        self.disk_reads += 1;

        if let Err(e) = self.index.insert(page, frame_id) {
            // The frame stays loaded but unindexed; the next reference to the
            // page faults again.
            error!("{}: {}", self.producer, e);
        }

        Some(frame_id)
    }
}
