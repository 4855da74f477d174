#![allow(dead_code)]

use std::io::Write;
use std::ops::Range;
use anyhow::Result;
use tempfile::NamedTempFile;

use fwfsim::common::types::{OpKind, PAGE_SIZE};
use fwfsim::paging::{EngineStats, PagingEngine};
use fwfsim::sim::TraceRecord;
use fwfsim::ProducerId;

// Write raw trace lines to a temporary file
pub fn write_trace_file(lines: &[String]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(file)
}

// Render records in trace syntax, with a non-zero in-page offset
pub fn trace_lines(records: &[TraceRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            let op = if r.op == OpKind::Write { 'W' } else { 'R' };
            format!("{:x} {}", r.address + 0x2a, op)
        })
        .collect()
}

pub fn pages(range: Range<u64>, op: OpKind) -> Vec<TraceRecord> {
    range.map(|p| TraceRecord::at_page(p, op)).collect()
}

// A looping working set with every third reference a write
pub fn looping_trace(len: u64, working_set: u64) -> Vec<TraceRecord> {
    (0..len)
        .map(|i| {
            let op = if i % 3 == 0 { OpKind::Write } else { OpKind::Read };
            TraceRecord::new((i % working_set) * PAGE_SIZE, op)
        })
        .collect()
}

// Replay a trace against a standalone engine; the dispatcher must agree with it
pub fn replay_alone(records: &[TraceRecord], max_frames: usize, k: u64) -> EngineStats {
    let mut engine = PagingEngine::new(ProducerId::One, max_frames, k);
    engine.set_expected(records.len() as u64);
    for record in records {
        engine.access(record.page(), record.op);
    }
    engine.into_stats()
}
