use std::io::Write;
use std::thread;
use std::time::Duration;
use anyhow::Result;

#[path = "../common/mod.rs"]
mod common;
use common::{looping_trace, pages, replay_alone, trace_lines, write_trace_file};

use fwfsim::channel::TurnPolicy;
use fwfsim::common::types::OpKind;
use fwfsim::sim::{NoProgress, ProgressObserver, ProgressSnapshot, TraceError, TraceSource};
use fwfsim::{ProducerId, Simulation, SimulationConfig, SimulationError};

#[derive(Default)]
struct CountingProgress {
    updates: usize,
    finished: bool,
}

impl ProgressObserver for CountingProgress {
    fn observe(&mut self, _snapshot: &ProgressSnapshot) {
        self.updates += 1;
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn test_file_traces_match_standalone_engines() -> Result<()> {
    let first = looping_trace(400, 7);
    let second = looping_trace(400, 13);
    let first_file = write_trace_file(&trace_lines(&first))?;
    let second_file = write_trace_file(&trace_lines(&second))?;

    let config = SimulationConfig::new(3, 16, 10).with_progress_interval(100);
    let simulation = Simulation::new(config)?;
    let mut progress = CountingProgress::default();

    let report = simulation.run(
        [
            TraceSource::File(first_file.path().to_path_buf()),
            TraceSource::File(second_file.path().to_path_buf()),
        ],
        &mut progress,
    )?;

    // Interleaving never changes a producer's own results
    assert_eq!(report.producer(ProducerId::One).stats, replay_alone(&first, 8, 3));
    assert_eq!(report.producer(ProducerId::Two).stats, replay_alone(&second, 8, 3));
    assert_eq!(report.messages, 2 * (400 + 2));
    assert_eq!(progress.updates, 8);
    assert!(progress.finished);
    Ok(())
}

#[test]
fn test_malformed_lines_are_skipped() -> Result<()> {
    let mut lines = trace_lines(&pages(0..4, OpKind::Read));
    lines.insert(1, "garbage".to_string());
    lines.insert(3, "1234 X".to_string());
    let first_file = write_trace_file(&lines)?;
    let second = pages(0..4, OpKind::Write);

    let simulation = Simulation::new(SimulationConfig::new(10, 8, 4))?;
    let report = simulation.run(
        [TraceSource::File(first_file.path().to_path_buf()), TraceSource::Memory(second)],
        &mut NoProgress,
    )?;

    let one = report.producer(ProducerId::One).stats;
    assert_eq!(one.trace_count, 4);
    // Pre-scan counts raw lines, malformed ones included
    assert_eq!(one.total_expected, 6);
    Ok(())
}

#[test]
fn test_undecodable_bytes_are_skipped_not_fatal() -> Result<()> {
    let mut first_file = tempfile::NamedTempFile::new()?;
    first_file.write_all(b"1000 R\n\xff\xfe garbage\n2000 R\n")?;
    first_file.flush()?;
    let second = pages(0..2, OpKind::Write);

    let simulation = Simulation::new(SimulationConfig::new(10, 8, 2))?;
    let report = simulation.run(
        [TraceSource::File(first_file.path().to_path_buf()), TraceSource::Memory(second)],
        &mut NoProgress,
    )?;

    let one = report.producer(ProducerId::One).stats;
    assert_eq!(one.trace_count, 2);
    assert_eq!(one.total_expected, 3);
    Ok(())
}

#[test]
fn test_retire_on_exit_completes_uneven_traces() -> Result<()> {
    let first = pages(0..23, OpKind::Read);
    let second = looping_trace(61, 5);

    let config = SimulationConfig::new(2, 6, 4).with_turn_policy(TurnPolicy::RetireOnExit);
    let report = Simulation::new(config)?.run(
        [TraceSource::Memory(first.clone()), TraceSource::Memory(second.clone())],
        &mut NoProgress,
    )?;

    assert_eq!(report.producer(ProducerId::One).stats, replay_alone(&first, 3, 2));
    assert_eq!(report.producer(ProducerId::Two).stats, replay_alone(&second, 3, 2));
    Ok(())
}

#[test]
fn test_strict_partial_quantum_stalls_until_shutdown() -> Result<()> {
    // Three references with q=2 leave a partial quantum on both sides
    let simulation = Simulation::new(SimulationConfig::new(1, 4, 2))?;
    let shutdown = simulation.shutdown_handle();

    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        shutdown.shutdown();
    });

    let result = simulation.run(
        [
            TraceSource::Memory(pages(0..3, OpKind::Read)),
            TraceSource::Memory(pages(0..3, OpKind::Read)),
        ],
        &mut NoProgress,
    );
    interrupter.join().unwrap();

    assert!(matches!(result, Err(SimulationError::Interrupted)));
    Ok(())
}

#[test]
fn test_missing_trace_file_shuts_down_siblings() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let simulation = Simulation::new(SimulationConfig::new(1, 4, 1))?;

    let result = simulation.run(
        [
            TraceSource::Memory(pages(0..50, OpKind::Read)),
            TraceSource::File(dir.path().join("missing.trace")),
        ],
        &mut NoProgress,
    );

    assert!(matches!(result, Err(SimulationError::Trace(TraceError::Io(_)))));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected_before_start() {
    let result = Simulation::new(SimulationConfig::new(1, 4, 0));
    assert!(matches!(result, Err(SimulationError::Config(_))));

    let result = Simulation::new(SimulationConfig::new(1, 4, 1).with_channel_capacity(0));
    assert!(matches!(result, Err(SimulationError::Config(_))));
}

#[test]
fn test_zero_frames_still_terminates() -> Result<()> {
    let simulation = Simulation::new(SimulationConfig::new(0, 1, 1))?;
    let report = simulation.run(
        [
            TraceSource::Memory(pages(0..5, OpKind::Write)),
            TraceSource::Memory(pages(0..5, OpKind::Read)),
        ],
        &mut NoProgress,
    )?;

    for producer in ProducerId::ALL {
        let stats = report.producer(producer).stats;
        assert_eq!(stats.max_frames, 0);
        assert_eq!(stats.total_pf, 5);
        assert_eq!(stats.disk_reads, 0);
        assert_eq!(report.producer(producer).hit_rate, Some(0.0));
    }
    Ok(())
}
