//! Fault injection at the input side of the pipeline

use super::naive_count;
use ruwc::{CountConfig, DelimiterCounter, RuwcError, ShutdownPolicy, Strategy};
use std::io::{self, Read};
use std::time::Duration;

/// Types of faults the injected reader can produce
#[derive(Debug, Clone, Copy)]
enum Fault {
    /// Fail permanently once this many bytes were served
    FailAfter(usize),
    /// Return `Interrupted` before every n-th read
    InterruptEvery(usize),
    /// Serve at most this many bytes per read
    ShortReads(usize),
    /// Sleep before each read
    Slow(Duration),
}

/// Reader over fixed data that misbehaves according to a [`Fault`]
struct FaultyReader {
    data: Vec<u8>,
    pos: usize,
    reads: usize,
    fault: Fault,
}

impl FaultyReader {
    fn new(data: Vec<u8>, fault: Fault) -> Self {
        Self {
            data,
            pos: 0,
            reads: 0,
            fault,
        }
    }
}

impl Read for FaultyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let mut limit = buf.len();

        match self.fault {
            Fault::FailAfter(n) => {
                if self.pos >= n {
                    return Err(io::Error::new(io::ErrorKind::Other, "injected device failure"));
                }
                limit = limit.min(n - self.pos);
            }
            Fault::InterruptEvery(n) => {
                if self.reads % n == 0 {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "injected signal"));
                }
            }
            Fault::ShortReads(n) => limit = limit.min(n),
            Fault::Slow(delay) => std::thread::sleep(delay),
        }

        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(limit);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

fn sample_data() -> Vec<u8> {
    (0..50_000u32).map(|i| if i % 10 == 9 { b'\n' } else { b'z' }).collect()
}

fn counter(strategy: Strategy, shutdown: ShutdownPolicy) -> DelimiterCounter {
    DelimiterCounter::new(
        CountConfig::new()
            .with_workers(3)
            .with_buffer_capacity(512)
            .with_strategy(strategy)
            .with_shutdown(shutdown)
            .with_poll_interval(Duration::from_micros(200)),
    )
    .unwrap()
}

#[test]
fn test_read_failure_keeps_partial_count() {
    let data = sample_data();
    let fail_at = 20_000;
    let counted_before_failure = naive_count(&data[..fail_at]);

    for strategy in [Strategy::Channel, Strategy::Polling] {
        let report = counter(strategy, ShutdownPolicy::Drain)
            .count_reader(FaultyReader::new(data.clone(), Fault::FailAfter(fail_at)))
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.total, counted_before_failure, "strategy {}", strategy);
        assert_eq!(report.stats.bytes_read, fail_at as u64);

        let err = report.error.expect("read failure is reported");
        assert!(
            matches!(err, RuwcError::Read { bytes_read, .. } if bytes_read == fail_at as u64),
            "unexpected error: {:?}",
            err
        );
        assert_eq!(err.exit_code(), 74);
        assert_eq!(err.category(), "read");
    }
}

#[test]
fn test_read_failure_best_effort_never_overcounts() {
    let data = sample_data();
    let fail_at = 30_000;
    let true_count = naive_count(&data[..fail_at]);

    for strategy in [Strategy::Channel, Strategy::Polling] {
        let report = counter(strategy, ShutdownPolicy::BestEffort)
            .count_reader(FaultyReader::new(data.clone(), Fault::FailAfter(fail_at)))
            .unwrap();

        assert!(report.total <= true_count);
        assert!(matches!(report.error, Some(RuwcError::Read { .. })));
    }
}

#[test]
fn test_failure_before_any_data() {
    let report = counter(Strategy::Channel, ShutdownPolicy::Drain)
        .count_reader(FaultyReader::new(sample_data(), Fault::FailAfter(0)))
        .unwrap();

    assert_eq!(report.total, 0);
    assert_eq!(report.stats.units_filled, 0);
    let err = report.into_result().unwrap_err();
    assert!(matches!(err, RuwcError::Read { bytes_read: 0, .. }));
}

#[test]
fn test_interrupted_reads_are_retried() {
    let data = sample_data();
    let expected = naive_count(&data);

    for strategy in [Strategy::Channel, Strategy::Polling] {
        let report = counter(strategy, ShutdownPolicy::Drain)
            .count_reader(FaultyReader::new(data.clone(), Fault::InterruptEvery(3)))
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.total, expected);
    }
}

#[test]
fn test_short_reads_fill_partial_units() {
    let data = sample_data();
    let report = counter(Strategy::Channel, ShutdownPolicy::Drain)
        .count_reader(FaultyReader::new(data.clone(), Fault::ShortReads(37)))
        .unwrap();

    assert_eq!(report.total, naive_count(&data));
    // One unit per read: short reads are not topped up
    assert_eq!(report.stats.units_filled, (data.len() as u64 + 36) / 37);
}

#[test]
fn test_slow_producer_starves_workers() {
    let data = b"slow\n".repeat(40);
    let report = counter(Strategy::Polling, ShutdownPolicy::Drain)
        .count_reader(FaultyReader::new(data.clone(), Fault::Slow(Duration::from_millis(2))))
        .unwrap();

    assert_eq!(report.total, 40);
    assert!(report.stats.starving > Duration::ZERO);
}
