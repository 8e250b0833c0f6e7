//! LogRing tests

use crate::{LogKind, LogRing, LogSet};

#[test]
fn test_sequence_numbers_match_append_order() {
    let ring = LogRing::new("test", 16);
    assert!(ring.append(-1));
    assert!(ring.append(4));
    assert!(ring.append(7));

    let mut out = String::new();
    assert_eq!(ring.drain_to_text(&mut out, 4096), 3);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("sequence=0") && lines[0].ends_with("bytes=-1"));
    assert!(lines[1].contains("sequence=1") && lines[1].ends_with("bytes=4"));
    assert!(lines[2].contains("sequence=2") && lines[2].ends_with("bytes=7"));
}

#[test]
fn test_full_ring_rejects_and_counts_loss() {
    let ring = LogRing::new("test", 2);
    assert!(ring.append(-1));
    assert!(ring.append(-1));
    assert!(!ring.append(-1));
    assert!(!ring.append(-1));

    assert_eq!(ring.len(), 2);
    assert_eq!(ring.lost(), 2);

    // sequence numbers are not consumed by rejected appends
    let mut out = String::new();
    ring.drain_to_text(&mut out, 4096);
    assert!(out.contains("sequence=0"));
    assert!(out.contains("sequence=1"));
}

#[test]
fn test_drain_is_destructive() {
    let ring = LogRing::new("test", 8);
    ring.append(1);
    ring.append(2);

    let mut out = String::new();
    assert_eq!(ring.drain_to_text(&mut out, 4096), 2);
    assert!(ring.is_empty());

    // a second read of an empty ring yields nothing, not an error
    let mut again = String::new();
    assert_eq!(ring.drain_to_text(&mut again, 4096), 0);
    assert!(again.is_empty());
}

#[test]
fn test_record_that_does_not_fit_is_dropped_not_requeued() {
    let ring = LogRing::new("test", 8);
    ring.append(-1);
    ring.append(-1);
    ring.append(-1);

    // budget for exactly one formatted line: the second record is popped,
    // found not to fit, and dropped; the third stays queued
    let mut probe = String::new();
    let probe_ring = LogRing::new("probe", 1);
    probe_ring.append(-1);
    probe_ring.drain_to_text(&mut probe, 4096);
    let line_len = probe.len();

    let mut out = String::new();
    let emitted = ring.drain_to_text(&mut out, line_len);
    assert_eq!(emitted, 1);
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.lost(), 1);
}

#[test]
fn test_zero_budget_emits_nothing_but_consumes_one() {
    let ring = LogRing::new("test", 4);
    ring.append(-1);
    ring.append(-1);

    let mut out = String::new();
    assert_eq!(ring.drain_to_text(&mut out, 0), 0);
    assert!(out.is_empty());
    // current contract: the record that failed to fit is gone
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.lost(), 1);
}

#[test]
fn test_log_set_rings_are_independent() {
    let logs = LogSet::with_capacity(4);
    logs.interrupt.append(-1);
    logs.interrupt.append(-1);
    logs.drain_end.append(16);

    assert_eq!(logs.ring(LogKind::Interrupt).len(), 2);
    assert_eq!(logs.ring(LogKind::DrainStart).len(), 0);
    assert_eq!(logs.ring(LogKind::DrainEnd).len(), 1);

    // sequences are scoped per ring
    let mut out = String::new();
    logs.drain_end.drain_to_text(&mut out, 4096);
    assert!(out.contains("sequence=0"));
}

#[test]
fn test_line_format() {
    let ring = LogRing::new("test", 4);
    ring.append(42);

    let mut out = String::new();
    ring.drain_to_text(&mut out, 4096);
    // "[<rfc3339 timestamp>] sequence=<n> bytes=<b>\n"
    assert!(out.starts_with('['));
    assert!(out.contains("] sequence=0 bytes=42"));
    assert!(out.ends_with('\n'));
}
