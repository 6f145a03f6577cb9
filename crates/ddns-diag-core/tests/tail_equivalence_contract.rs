//! Contract Test: Tail Equivalence
//!
//! The backward-scanning tail of a file log must return exactly what a naive
//! full read would: the last N lines, in file order, without terminators.
//!
//! If this test fails, the WAN view shows the wrong history.

mod common;

use common::*;
use ddns_diag_core::model::IpFamily;
use ddns_diag_core::store::FileEventLog;
use ddns_diag_core::traits::EventLog;

fn naive_tail(content: &str, n: usize) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = content.strip_suffix('\n').unwrap_or(content);
    let lines: Vec<&str> = body.split('\n').collect();
    lines[lines.len().saturating_sub(n)..]
        .iter()
        .map(|l| l.to_string())
        .collect()
}

#[tokio::test]
async fn file_tail_matches_full_read() {
    let dir = tempfile::tempdir().unwrap();
    let log = FileEventLog::new(dir.path().join("wanip4.log"), dir.path().join("wanip6.log")).unwrap();

    for i in 0..300u32 {
        let ip = format!("203.0.113.{}", i % 250);
        let reason = "x".repeat((i as usize * 7) % 90);
        log.append(&report("2025-01-09 12:00:00 +1100", &ip, Some(&reason)))
            .await
            .unwrap();
    }

    let content = std::fs::read_to_string(log.path(IpFamily::V4)).unwrap();
    for n in [0, 1, 2, 49, 50, 51, 299, 300, 301, 10_000] {
        let tail = log.tail(IpFamily::V4, n).await.unwrap();
        assert_eq!(tail, naive_tail(&content, n), "tail of {} lines", n);
    }
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let log = FileEventLog::new(dir.path().join("wanip4.log"), dir.path().join("wanip6.log")).unwrap();

    assert!(log.tail(IpFamily::V6, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn file_without_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let v4 = dir.path().join("wanip4.log");
    std::fs::write(&v4, "a\nb\nc").unwrap();

    let log = FileEventLog::new(&v4, dir.path().join("wanip6.log")).unwrap();

    assert_eq!(log.tail(IpFamily::V4, 2).await.unwrap(), vec!["b", "c"]);
    assert_eq!(log.tail(IpFamily::V4, 5).await.unwrap(), vec!["a", "b", "c"]);
}
