//! WAN IP timeline
//!
//! Turns a chronological tail of reports into "held for X until changed to Y"
//! rows. With reports A, B, C the rows are, most recent first:
//!
//! ```text
//! now   C held for (now - C)
//! C     B held for (C - B), changed to C
//! B     A held for (B - A), changed to B
//! A     changed to A (previous address outside the window)
//! ```

use chrono::{DateTime, Duration, FixedOffset};
use std::net::IpAddr;

use crate::model::IpReport;

/// One interval of the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    /// When the address changed; the render time for the open row
    pub changed_at: DateTime<FixedOffset>,
    /// Address that was held until `changed_at` (unknown for the oldest row)
    pub ip: Option<IpAddr>,
    /// How long `ip` was held
    pub held_for: Option<Duration>,
    /// Address reported at `changed_at`; absent for the open row
    pub next_ip: Option<IpAddr>,
    /// Reason reported with the change
    pub reason: Option<String>,
    /// Whether this is the synthetic "held until now" row
    pub is_open: bool,
}

/// Build the timeline for `reports` (oldest first), most recent row first
///
/// Returns no rows for an empty tail.
pub fn build_timeline(reports: &[IpReport], now: DateTime<FixedOffset>) -> Vec<TimelineRow> {
    let Some(last) = reports.last() else {
        return Vec::new();
    };

    let mut rows = Vec::with_capacity(reports.len() + 1);
    let mut previous: Option<&IpReport> = None;

    for report in reports {
        rows.push(TimelineRow {
            changed_at: report.timestamp,
            ip: previous.map(|p| p.address),
            held_for: previous.map(|p| report.timestamp.signed_duration_since(p.timestamp)),
            next_ip: Some(report.address),
            reason: report.reason.clone(),
            is_open: false,
        });
        previous = Some(report);
    }

    rows.push(TimelineRow {
        changed_at: now,
        ip: Some(last.address),
        held_for: Some(now.signed_duration_since(last.timestamp)),
        next_ip: None,
        reason: None,
        is_open: true,
    });

    rows.reverse();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn report(ts: &str, ip: &str, reason: &str) -> IpReport {
        IpReport::new(at(ts), ip.parse().unwrap(), Some(reason))
    }

    #[test]
    fn test_empty() {
        assert!(build_timeline(&[], at("2025-01-01T00:00:00Z")).is_empty());
    }

    #[test]
    fn test_three_entries() {
        let reports = vec![
            report("2025-01-01T00:00:00Z", "203.0.113.1", "boot"),
            report("2025-01-01T01:00:00Z", "203.0.113.2", "ifup"),
            report("2025-01-02T01:00:00Z", "203.0.113.3", "ppp"),
        ];
        let now = at("2025-01-02T01:00:30Z");
        let rows = build_timeline(&reports, now);
        assert_eq!(rows.len(), 4);

        // C -> now
        assert!(rows[0].is_open);
        assert_eq!(rows[0].ip, "203.0.113.3".parse().ok());
        assert_eq!(rows[0].held_for, Some(Duration::seconds(30)));
        assert_eq!(rows[0].next_ip, None);
        assert_eq!(rows[0].changed_at, now);

        // B -> C
        assert_eq!(rows[1].ip, "203.0.113.2".parse().ok());
        assert_eq!(rows[1].next_ip, "203.0.113.3".parse().ok());
        assert_eq!(rows[1].held_for, Some(Duration::days(1)));
        assert_eq!(rows[1].reason.as_deref(), Some("ppp"));

        // A -> B
        assert_eq!(rows[2].ip, "203.0.113.1".parse().ok());
        assert_eq!(rows[2].next_ip, "203.0.113.2".parse().ok());
        assert_eq!(rows[2].held_for, Some(Duration::hours(1)));

        // Oldest entry has no predecessor in the window
        assert_eq!(rows[3].ip, None);
        assert_eq!(rows[3].held_for, None);
        assert_eq!(rows[3].next_ip, "203.0.113.1".parse().ok());
        assert_eq!(rows[3].reason.as_deref(), Some("boot"));
    }

    #[test]
    fn test_offsets_are_respected() {
        let reports = vec![
            report("2025-04-06T02:30:00+11:00", "203.0.113.1", "a"),
            report("2025-04-06T02:30:00+10:00", "203.0.113.2", "b"),
        ];
        let rows = build_timeline(&reports, at("2025-04-06T03:30:00+10:00"));
        assert_eq!(rows[1].held_for, Some(Duration::hours(1)));
        assert_eq!(rows[0].held_for, Some(Duration::hours(1)));
    }
}
