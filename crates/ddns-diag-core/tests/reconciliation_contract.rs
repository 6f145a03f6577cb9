//! Contract Test: Reconciliation
//!
//! Constraints verified:
//! - The WAN row comes first, then domains in registrar order
//! - Mismatch is flagged only when both answers exist and differ
//! - A slow or failing lookup degrades to empty cells, never an error
//! - An unreachable registrar falls back to the configured domains
//!
//! If this test fails, the DDNS view misreports propagation.

mod common;

use common::*;
use ddns_diag_core::reconcile::{Reconciler, WAN_ROW};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

fn ip(s: &str) -> Option<IpAddr> {
    Some(s.parse().unwrap())
}

#[tokio::test]
async fn rows_follow_registrar_order() {
    let registrar = StaticRegistrar::new(&[
        ("zeta.example.net", "203.0.113.5"),
        ("alpha.example.net", "203.0.113.5"),
        ("mid.example.net", "203.0.113.5"),
    ]);
    let resolver = StaticResolver::new(&[]);
    let reconciler = Reconciler::new(Arc::new(registrar), Arc::new(resolver), Duration::from_secs(1));

    let last = report("2025-01-09 12:00:00 +1100", "203.0.113.5", Some("ifup"));
    let result = reconciler
        .reconcile(Some(last), ts("2025-01-09 13:00:00 +1100"))
        .await;

    let domains: Vec<&str> = result.rows.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(
        domains,
        vec![WAN_ROW, "zeta.example.net", "alpha.example.net", "mid.example.net"]
    );
    assert_eq!(result.rows[0].registered_ip, ip("203.0.113.5"));
    assert_eq!(result.last_report_age(), Some(chrono::Duration::hours(1)));
}

#[tokio::test]
async fn mismatch_requires_both_answers() {
    let registrar = StaticRegistrar::new(&[
        ("same.example.net", "203.0.113.5"),
        ("stale.example.net", "203.0.113.5"),
        ("unregistered.example.net", ""),
        ("garbled.example.net", "not-an-ip"),
    ]);
    let resolver = StaticResolver::new(&[
        ("same.example.net", "203.0.113.5\n"),
        ("stale.example.net", "198.51.100.7\n"),
        ("unregistered.example.net", "198.51.100.7\n"),
        ("garbled.example.net", "198.51.100.7\n"),
    ]);
    let reconciler = Reconciler::new(Arc::new(registrar), Arc::new(resolver), Duration::from_secs(1));

    let result = reconciler.reconcile(None, ts("2025-01-09 13:00:00 +1100")).await;

    let flagged: Vec<&str> = result.mismatches().map(|r| r.domain.as_str()).collect();
    assert_eq!(flagged, vec!["stale.example.net"]);

    // A malformed registrar entry is shown as empty
    assert_eq!(result.rows[4].registered_ip, None);
    assert_eq!(result.rows[4].resolved_ip, ip("198.51.100.7"));

    // No report yet
    assert_eq!(result.rows[0].registered_ip, None);
    assert_eq!(result.last_report_age(), None);
}

#[tokio::test]
async fn cname_answer_uses_final_address() {
    let registrar = StaticRegistrar::new(&[("alias.example.net", "203.0.113.5")]);
    let resolver = StaticResolver::new(&[("alias.example.net", "home.example.net.\n203.0.113.5\n")]);
    let reconciler = Reconciler::new(Arc::new(registrar), Arc::new(resolver), Duration::from_secs(1));

    let result = reconciler.reconcile(None, ts("2025-01-09 13:00:00 +1100")).await;

    assert_eq!(result.rows[1].resolved_ip, ip("203.0.113.5"));
    assert!(!result.rows[1].mismatch);
}

#[tokio::test(start_paused = true)]
async fn slow_resolver_degrades_to_empty_cell() {
    let registrar = StaticRegistrar::new(&[
        ("fast.example.net", "203.0.113.5"),
        ("hung.example.net", "203.0.113.5"),
    ]);
    let resolver = SlowResolver {
        slow_domain: "hung.example.net".into(),
        delay: Duration::from_secs(3600),
        answer: "203.0.113.5".into(),
    };
    let reconciler = Reconciler::new(Arc::new(registrar), Arc::new(resolver), Duration::from_secs(1));

    let result = reconciler.reconcile(None, ts("2025-01-09 13:00:00 +1100")).await;

    assert_eq!(result.rows[1].resolved_ip, ip("203.0.113.5"));
    assert_eq!(result.rows[2].resolved_ip, None);
    assert_eq!(result.rows[2].registered_ip, ip("203.0.113.5"));
    assert!(!result.rows[2].mismatch);
}

#[tokio::test(start_paused = true)]
async fn slow_registrar_falls_back() {
    let resolver = StaticResolver::new(&[("home.example.net", "203.0.113.5")]);
    let reconciler = Reconciler::new(
        Arc::new(SlowRegistrar(Duration::from_secs(3600))),
        Arc::new(resolver),
        Duration::from_secs(1),
    )
    .with_fallback_domains(vec!["home.example.net".into()]);

    let result = reconciler.reconcile(None, ts("2025-01-09 13:00:00 +1100")).await;

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[1].domain, "home.example.net");
    assert_eq!(result.rows[1].registered_ip, None);
    assert_eq!(result.rows[1].resolved_ip, ip("203.0.113.5"));
}

#[tokio::test]
async fn failing_registrar_without_fallback_shows_wan_row_only() {
    let resolver = StaticResolver::new(&[]);
    let reconciler = Reconciler::new(Arc::new(FailingRegistrar), Arc::new(resolver), Duration::from_secs(1));

    let last = report("2025-01-09 12:00:00 +1100", "203.0.113.5", None);
    let result = reconciler
        .reconcile(Some(last), ts("2025-01-09 13:00:00 +1100"))
        .await;

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].domain, WAN_ROW);
}

#[tokio::test]
async fn invalid_domain_is_never_resolved() {
    let registrar = StaticRegistrar::new(&[("-oops", "203.0.113.5")]);
    let resolver = Arc::new(StaticResolver::new(&[]));
    let reconciler = Reconciler::new(Arc::new(registrar), resolver.clone(), Duration::from_secs(1));

    let result = reconciler.reconcile(None, ts("2025-01-09 13:00:00 +1100")).await;

    assert_eq!(resolver.call_count(), 0);
    assert_eq!(result.rows[1].resolved_ip, None);
}
