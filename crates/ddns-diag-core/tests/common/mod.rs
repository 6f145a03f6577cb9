//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal lookup doubles so the contracts can be
//! checked without a registrar or a DNS server.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use ddns_diag_core::config::DiagConfig;
use ddns_diag_core::error::{Error, Result};
use ddns_diag_core::model::IpReport;
use ddns_diag_core::service::{DiagnosticService, ServiceEvent};
use ddns_diag_core::store::MemoryEventLog;
use ddns_diag_core::traits::{DomainResolver, RegistrarLookup, RegistrarSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Key accepted by services built with [`build_service`]
pub const TEST_KEY: &str = "s3cret";

/// A registrar that always returns the same ordered snapshot
pub struct StaticRegistrar {
    snapshot: RegistrarSnapshot,
    call_count: Arc<AtomicUsize>,
}

impl StaticRegistrar {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            snapshot: entries
                .iter()
                .map(|(d, ip)| (d.to_string(), ip.to_string()))
                .collect(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times registered_ips() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrarLookup for StaticRegistrar {
    async fn registered_ips(&self) -> Result<RegistrarSnapshot> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }

    fn lookup_name(&self) -> &'static str {
        "static"
    }
}

/// A registrar that is always unreachable
pub struct FailingRegistrar;

#[async_trait]
impl RegistrarLookup for FailingRegistrar {
    async fn registered_ips(&self) -> Result<RegistrarSnapshot> {
        Err(Error::external_tool("failing", "connection refused"))
    }

    fn lookup_name(&self) -> &'static str {
        "failing"
    }
}

/// A registrar that answers long after any reasonable timeout
pub struct SlowRegistrar(pub Duration);

#[async_trait]
impl RegistrarLookup for SlowRegistrar {
    async fn registered_ips(&self) -> Result<RegistrarSnapshot> {
        tokio::time::sleep(self.0).await;
        Ok(vec![("late.example.net".to_string(), "203.0.113.9".to_string())])
    }

    fn lookup_name(&self) -> &'static str {
        "slow"
    }
}

/// A resolver backed by a fixed table; unknown domains resolve to nothing
pub struct StaticResolver {
    answers: HashMap<String, String>,
    call_count: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(d, a)| (d.to_string(), a.to_string()))
                .collect(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainResolver for StaticResolver {
    async fn resolve(&self, domain: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.answers.get(domain).cloned().unwrap_or_default())
    }

    fn resolver_name(&self) -> &'static str {
        "static"
    }
}

/// A resolver that hangs for the given domain and answers the rest
pub struct SlowResolver {
    pub slow_domain: String,
    pub delay: Duration,
    pub answer: String,
}

#[async_trait]
impl DomainResolver for SlowResolver {
    async fn resolve(&self, domain: &str) -> Result<String> {
        if domain == self.slow_domain {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.answer.clone())
    }

    fn resolver_name(&self) -> &'static str {
        "slow"
    }
}

/// Minimal valid configuration with a one second lookup timeout
pub fn minimal_config() -> DiagConfig {
    let mut config = DiagConfig::new(TEST_KEY);
    config.lookup.timeout_secs = 1;
    config
}

/// Build a service over a shared in-memory log
pub fn build_service(
    log: &MemoryEventLog,
    registrar: impl RegistrarLookup + 'static,
    resolver: impl DomainResolver + 'static,
) -> (DiagnosticService, mpsc::Receiver<ServiceEvent>) {
    DiagnosticService::new(
        Arc::new(log.clone()),
        Arc::new(registrar),
        Arc::new(resolver),
        minimal_config(),
    )
    .expect("service construction succeeds")
}

/// Parse a timestamp in log format
pub fn ts(raw: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_str(raw, ddns_diag_core::model::LOG_TIMESTAMP_FORMAT)
        .expect("valid test timestamp")
}

/// Build a report for seeding a log
pub fn report(timestamp: &str, ip: &str, reason: Option<&str>) -> IpReport {
    IpReport::new(ts(timestamp), ip.parse().expect("valid test address"), reason)
}
