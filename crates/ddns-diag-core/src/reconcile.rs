//! Three-way WAN IP reconciliation
//!
//! Compares the last WAN address the router reported, the address the
//! registrar has on record for each domain, and the address public DNS
//! currently answers with. A domain whose registrar and DNS answers disagree
//! usually means the registrar has not propagated the last update yet.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{IpReport, validate_domain_name};
use crate::traits::{DomainResolver, RegistrarLookup, RegistrarSnapshot};

/// Domain name used for the synthetic header row
pub const WAN_ROW: &str = "WAN";

/// One row of the reconciliation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    /// Domain name, or [`WAN_ROW`] for the header row
    pub domain: String,
    /// Address the registrar has on record (or the last logged WAN IP for the header row)
    pub registered_ip: Option<IpAddr>,
    /// Address public DNS resolves the domain to
    pub resolved_ip: Option<IpAddr>,
    /// Registrar and DNS both answered and disagree
    pub mismatch: bool,
}

impl ReconciliationRow {
    /// Build a domain row; the mismatch flag is derived, never supplied
    pub fn new(domain: impl Into<String>, registered_ip: Option<IpAddr>, resolved_ip: Option<IpAddr>) -> Self {
        let mismatch = matches!((registered_ip, resolved_ip), (Some(r), Some(d)) if r != d);
        Self {
            domain: domain.into(),
            registered_ip,
            resolved_ip,
            mismatch,
        }
    }

    /// Header row carrying the last logged WAN IP
    pub fn wan(last_ip: Option<IpAddr>) -> Self {
        Self {
            domain: WAN_ROW.to_string(),
            registered_ip: last_ip,
            resolved_ip: None,
            mismatch: false,
        }
    }
}

/// Result of a reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// When the table was built
    pub generated_at: DateTime<FixedOffset>,
    /// Most recent report in the IPv4 log, if any
    pub last_report: Option<IpReport>,
    /// Header row first, then one row per domain in registrar order
    pub rows: Vec<ReconciliationRow>,
}

impl Reconciliation {
    /// Rows whose registrar and DNS answers disagree
    pub fn mismatches(&self) -> impl Iterator<Item = &ReconciliationRow> {
        self.rows.iter().filter(|row| row.mismatch)
    }

    /// Time since the last report was logged
    pub fn last_report_age(&self) -> Option<chrono::Duration> {
        self.last_report
            .as_ref()
            .map(|r| self.generated_at.signed_duration_since(r.timestamp))
    }
}

/// Parse an address literal, treating anything malformed as absent
fn valid_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

/// Pick the address out of resolver output
///
/// For CNAME chains `dig +short` prints the alias target first and the
/// address on the last line.
fn resolved_answer(raw: &str) -> Option<IpAddr> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .and_then(valid_ip)
}

/// Builds reconciliation tables from the registrar and resolver
///
/// Every external call is bounded by `timeout`. Failures degrade to empty
/// cells rather than failing the whole report.
pub struct Reconciler {
    registrar: Arc<dyn RegistrarLookup>,
    resolver: Arc<dyn DomainResolver>,
    timeout: Duration,
    fallback_domains: Vec<String>,
}

impl Reconciler {
    /// Create a reconciler
    pub fn new(
        registrar: Arc<dyn RegistrarLookup>,
        resolver: Arc<dyn DomainResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            registrar,
            resolver,
            timeout,
            fallback_domains: Vec::new(),
        }
    }

    /// Domains listed when the registrar cannot be reached
    pub fn with_fallback_domains(mut self, domains: Vec<String>) -> Self {
        self.fallback_domains = domains;
        self
    }

    /// Build the table for the given last report
    pub async fn reconcile(
        &self,
        last_report: Option<IpReport>,
        now: DateTime<FixedOffset>,
    ) -> Reconciliation {
        let snapshot = match self.registrar_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Registrar lookup failed, showing fallback domains: {}", e);
                self.fallback_domains
                    .iter()
                    .map(|domain| (domain.clone(), String::new()))
                    .collect()
            }
        };

        let mut rows = Vec::with_capacity(snapshot.len() + 1);
        rows.push(ReconciliationRow::wan(last_report.as_ref().map(|r| r.address)));

        for (domain, registered) in snapshot {
            let registered_ip = valid_ip(&registered);
            if registered_ip.is_none() && !registered.trim().is_empty() {
                warn!("Registrar returned malformed address for {}: '{}'", domain, registered);
            }

            let resolved_ip = match self.resolve(&domain).await {
                Ok(ip) => ip,
                Err(e) => {
                    warn!("Resolving {} failed: {}", domain, e);
                    None
                }
            };

            let row = ReconciliationRow::new(domain, registered_ip, resolved_ip);
            if row.mismatch {
                debug!(
                    "Mismatch for {}: registered {:?}, resolved {:?}",
                    row.domain, row.registered_ip, row.resolved_ip
                );
            }
            rows.push(row);
        }

        Reconciliation {
            generated_at: now,
            last_report,
            rows,
        }
    }

    async fn registrar_snapshot(&self) -> Result<RegistrarSnapshot> {
        let name = self.registrar.lookup_name();
        tokio::time::timeout(self.timeout, self.registrar.registered_ips())
            .await
            .map_err(|_| Error::external_tool(name, format!("timed out after {:?}", self.timeout)))?
    }

    async fn resolve(&self, domain: &str) -> Result<Option<IpAddr>> {
        validate_domain_name(domain)?;

        let name = self.resolver.resolver_name();
        let raw = tokio::time::timeout(self.timeout, self.resolver.resolve(domain))
            .await
            .map_err(|_| Error::external_tool(name, format!("timed out after {:?}", self.timeout)))??;

        Ok(resolved_answer(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_rules() {
        let a: IpAddr = "203.0.113.5".parse().unwrap();
        let b: IpAddr = "203.0.113.6".parse().unwrap();

        assert!(!ReconciliationRow::new("x", Some(a), Some(a)).mismatch);
        assert!(ReconciliationRow::new("x", Some(a), Some(b)).mismatch);
        assert!(!ReconciliationRow::new("x", None, Some(b)).mismatch);
        assert!(!ReconciliationRow::new("x", Some(a), None).mismatch);
        assert!(!ReconciliationRow::new("x", None, None).mismatch);
    }

    #[test]
    fn test_resolver_output_parsing() {
        assert_eq!(resolved_answer(""), None);
        assert_eq!(resolved_answer("203.0.113.5\n"), "203.0.113.5".parse().ok());
        assert_eq!(
            resolved_answer("home.example.net.\n203.0.113.5\n"),
            "203.0.113.5".parse().ok()
        );
        assert_eq!(resolved_answer(";; connection timed out"), None);
    }

    #[test]
    fn test_wan_row() {
        let row = ReconciliationRow::wan("203.0.113.5".parse().ok());
        assert_eq!(row.domain, WAN_ROW);
        assert!(!row.mismatch);
        assert_eq!(row.resolved_ip, None);
    }
}
