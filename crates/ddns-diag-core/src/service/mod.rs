//! Diagnostic service
//!
//! The DiagnosticService is responsible for:
//! - Authenticating and appending WAN IP reports
//! - Building the registrar / DNS reconciliation view
//! - Building the WAN IP timeline view
//!
//! ## Architecture
//!
//! ```text
//!                       ┌────────────────────┐
//!   DiagRequest ───────▶│ DiagnosticService  │──── ServiceEvent ───▶ (monitoring)
//!                       └────────────────────┘
//!                                 │
//!         ┌───────────────────────┼────────────────────────┐
//!         │                       │                        │
//!         ▼                       ▼                        ▼
//! ┌──────────────┐       ┌──────────────┐         ┌──────────────┐
//! │  EventLog    │       │  Reconciler  │         │ LogTimeline  │
//! │ (append/tail)│       │ (registrar,  │         │ (held-for    │
//! └──────────────┘       │  resolver)   │         │  intervals)  │
//!                        └──────────────┘         └──────────────┘
//! ```
//!
//! The service keeps no state between requests; the event log is the only
//! shared resource.

use chrono::{DateTime, FixedOffset, SubsecRound};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{AuthConfig, DiagConfig, ViewConfig};
use crate::error::{Error, Result};
use crate::model::{IpFamily, IpReport};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::request::{DiagRequest, Format, ReportRequest, View};
use crate::timeline::{TimelineRow, build_timeline};
use crate::traits::{DomainResolver, EventLog, RegistrarLookup};

/// Capacity of the service event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Lines scanned for the newest readable report
const LAST_REPORT_SCAN_LINES: usize = 16;

/// Events emitted by the DiagnosticService
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A report was appended to the log
    ReportLogged { address: IpAddr, family: IpFamily },

    /// A report was refused because the key did not match
    ReportDenied { addresses: Vec<IpAddr> },

    /// The reconciliation view was built
    ReconciliationBuilt { domains: usize, mismatches: usize },

    /// The timeline view was built
    TimelineBuilt { family: IpFamily, rows: usize },
}

/// Outcome of a handled request, ready for presentation
#[derive(Debug, Clone)]
pub enum DiagResponse {
    /// Reports that were appended, in request order
    Logged(Vec<IpReport>),

    /// Reconciliation view
    Ddns {
        reconciliation: Reconciliation,
        format: Format,
    },

    /// Timeline view, most recent row first
    Wan {
        family: IpFamily,
        rows: Vec<TimelineRow>,
        format: Format,
    },
}

/// Core diagnostic service
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct DiagnosticService {
    /// Append-only report log
    event_log: Arc<dyn EventLog>,

    /// Registrar / DNS comparison
    reconciler: Reconciler,

    /// Write authentication
    auth: AuthConfig,

    /// View limits
    view: ViewConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ServiceEvent>,
}

impl DiagnosticService {
    /// Create a new diagnostic service
    ///
    /// # Parameters
    ///
    /// - `event_log`: Event log implementation
    /// - `registrar`: Registrar lookup implementation
    /// - `resolver`: DNS resolver implementation
    /// - `config`: Diagnostics configuration
    ///
    /// # Returns
    ///
    /// A tuple of (service, event_receiver) where event_receiver yields service events
    pub fn new(
        event_log: Arc<dyn EventLog>,
        registrar: Arc<dyn RegistrarLookup>,
        resolver: Arc<dyn DomainResolver>,
        config: DiagConfig,
    ) -> Result<(Self, mpsc::Receiver<ServiceEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciler = Reconciler::new(registrar, resolver, config.lookup.timeout())
            .with_fallback_domains(config.lookup.fallback_domains);

        let service = Self {
            event_log,
            reconciler,
            auth: config.auth,
            view: config.view,
            event_tx: tx,
        };

        Ok((service, rx))
    }

    /// Handle a parsed request
    pub async fn handle(&self, request: DiagRequest) -> Result<DiagResponse> {
        match request {
            DiagRequest::Report(report) => self.record(&report).await.map(DiagResponse::Logged),
            DiagRequest::View {
                view: View::Ddns,
                format,
            } => Ok(DiagResponse::Ddns {
                reconciliation: self.ddns_view().await?,
                format,
            }),
            DiagRequest::View {
                view: View::Wan { family, lines },
                format,
            } => Ok(DiagResponse::Wan {
                family,
                rows: self.wan_view(family, lines).await?,
                format,
            }),
        }
    }

    /// Authenticate a report and append each of its addresses
    ///
    /// On a key mismatch nothing is written for either family.
    pub async fn record(&self, request: &ReportRequest) -> Result<Vec<IpReport>> {
        if !self.auth.accepts(&request.key) {
            warn!(
                "Rejected report for {:?}: key mismatch",
                request.addresses().collect::<Vec<_>>()
            );
            self.emit_event(ServiceEvent::ReportDenied {
                addresses: request.addresses().collect(),
            });
            return Err(Error::permission_denied("key mismatch"));
        }

        let timestamp = now();
        let mut logged = Vec::new();

        for address in request.addresses() {
            let report = IpReport::new(timestamp, address, request.reason.as_deref());

            if let Err(e) = self.event_log.append(&report).await {
                error!("Failed to log {}: {}", address, e);
                return Err(e);
            }

            info!(
                "Logged {} address {} (reason: {})",
                report.family(),
                address,
                report.reason_str()
            );
            self.emit_event(ServiceEvent::ReportLogged {
                address,
                family: report.family(),
            });
            logged.push(report);
        }

        Ok(logged)
    }

    /// Build the reconciliation view against the last IPv4 report
    pub async fn ddns_view(&self) -> Result<Reconciliation> {
        let last_report = self
            .read_reports(IpFamily::V4, LAST_REPORT_SCAN_LINES)
            .await?
            .pop();
        let reconciliation = self.reconciler.reconcile(last_report, now()).await;

        self.emit_event(ServiceEvent::ReconciliationBuilt {
            domains: reconciliation.rows.len() - 1,
            mismatches: reconciliation.mismatches().count(),
        });

        Ok(reconciliation)
    }

    /// Build the timeline view of a family's log
    ///
    /// `lines` is clamped to the configured maximum.
    pub async fn wan_view(&self, family: IpFamily, lines: Option<usize>) -> Result<Vec<TimelineRow>> {
        let lines = self.view.clamp_lines(lines);
        let reports = self.read_reports(family, lines).await?;
        let rows = build_timeline(&reports, now());

        self.emit_event(ServiceEvent::TimelineBuilt {
            family,
            rows: rows.len(),
        });

        Ok(rows)
    }

    /// Tail a family's log and parse it, skipping lines that do not parse
    async fn read_reports(&self, family: IpFamily, lines: usize) -> Result<Vec<IpReport>> {
        let raw = self.event_log.tail(family, lines).await.inspect_err(|e| {
            error!("Failed to read the {} log: {}", family, e);
        })?;

        let reports: Vec<IpReport> = raw
            .iter()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match IpReport::from_line(line) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("Skipping unreadable log line: {}", e);
                    None
                }
            })
            .collect();

        debug!("Parsed {} of {} {} log line(s)", reports.len(), raw.len(), family);
        Ok(reports)
    }

    /// Emit an event (non-blocking)
    fn emit_event(&self, event: ServiceEvent) {
        // Never blocks the request
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event");
        }
    }
}

/// Current local time at log resolution
fn now() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset().trunc_subsecs(0)
}
