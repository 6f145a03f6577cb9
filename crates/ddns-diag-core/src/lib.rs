// # ddns-diag-core
//
// Core library for the DDNS diagnostics endpoint.
//
// ## Architecture Overview
//
// A home router reports its WAN address here whenever it changes. This
// library keeps those reports and explains, on request, whether the
// registrar and public DNS agree with them:
// - **EventLog**: Append-only report log, one per address family
// - **tail**: Exact backward-scanning "last N lines" reader
// - **duration**: Compact human-readable durations
// - **Reconciler**: Last WAN IP vs registrar vs live DNS
// - **timeline**: "Held for X until changed to Y" intervals
// - **DiagnosticService**: Authenticates writes and builds the views
// - **LookupRegistry**: Plugin-based registry for lookup backends
//
// ## Design Principles
//
// 1. **Injected capabilities**: Storage, registrar and DNS are traits
// 2. **Typed requests**: Query strings are parsed once into `DiagRequest`
// 3. **Library-First**: The daemon is a thin HTTP and rendering layer
// 4. **Degrade, don't fail**: External lookup failures become empty cells

pub mod config;
pub mod duration;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod request;
pub mod service;
pub mod store;
pub mod tail;
pub mod timeline;
pub mod traits;

// Re-export core types for convenience
pub use config::{DiagConfig, EventLogConfig, RegistrarConfig, ResolverConfig};
pub use duration::{DurationFormat, format_duration, format_seconds};
pub use error::{Error, Result};
pub use model::{IpFamily, IpReport};
pub use reconcile::{Reconciler, Reconciliation, ReconciliationRow};
pub use registry::LookupRegistry;
pub use request::{DiagRequest, Format, ReportRequest, View};
pub use service::{DiagResponse, DiagnosticService, ServiceEvent};
pub use store::{FileEventLog, MemoryEventLog};
pub use timeline::{TimelineRow, build_timeline};
pub use traits::{DomainResolver, EventLog, RegistrarLookup};
