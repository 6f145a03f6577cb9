// # Event Log Trait
//
// Defines the interface for the append-only WAN IP report log.
//
// ## Purpose
//
// The event log is the only persistent state in the system. Routers append
// a report every time their WAN address changes; the diagnostic views read
// the most recent reports back.
//
// ## Implementations
//
// - File-based: one text file per address family (`FileEventLog`)
// - In-memory: for tests and embedding (`MemoryEventLog`)
//
// ## Usage
//
// ```rust,ignore
// use ddns_diag_core::{EventLog, IpFamily, IpReport};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let log = /* EventLog implementation */;
//
//     // Append a report
//     let report = IpReport::new(chrono::Local::now().fixed_offset(), "203.0.113.5".parse()?, Some("ifup"));
//     log.append(&report).await?;
//
//     // Read back the latest line
//     let lines = log.tail(IpFamily::V4, 1).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{IpFamily, IpReport};

/// Trait for event log implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Thread Safety
///
/// `append` may be called concurrently from many requests. Each call must
/// land as one whole line; interleaved partial lines are never acceptable.
/// Reads run concurrently with appends and may observe slightly stale data.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O against its own log files
/// - ✅ Rely on the platform's atomic append for small writes
///
/// ## Forbidden Capabilities
/// - ❌ Rewrite, truncate or reorder existing entries
/// - ❌ Check credentials (owned by `DiagnosticService`)
/// - ❌ Retry failed writes (the request fails instead)
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append a report to the log of its address family
    ///
    /// Returns only once the line is durable.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The report was written
    /// - `Err(Error)`: The log could not be opened or written
    async fn append(&self, report: &IpReport) -> Result<(), crate::Error>;

    /// Read the last `max_lines` raw lines of a family's log, oldest first
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: The lines, without terminators (empty if the log
    ///   does not exist yet)
    /// - `Err(Error)`: The log exists but could not be read
    async fn tail(&self, family: IpFamily, max_lines: usize) -> Result<Vec<String>, crate::Error>;
}

/// Helper trait for constructing event logs from configuration
pub trait EventLogFactory: Send + Sync {
    /// Create an EventLog instance from configuration
    fn create(
        &self,
        config: &crate::config::EventLogConfig,
    ) -> Result<Box<dyn EventLog>, crate::Error>;
}
