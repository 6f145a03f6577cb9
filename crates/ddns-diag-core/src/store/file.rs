// # File Event Log
//
// File-based implementation of EventLog.
//
// ## Purpose
//
// Keeps the WAN IP history across restarts as plain text, one file per
// address family, so it can also be read with `tail` and `grep`.
//
// ## Write Atomicity
//
// - Each report is rendered to one buffer and written with a single `write`
//   on an `O_APPEND` handle, so concurrent appends never interleave
// - `sync_data` runs before success is reported
// - Existing content is never rewritten
//
// ## File Format
//
// ```text
// 2025-01-09 12:00:00 +1100, 203.0.113.5, ifup
// 2025-01-10 03:12:45 +1100, 203.0.113.77, ppp reconnect
// ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::EventLogConfig;
use crate::model::{IpFamily, IpReport};
use crate::tail;
use crate::traits::event_log::{EventLog, EventLogFactory};

/// File-based event log
///
/// # Example
///
/// ```rust,no_run
/// use ddns_diag_core::store::FileEventLog;
/// use ddns_diag_core::traits::EventLog;
/// use ddns_diag_core::{IpFamily, IpReport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = FileEventLog::new("/var/lib/ddns-diag/wanip4.log", "/var/lib/ddns-diag/wanip6.log")?;
///
///     let report = IpReport::new(chrono::Local::now().fixed_offset(), "203.0.113.5".parse()?, Some("ifup"));
///     log.append(&report).await?;
///
///     let last = log.tail(IpFamily::V4, 1).await?;
///     assert_eq!(last.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileEventLog {
    v4_path: PathBuf,
    v6_path: PathBuf,
}

impl FileEventLog {
    /// Create a file event log
    ///
    /// Parent directories are created if needed; the log files themselves
    /// are created on first append.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(v4_path: P, v6_path: Q) -> Result<Self, Error> {
        let log = Self {
            v4_path: v4_path.as_ref().to_path_buf(),
            v6_path: v6_path.as_ref().to_path_buf(),
        };

        for path in [&log.v4_path, &log.v6_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::config(format!(
                        "Failed to create log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(log)
    }

    /// Path of the log holding a family's reports
    pub fn path(&self, family: IpFamily) -> &Path {
        match family {
            IpFamily::V4 => &self.v4_path,
            IpFamily::V6 => &self.v6_path,
        }
    }
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, report: &IpReport) -> Result<(), Error> {
        let path = self.path(report.family());
        let line = report.to_line();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                Error::event_log(format!("Failed to open log {}: {}", path.display(), e))
            })?;

        file.write_all(line.as_bytes()).await.map_err(|e| {
            Error::event_log(format!("Failed to write log {}: {}", path.display(), e))
        })?;

        file.flush().await.map_err(|e| {
            Error::event_log(format!("Failed to flush log {}: {}", path.display(), e))
        })?;

        file.sync_data().await.map_err(|e| {
            Error::event_log(format!("Failed to sync log {}: {}", path.display(), e))
        })?;

        tracing::trace!("Appended to {}: {}", path.display(), line.trim_end());
        Ok(())
    }

    async fn tail(&self, family: IpFamily, max_lines: usize) -> Result<Vec<String>, Error> {
        let path = self.path(family).to_path_buf();

        let lines = tokio::task::spawn_blocking(move || {
            let mut file = match std::fs::File::open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("Log file does not exist yet: {}", path.display());
                    return Ok(Vec::new());
                }
                Err(e) => {
                    return Err(Error::event_log(format!(
                        "Failed to open log {}: {}",
                        path.display(),
                        e
                    )));
                }
            };

            let is_file = file.metadata().map(|m| m.is_file()).unwrap_or(false);
            if !is_file {
                return Err(Error::event_log(format!(
                    "Log {} is not a regular file",
                    path.display()
                )));
            }

            tail::tail_strings(&mut file, max_lines).map_err(|e| {
                Error::event_log(format!("Failed to read log {}: {}", path.display(), e))
            })
        })
        .await
        .map_err(|e| Error::event_log(format!("Tail task failed: {}", e)))??;

        tracing::debug!("Read {} line(s) from the {} log", lines.len(), family);
        Ok(lines)
    }
}

/// Factory for creating file event logs
pub struct FileEventLogFactory;

impl EventLogFactory for FileEventLogFactory {
    fn create(&self, config: &EventLogConfig) -> Result<Box<dyn EventLog>, Error> {
        match config {
            EventLogConfig::File { v4_path, v6_path } => {
                Ok(Box::new(FileEventLog::new(v4_path, v6_path)?))
            }
            _ => Err(Error::config("Invalid config for file event log")),
        }
    }
}
