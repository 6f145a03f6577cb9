// # Memory Event Log
//
// In-memory implementation of EventLog.
//
// ## Purpose
//
// Holds rendered log lines in memory so tests and embedders exercise
// exactly the same line format and tail semantics as the file log.
//
// ## Crash Behavior
//
// - All history is lost on restart

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::EventLogConfig;
use crate::model::{IpFamily, IpReport};
use crate::tail;
use crate::traits::event_log::{EventLog, EventLogFactory};

/// In-memory event log implementation
///
/// Each family's log is kept as one byte buffer, exactly as it would be on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    inner: Arc<RwLock<HashMap<IpFamily, Vec<u8>>>>,
}

impl MemoryEventLog {
    /// Create a new empty memory event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines in a family's log
    pub async fn line_count(&self, family: IpFamily) -> usize {
        let guard = self.inner.read().await;
        guard
            .get(&family)
            .map(|buf| buf.iter().filter(|&&b| b == b'\n').count())
            .unwrap_or(0)
    }

    /// Raw content of a family's log
    pub async fn contents(&self, family: IpFamily) -> String {
        let guard = self.inner.read().await;
        guard
            .get(&family)
            .map(|buf| String::from_utf8_lossy(buf).into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, report: &IpReport) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .entry(report.family())
            .or_default()
            .extend_from_slice(report.to_line().as_bytes());
        Ok(())
    }

    async fn tail(&self, family: IpFamily, max_lines: usize) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        match guard.get(&family) {
            Some(buf) => Ok(tail::tail_strings(&mut Cursor::new(buf.as_slice()), max_lines)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Factory for creating memory event logs
pub struct MemoryEventLogFactory;

impl EventLogFactory for MemoryEventLogFactory {
    fn create(&self, config: &EventLogConfig) -> Result<Box<dyn EventLog>, Error> {
        match config {
            EventLogConfig::Memory => Ok(Box::new(MemoryEventLog::new())),
            _ => Err(Error::config("Invalid config for memory event log")),
        }
    }
}
