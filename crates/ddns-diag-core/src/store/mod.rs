// # Event Log Implementations
//
// This module provides implementations of the EventLog trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileEventLog, FileEventLogFactory};
pub use memory::{MemoryEventLog, MemoryEventLogFactory};
