//! Core traits for the DDNS diagnostics system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`EventLog`]: Append-only storage of WAN IP reports
//! - [`RegistrarLookup`]: Domain → registered IP mapping from the registrar
//! - [`DomainResolver`]: Live DNS resolution of a single domain

pub mod event_log;
pub mod lookup;

pub use event_log::{EventLog, EventLogFactory};
pub use lookup::{
    DomainResolver, DomainResolverFactory, RegistrarLookup, RegistrarLookupFactory,
    RegistrarSnapshot, snapshot_from_json,
};
