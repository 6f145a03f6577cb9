//! Plugin-based backend registry
//!
//! The registry allows event logs, registrar lookups and resolvers to be
//! registered dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddns_diag_core::registry::LookupRegistry;
//! use ddns_diag_core::config::RegistrarConfig;
//!
//! let registry = LookupRegistry::with_builtin_logs();
//!
//! // Plugin crates register their factories
//! ddns_diag_lookup::register(&registry);
//!
//! let config = RegistrarConfig::Command { program: "ncdip".into(), args: vec!["-j".into()] };
//! let registrar = registry.create_registrar(&config)?;
//! ```

use crate::config::{EventLogConfig, RegistrarConfig, ResolverConfig};
use crate::error::{Error, Result};
use crate::store::{FileEventLogFactory, MemoryEventLogFactory};
use crate::traits::{
    DomainResolver, DomainResolverFactory, EventLog, EventLogFactory, RegistrarLookup,
    RegistrarLookupFactory,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Registry of backend factories keyed by configuration type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct LookupRegistry {
    /// Registered event log factories
    event_logs: RwLock<HashMap<String, Box<dyn EventLogFactory>>>,

    /// Registered registrar lookup factories
    registrars: RwLock<HashMap<String, Box<dyn RegistrarLookupFactory>>>,

    /// Registered resolver factories
    resolvers: RwLock<HashMap<String, Box<dyn DomainResolverFactory>>>,
}

impl LookupRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the file and memory event logs registered
    pub fn with_builtin_logs() -> Self {
        let registry = Self::new();
        registry.register_event_log("file", Box::new(FileEventLogFactory));
        registry.register_event_log("memory", Box::new(MemoryEventLogFactory));
        registry
    }

    /// Register an event log factory
    pub fn register_event_log(&self, name: impl Into<String>, factory: Box<dyn EventLogFactory>) {
        let mut logs = self.event_logs.write().unwrap_or_else(|e| e.into_inner());
        logs.insert(name.into(), factory);
    }

    /// Register a registrar lookup factory
    ///
    /// # Parameters
    ///
    /// - `name`: Registrar type name (e.g., "command", "http")
    /// - `factory`: Factory object for creating registrar lookups
    pub fn register_registrar(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RegistrarLookupFactory>,
    ) {
        let mut registrars = self.registrars.write().unwrap_or_else(|e| e.into_inner());
        registrars.insert(name.into(), factory);
    }

    /// Register a resolver factory
    ///
    /// # Parameters
    ///
    /// - `name`: Resolver type name (e.g., "dig", "system")
    /// - `factory`: Factory object for creating resolvers
    pub fn register_resolver(&self, name: impl Into<String>, factory: Box<dyn DomainResolverFactory>) {
        let mut resolvers = self.resolvers.write().unwrap_or_else(|e| e.into_inner());
        resolvers.insert(name.into(), factory);
    }

    /// Create an event log from configuration
    pub fn create_event_log(&self, config: &EventLogConfig) -> Result<Box<dyn EventLog>> {
        let log_type = config.type_name();
        let logs = self.event_logs.read().unwrap_or_else(|e| e.into_inner());

        let factory = logs
            .get(log_type)
            .ok_or_else(|| Error::config(format!("Unknown event log type: {}", log_type)))?;

        factory.create(config)
    }

    /// Create a registrar lookup from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RegistrarLookup>)`: Created registrar lookup
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn RegistrarLookup>> {
        let registrar_type = config.type_name();
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());

        let factory = registrars.get(registrar_type).ok_or_else(|| {
            Error::config(format!("Unknown registrar type: {}", registrar_type))
        })?;

        factory.create(config)
    }

    /// Create a resolver from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DomainResolver>)`: Created resolver
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn DomainResolver>> {
        let resolver_type = config.type_name();
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());

        let factory = resolvers
            .get(resolver_type)
            .ok_or_else(|| Error::config(format!("Unknown resolver type: {}", resolver_type)))?;

        factory.create(config)
    }

    /// List all registered registrar types
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());
        registrars.keys().cloned().collect()
    }

    /// List all registered resolver types
    pub fn list_resolvers(&self) -> Vec<String> {
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());
        resolvers.keys().cloned().collect()
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());
        registrars.contains_key(name)
    }

    /// Check if a resolver type is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());
        resolvers.contains_key(name)
    }
}
