//! Configuration types for the DDNS diagnostics system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagConfig {
    /// Event log configuration
    pub event_log: EventLogConfig,

    /// Write authentication
    pub auth: AuthConfig,

    /// Registrar lookup backend
    pub registrar: RegistrarConfig,

    /// DNS resolver backend
    pub resolver: ResolverConfig,

    /// Settings shared by all external lookups
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Limits for the log views
    #[serde(default)]
    pub view: ViewConfig,
}

impl DiagConfig {
    /// Create a new configuration with defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            event_log: EventLogConfig::default(),
            auth: AuthConfig::new(api_key),
            registrar: RegistrarConfig::default(),
            resolver: ResolverConfig::default(),
            lookup: LookupConfig::default(),
            view: ViewConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.event_log.validate()?;
        self.auth.validate()?;
        self.registrar.validate()?;
        self.resolver.validate()?;
        self.lookup.validate()?;
        self.view.validate()?;
        Ok(())
    }
}

/// Event log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventLogConfig {
    /// One text file per address family
    File {
        /// Path of the IPv4 log
        v4_path: String,
        /// Path of the IPv6 log
        v6_path: String,
    },

    /// In-memory log (not persistent)
    Memory,
}

impl EventLogConfig {
    /// Validate the event log configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            EventLogConfig::File { v4_path, v6_path } => {
                if v4_path.is_empty() || v6_path.is_empty() {
                    return Err(crate::Error::config("Event log paths cannot be empty"));
                }
                if v4_path == v6_path {
                    return Err(crate::Error::config(
                        "IPv4 and IPv6 logs must be separate files",
                    ));
                }
                Ok(())
            }
            EventLogConfig::Memory => Ok(()),
        }
    }

    /// Get the event log type name
    pub fn type_name(&self) -> &str {
        match self {
            EventLogConfig::File { .. } => "file",
            EventLogConfig::Memory => "memory",
        }
    }
}

impl Default for EventLogConfig {
    fn default() -> Self {
        EventLogConfig::File {
            v4_path: "wanip4.log".to_string(),
            v6_path: "wanip6.log".to_string(),
        }
    }
}

/// Shared-key authentication for write requests
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Key routers must send with every report
    pub api_key: String,
}

impl AuthConfig {
    /// Name of the key entry in an auth file
    pub const AUTH_FILE_KEY: &'static str = "APIkey";

    /// Create an auth configuration from a literal key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Load the key from a `name=value` auth file
    ///
    /// Lines that are not exactly one `name=value` pair are ignored.
    pub fn from_auth_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Failed to read auth file {}: {}",
                path.display(),
                e
            ))
        })?;

        let entries = parse_auth_entries(&content);
        let api_key = entries.get(Self::AUTH_FILE_KEY).cloned().ok_or_else(|| {
            crate::Error::config(format!(
                "Auth file {} has no {} entry",
                path.display(),
                Self::AUTH_FILE_KEY
            ))
        })?;

        Ok(Self { api_key })
    }

    /// Validate the auth configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }
        Ok(())
    }

    /// Exact comparison against the configured key
    pub fn accepts(&self, key: &str) -> bool {
        !self.api_key.is_empty() && self.api_key == key
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn parse_auth_entries(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.trim().split('=').collect();
            match tokens.as_slice() {
                [name, value] => Some((name.trim().to_string(), value.trim().to_string())),
                _ => None,
            }
        })
        .collect()
}

/// Registrar lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// Local command printing a JSON object of domain → IP
    Command {
        /// Program to run
        program: String,
        /// Arguments passed to the program
        #[serde(default)]
        args: Vec<String>,
    },

    /// HTTP(S) endpoint returning a JSON object of domain → IP
    Http {
        /// URL to fetch
        url: String,
    },

    /// Custom registrar lookup
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::Command { program, .. } => {
                if program.is_empty() {
                    return Err(crate::Error::config("Registrar command cannot be empty"));
                }
                Ok(())
            }
            RegistrarConfig::Http { url } => {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Registrar URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registrar factory cannot be empty",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::Command { .. } => "command",
            RegistrarConfig::Http { .. } => "http",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        RegistrarConfig::Command {
            program: "ncdip".to_string(),
            args: vec!["-j".to_string()],
        }
    }
}

/// DNS resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// `dig +short` against the system's configured servers
    Dig {
        /// Path to the dig binary
        program: String,
    },

    /// The operating system's resolver
    #[default]
    System,

    /// Custom resolver
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::Dig { program } => {
                if program.is_empty() {
                    return Err(crate::Error::config("dig program path cannot be empty"));
                }
                Ok(())
            }
            ResolverConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom resolver factory cannot be empty"));
                }
                Ok(())
            }
            ResolverConfig::System => Ok(()),
        }
    }

    /// Get the resolver type name
    pub fn type_name(&self) -> &str {
        match self {
            ResolverConfig::Dig { .. } => "dig",
            ResolverConfig::System => "system",
            ResolverConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Settings shared by registrar and resolver calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Upper bound on every external call (in seconds)
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,

    /// Domains to show when the registrar cannot be reached
    #[serde(default)]
    pub fallback_domains: Vec<String>,
}

impl LookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=60).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "Lookup timeout must be between 1 and 60 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        for domain in &self.fallback_domains {
            crate::model::validate_domain_name(domain)
                .map_err(|e| crate::Error::config(e.to_string()))?;
        }

        Ok(())
    }

    /// Timeout as a `Duration`
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_lookup_timeout_secs(),
            fallback_domains: Vec::new(),
        }
    }
}

/// Limits for the WAN log views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Lines shown when the request does not say
    #[serde(default = "default_lines")]
    pub default_lines: usize,

    /// Hard cap on requested lines
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl ViewConfig {
    /// Validate the view configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_lines == 0 {
            return Err(crate::Error::config("Default line count must be > 0"));
        }
        if self.max_lines < self.default_lines {
            return Err(crate::Error::config(format!(
                "Max line count ({}) is below the default ({})",
                self.max_lines, self.default_lines
            )));
        }
        Ok(())
    }

    /// Clamp a requested line count to the configured cap
    pub fn clamp_lines(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_lines).min(self.max_lines)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_lines: default_lines(),
            max_lines: default_max_lines(),
        }
    }
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

fn default_lines() -> usize {
    50
}

fn default_max_lines() -> usize {
    10_000
}
