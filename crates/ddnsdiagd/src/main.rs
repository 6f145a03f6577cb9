// # ddnsdiagd - DDNS Diagnostics Daemon
//
// This daemon is a THIN integration layer:
// - All logging, reconciliation and timeline logic lives in ddns-diag-core
// - Configuration is via environment variables ONLY
//
// The ddnsdiagd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Registering lookup backends and creating them from configuration
// 3. Serving the diagnostics endpoint over HTTP
// 4. Shutting down gracefully on SIGTERM/SIGINT
//
// ## Configuration
//
// ### Server
// - `DDNS_DIAG_BIND`: Listen address (default 0.0.0.0:8080)
// - `DDNS_DIAG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ### Event Log
// - `DDNS_DIAG_LOG_V4`: IPv4 log file (default wanip4.log)
// - `DDNS_DIAG_LOG_V6`: IPv6 log file (default wanip6.log)
//
// ### Authentication
// - `DDNS_DIAG_API_KEY`: Key routers must send with reports
// - `DDNS_DIAG_AUTH_FILE`: `name=value` file with an `APIkey` entry (used if no key is set)
//
// ### Lookups
// - `DDNS_DIAG_REGISTRAR_TYPE`: command, http (default command)
// - `DDNS_DIAG_REGISTRAR_CMD`: Registrar command line (default "ncdip -j")
// - `DDNS_DIAG_REGISTRAR_URL`: Registrar URL (for http)
// - `DDNS_DIAG_RESOLVER_TYPE`: dig, system (default dig)
// - `DDNS_DIAG_DIG_PATH`: dig binary (default dig)
// - `DDNS_DIAG_DOMAINS`: Comma-separated domains shown if the registrar is unreachable
// - `DDNS_DIAG_LOOKUP_TIMEOUT_SECS`: Bound on every lookup, 1-60 (default 5)
//
// ### Views
// - `DDNS_DIAG_DEFAULT_LINES`: WAN view lines when not requested (default 50)
// - `DDNS_DIAG_MAX_LINES`: Cap on requested lines (default 10000)
//
// ## Example
//
// ```bash
// export DDNS_DIAG_AUTH_FILE=/etc/ddns-diag/auth
// export DDNS_DIAG_LOG_V4=/var/lib/ddns-diag/wanip4.log
// export DDNS_DIAG_LOG_V6=/var/lib/ddns-diag/wanip6.log
// export DDNS_DIAG_DOMAINS=example.net,www.example.net
//
// ddnsdiagd
// ```

mod web;

use anyhow::{Context, Result};
use ddns_diag_core::config::{
    AuthConfig, DiagConfig, EventLogConfig, LookupConfig, RegistrarConfig, ResolverConfig,
    ViewConfig,
};
use ddns_diag_core::{DiagnosticService, LookupRegistry, ServiceEvent};
use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DiagExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DiagExitCode> for ExitCode {
    fn from(code: DiagExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    bind: String,
    log_v4: String,
    log_v6: String,
    api_key: Option<String>,
    auth_file: Option<String>,
    registrar_type: String,
    registrar_cmd: String,
    registrar_url: Option<String>,
    resolver_type: String,
    dig_path: String,
    domains: Vec<String>,
    lookup_timeout_secs: u64,
    default_lines: usize,
    max_lines: usize,
    log_level: String,
}

/// Read a variable, falling back to `default` when unset
fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a numeric variable, falling back to `default` when unset
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number. Got: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            bind: env_or("DDNS_DIAG_BIND", "0.0.0.0:8080"),
            log_v4: env_or("DDNS_DIAG_LOG_V4", "wanip4.log"),
            log_v6: env_or("DDNS_DIAG_LOG_V6", "wanip6.log"),
            api_key: env::var("DDNS_DIAG_API_KEY").ok().filter(|k| !k.is_empty()),
            auth_file: env::var("DDNS_DIAG_AUTH_FILE").ok().filter(|p| !p.is_empty()),
            registrar_type: env_or("DDNS_DIAG_REGISTRAR_TYPE", "command"),
            registrar_cmd: env_or("DDNS_DIAG_REGISTRAR_CMD", "ncdip -j"),
            registrar_url: env::var("DDNS_DIAG_REGISTRAR_URL").ok(),
            resolver_type: env_or("DDNS_DIAG_RESOLVER_TYPE", "dig"),
            dig_path: env_or("DDNS_DIAG_DIG_PATH", "dig"),
            domains: env::var("DDNS_DIAG_DOMAINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            lookup_timeout_secs: env_parse("DDNS_DIAG_LOOKUP_TIMEOUT_SECS", 5)?,
            default_lines: env_parse("DDNS_DIAG_DEFAULT_LINES", 50)?,
            max_lines: env_parse("DDNS_DIAG_MAX_LINES", 10_000)?,
            log_level: env_or("DDNS_DIAG_LOG_LEVEL", "info"),
        })
    }

    /// Validate the daemon-level settings
    ///
    /// Library-level settings are validated by `DiagConfig::validate`.
    fn validate(&self) -> Result<()> {
        if self.bind.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "DDNS_DIAG_BIND must be an address:port pair. Got: {}",
                self.bind
            );
        }

        if self.api_key.is_none() && self.auth_file.is_none() {
            anyhow::bail!(
                "No API key configured. \
                Set DDNS_DIAG_API_KEY, or DDNS_DIAG_AUTH_FILE pointing at a file with an APIkey=... line"
            );
        }

        match self.registrar_type.as_str() {
            "command" => {
                if self.registrar_cmd.split_whitespace().next().is_none() {
                    anyhow::bail!("DDNS_DIAG_REGISTRAR_CMD cannot be empty");
                }
            }
            "http" => {
                if self.registrar_url.as_ref().is_none_or(|u| u.is_empty()) {
                    anyhow::bail!(
                        "DDNS_DIAG_REGISTRAR_URL is required when DDNS_DIAG_REGISTRAR_TYPE=http"
                    );
                }
            }
            _ => anyhow::bail!(
                "DDNS_DIAG_REGISTRAR_TYPE '{}' is not supported. \
                Supported types: command, http",
                self.registrar_type
            ),
        }

        match self.resolver_type.as_str() {
            "dig" | "system" => {}
            _ => anyhow::bail!(
                "DDNS_DIAG_RESOLVER_TYPE '{}' is not supported. \
                Supported types: dig, system",
                self.resolver_type
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_DIAG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the library configuration
    fn to_diag_config(&self) -> Result<DiagConfig> {
        let auth = match (&self.api_key, &self.auth_file) {
            (Some(key), _) => AuthConfig::new(key.clone()),
            (None, Some(path)) => AuthConfig::from_auth_file(path)?,
            (None, None) => anyhow::bail!("No API key configured"),
        };

        let registrar = match self.registrar_type.as_str() {
            "http" => RegistrarConfig::Http {
                url: self.registrar_url.clone().unwrap_or_default(),
            },
            _ => {
                let mut words = self.registrar_cmd.split_whitespace().map(str::to_string);
                RegistrarConfig::Command {
                    program: words.next().unwrap_or_default(),
                    args: words.collect(),
                }
            }
        };

        let resolver = match self.resolver_type.as_str() {
            "system" => ResolverConfig::System,
            _ => ResolverConfig::Dig {
                program: self.dig_path.clone(),
            },
        };

        let config = DiagConfig {
            event_log: EventLogConfig::File {
                v4_path: self.log_v4.clone(),
                v6_path: self.log_v6.clone(),
            },
            auth,
            registrar,
            resolver,
            lookup: LookupConfig {
                timeout_secs: self.lookup_timeout_secs,
                fallback_domains: self.domains.clone(),
            },
            view: ViewConfig {
                default_lines: self.default_lines,
                max_lines: self.max_lines,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DiagExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DiagExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DiagExitCode::ConfigError.into();
    }

    info!("Starting ddnsdiagd daemon");

    let diag_config = match config.to_diag_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DiagExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DiagExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let (service, events) = match build_service(diag_config) {
            Ok(built) => built,
            Err(e) => {
                error!("Startup error: {}", e);
                return DiagExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(&config.bind, service, events).await {
            error!("Daemon error: {:#}", e);
            DiagExitCode::RuntimeError
        } else {
            DiagExitCode::CleanShutdown
        }
    })
    .into()
}

/// Register all lookup backends and create the service from configuration
fn build_service(
    config: DiagConfig,
) -> Result<(DiagnosticService, mpsc::Receiver<ServiceEvent>)> {
    let registry = LookupRegistry::with_builtin_logs();

    ddns_diag_lookup::register(&registry);

    #[cfg(feature = "http")]
    ddns_diag_registrar_http::register(&registry);

    info!(
        "Event log: {}, registrar: {}, resolver: {}",
        config.event_log.type_name(),
        config.registrar.type_name(),
        config.resolver.type_name()
    );

    let event_log = registry.create_event_log(&config.event_log)?;
    let registrar = registry.create_registrar(&config.registrar)?;
    let resolver = registry.create_resolver(&config.resolver)?;

    let (service, events) = DiagnosticService::new(
        Arc::from(event_log),
        Arc::from(registrar),
        Arc::from(resolver),
        config,
    )?;

    Ok((service, events))
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(
    bind: &str,
    service: DiagnosticService,
    mut events: mpsc::Receiver<ServiceEvent>,
) -> Result<()> {
    let shutdown = shutdown_signal()?;

    // Drain service events into the log
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Service event: {:?}", event);
        }
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    let server = web::Server::new(Arc::new(service));
    server.serve(listener, shutdown).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Resolve on SIGTERM or SIGINT, yielding the signal name
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Resolve on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    })
}
