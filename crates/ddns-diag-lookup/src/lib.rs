// # Command-based Lookups
//
// This crate provides the registrar lookup and DNS resolvers that shell out
// to local tools, plus a resolver backed by the operating system.
//
// ## Backends
//
// - `CommandRegistrar`: runs a registrar client (e.g. `ncdip -j`) that
//   prints a JSON object of domain → registered IP
// - `DigResolver`: `dig +noall +answer +short <domain>`
// - `SystemResolver`: `getaddrinfo` via tokio, no external tool needed
//
// ## Timeouts
//
// None of these enforce a timeout themselves. The `Reconciler` bounds every
// call, and child processes are killed when the bounded future is dropped.

use ddns_diag_core::LookupRegistry;
use ddns_diag_core::config::{RegistrarConfig, ResolverConfig};
use ddns_diag_core::model::validate_domain_name;
use ddns_diag_core::traits::{
    DomainResolver, DomainResolverFactory, RegistrarLookup, RegistrarLookupFactory,
    RegistrarSnapshot, snapshot_from_json,
};
use ddns_diag_core::{Error, Result};

use std::process::Stdio;
use tokio::process::Command;

/// Run a program and return its stdout
///
/// A non-zero exit status is an error carrying the first line of stderr.
async fn run_tool(tool: &str, program: &str, args: &[&str]) -> Result<String> {
    tracing::debug!("Running {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::external_tool(tool, format!("Failed to execute {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::external_tool(
            tool,
            format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.lines().next().unwrap_or("")
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Registrar lookup backed by a local command
pub struct CommandRegistrar {
    program: String,
    args: Vec<String>,
}

impl CommandRegistrar {
    /// Create a registrar lookup running `program args...`
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait::async_trait]
impl RegistrarLookup for CommandRegistrar {
    async fn registered_ips(&self) -> Result<RegistrarSnapshot> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        let stdout = run_tool(self.lookup_name(), &self.program, &args).await?;

        let snapshot = snapshot_from_json(self.lookup_name(), &stdout)?;
        tracing::debug!("Registrar listed {} domain(s)", snapshot.len());
        Ok(snapshot)
    }

    fn lookup_name(&self) -> &'static str {
        "command"
    }
}

/// Resolver running `dig`
pub struct DigResolver {
    program: String,
}

impl DigResolver {
    /// Create a resolver using the given `dig` binary
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl DomainResolver for DigResolver {
    async fn resolve(&self, domain: &str) -> Result<String> {
        // Registrar output is untrusted; never let it reach dig as an option
        validate_domain_name(domain)?;

        run_tool(
            self.resolver_name(),
            &self.program,
            &["+noall", "+answer", "+short", domain],
        )
        .await
    }

    fn resolver_name(&self) -> &'static str {
        "dig"
    }
}

/// Resolver using the operating system's resolver
///
/// Answers with one address per line, IPv4 first, so the last line is
/// preferred the same way as `dig` output.
#[derive(Debug, Default)]
pub struct SystemResolver;

#[async_trait::async_trait]
impl DomainResolver for SystemResolver {
    async fn resolve(&self, domain: &str) -> Result<String> {
        validate_domain_name(domain)?;

        let addrs = match tokio::net::lookup_host((domain, 0)).await {
            Ok(addrs) => addrs,
            Err(e) => {
                // NXDOMAIN and friends are an empty answer, like dig
                tracing::debug!("No answer for {}: {}", domain, e);
                return Ok(String::new());
            }
        };

        let mut ips: Vec<_> = addrs.map(|a| a.ip()).collect();
        ips.dedup();

        // Only IPv4 is compared against the registrar
        Ok(ips
            .iter()
            .filter(|ip| ip.is_ipv4())
            .map(|ip| format!("{}\n", ip))
            .collect())
    }

    fn resolver_name(&self) -> &'static str {
        "system"
    }
}

/// Factory for creating command registrars
pub struct CommandRegistrarFactory;

impl RegistrarLookupFactory for CommandRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn RegistrarLookup>> {
        match config {
            RegistrarConfig::Command { program, args } => {
                Ok(Box::new(CommandRegistrar::new(program.clone(), args.clone())))
            }
            _ => Err(Error::config("Invalid config for command registrar")),
        }
    }
}

/// Factory for creating dig resolvers
pub struct DigResolverFactory;

impl DomainResolverFactory for DigResolverFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn DomainResolver>> {
        match config {
            ResolverConfig::Dig { program } => Ok(Box::new(DigResolver::new(program.clone()))),
            _ => Err(Error::config("Invalid config for dig resolver")),
        }
    }
}

/// Factory for creating system resolvers
pub struct SystemResolverFactory;

impl DomainResolverFactory for SystemResolverFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn DomainResolver>> {
        match config {
            ResolverConfig::System => Ok(Box::new(SystemResolver)),
            _ => Err(Error::config("Invalid config for system resolver")),
        }
    }
}

/// Register the command registrar and both resolvers with a registry
pub fn register(registry: &LookupRegistry) {
    registry.register_registrar("command", Box::new(CommandRegistrarFactory));
    registry.register_resolver("dig", Box::new(DigResolverFactory));
    registry.register_resolver("system", Box::new(SystemResolverFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let registry = LookupRegistry::new();
        register(&registry);

        assert!(registry.create_registrar(&RegistrarConfig::default()).is_ok());
        assert!(registry.create_resolver(&ResolverConfig::System).is_ok());
        assert!(
            registry
                .create_resolver(&ResolverConfig::Dig {
                    program: "dig".into()
                })
                .is_ok()
        );
    }

    #[test]
    fn test_factory_rejects_foreign_config() {
        let factory = DigResolverFactory;
        assert!(factory.create(&ResolverConfig::System).is_err());
    }

    #[tokio::test]
    async fn test_dig_rejects_option_like_domain() {
        let resolver = DigResolver::new("/nonexistent/dig");
        let result = resolver.resolve("-f/etc/passwd").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_program_is_external_tool_error() {
        let registrar = CommandRegistrar::new("/nonexistent/ncdip", vec!["-j".into()]);
        let result = registrar.registered_ips().await;
        assert!(matches!(result, Err(Error::ExternalTool { .. })));
    }

    #[tokio::test]
    async fn test_system_resolver_localhost() {
        let answer = SystemResolver.resolve("localhost").await.unwrap();
        assert!(answer.lines().all(|l| l.parse::<std::net::IpAddr>().is_ok()));
    }
}
