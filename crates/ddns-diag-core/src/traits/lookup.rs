// # Lookup Traits
//
// Narrow capability interfaces for the two external sources the
// reconciliation view compares against:
//
// - `RegistrarLookup`: what the registrar believes each domain points at
// - `DomainResolver`: what public DNS currently answers for a domain
//
// ## Implementations
//
// - Command-based registrar, `dig` resolver, system resolver: `ddns-diag-lookup` crate
// - HTTP JSON registrar: `ddns-diag-registrar-http` crate

use async_trait::async_trait;

/// Registrar view of the managed domains, in the order the registrar listed them
///
/// Values are raw strings as reported; they may be empty or not an IP at all.
pub type RegistrarSnapshot = Vec<(String, String)>;

/// Trait for registrar lookups
///
/// # Trust Level: Untrusted
///
/// Registrar lookups wrap external tools or services. They:
/// - ✅ Return whatever mapping the registrar reported, unvalidated
/// - ❌ Must not retry or cache between requests
/// - ❌ Must not enforce their own timeout policy (the `Reconciler` bounds every call)
#[async_trait]
pub trait RegistrarLookup: Send + Sync {
    /// Fetch the current domain → registered IP mapping
    async fn registered_ips(&self) -> Result<RegistrarSnapshot, crate::Error>;

    /// Name for logging
    fn lookup_name(&self) -> &'static str;
}

/// Trait for live DNS resolution
///
/// Same trust rules as [`RegistrarLookup`].
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Resolve a domain, returning the raw answer or an empty string
    async fn resolve(&self, domain: &str) -> Result<String, crate::Error>;

    /// Name for logging
    fn resolver_name(&self) -> &'static str;
}

/// Helper trait for constructing registrar lookups from configuration
pub trait RegistrarLookupFactory: Send + Sync {
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
    ) -> Result<Box<dyn RegistrarLookup>, crate::Error>;
}

/// Helper trait for constructing resolvers from configuration
pub trait DomainResolverFactory: Send + Sync {
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Box<dyn DomainResolver>, crate::Error>;
}

/// Parse a registrar's JSON object of domain → IP, keeping its order
///
/// Values that are not strings (e.g. `null` for an unregistered domain)
/// become empty strings.
pub fn snapshot_from_json(tool: &str, raw: &str) -> Result<RegistrarSnapshot, crate::Error> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|e| crate::Error::external_tool(tool, format!("Invalid JSON: {}", e)))?;

    let serde_json::Value::Object(map) = value else {
        return Err(crate::Error::external_tool(
            tool,
            "Expected a JSON object of domain → IP",
        ));
    };

    Ok(map
        .into_iter()
        .map(|(domain, ip)| match ip {
            serde_json::Value::String(ip) => (domain, ip),
            _ => (domain, String::new()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keeps_registrar_order() {
        let raw = r#"{"zeta.example.net":"203.0.113.5","alpha.example.net":null,"mid.example.net":"x"}"#;
        let snapshot = snapshot_from_json("test", raw).unwrap();

        assert_eq!(
            snapshot,
            vec![
                ("zeta.example.net".to_string(), "203.0.113.5".to_string()),
                ("alpha.example.net".to_string(), String::new()),
                ("mid.example.net".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_snapshot_rejects_non_objects() {
        assert!(snapshot_from_json("test", "[1,2]").is_err());
        assert!(snapshot_from_json("test", "").is_err());
    }
}
