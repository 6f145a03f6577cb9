// # HTTP Registrar Lookup
//
// This crate provides a registrar lookup that fetches the domain → IP
// mapping from an HTTP(S) endpoint instead of a local client command.
//
// ## Expected Response
//
// A JSON object, in the registrar's domain order:
//
// ```json
// {"www.example.net": "203.0.113.5", "old.example.net": null}
// ```

use ddns_diag_core::LookupRegistry;
use ddns_diag_core::config::RegistrarConfig;
use ddns_diag_core::traits::{
    RegistrarLookup, RegistrarLookupFactory, RegistrarSnapshot, snapshot_from_json,
};
use ddns_diag_core::{Error, Result};

use std::time::Duration;

/// Request timeout of the HTTP client
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP-based registrar lookup
pub struct HttpRegistrar {
    /// URL to fetch the mapping from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpRegistrar {
    /// Create a new HTTP registrar lookup
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl RegistrarLookup for HttpRegistrar {
    async fn registered_ips(&self) -> Result<RegistrarSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::external_tool("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::external_tool(
                "http",
                format!("HTTP error: {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::external_tool("http", format!("Failed to read response: {}", e)))?;

        let snapshot = snapshot_from_json("http", &body)?;
        tracing::debug!("Registrar at {} listed {} domain(s)", self.url, snapshot.len());
        Ok(snapshot)
    }

    fn lookup_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP registrar lookups
pub struct HttpRegistrarFactory;

impl RegistrarLookupFactory for HttpRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn RegistrarLookup>> {
        match config {
            RegistrarConfig::Http { url } => Ok(Box::new(HttpRegistrar::new(url.clone()))),
            _ => Err(Error::config("Invalid config for HTTP registrar")),
        }
    }
}

/// Register the HTTP registrar lookup with a registry
pub fn register(registry: &LookupRegistry) {
    registry.register_registrar("http", Box::new(HttpRegistrarFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/ips", addr)
    }

    #[test]
    fn test_factory_creation() {
        let factory = HttpRegistrarFactory;

        let config = RegistrarConfig::Http {
            url: "https://registrar.example.net/ips".to_string(),
        };
        assert!(factory.create(&config).is_ok());
        assert!(factory.create(&RegistrarConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_fetches_ordered_snapshot() {
        let app = Router::new().route(
            "/ips",
            get(|| async { r#"{"www.example.net":"203.0.113.5","a.example.net":null}"# }),
        );
        let registrar = HttpRegistrar::new(serve(app).await);

        let snapshot = registrar.registered_ips().await.unwrap();
        assert_eq!(snapshot[0], ("www.example.net".into(), "203.0.113.5".into()));
        assert_eq!(snapshot[1], ("a.example.net".into(), String::new()));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let app = Router::new().route(
            "/ips",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let registrar = HttpRegistrar::new(serve(app).await);

        assert!(matches!(
            registrar.registered_ips().await,
            Err(Error::ExternalTool { .. })
        ));
    }
}
