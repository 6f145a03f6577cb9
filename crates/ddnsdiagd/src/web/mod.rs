//! Web server module.

mod handlers;
mod render;

use axum::{Router, routing::get};
use ddns_diag_core::DiagnosticService;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Upper bound on draining open connections after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DiagnosticService>,
}

/// Web server for the diagnostics endpoint.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server around the given service.
    pub fn new(service: Arc<DiagnosticService>) -> Self {
        Self {
            state: AppState { service },
        }
    }

    /// Build the router.
    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::handle_root))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then drain open connections.
    ///
    /// Fails if draining takes longer than [`SHUTDOWN_TIMEOUT`].
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = &'static str> + Send,
    {
        info!("Web server listening on {}", listener.local_addr()?);

        let drain = Arc::new(Notify::new());
        let server = axum::serve(listener, self.routes())
            .with_graceful_shutdown({
                let drain = drain.clone();
                async move { drain.notified().await }
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result?,
            signal = shutdown => {
                info!("Received shutdown signal: {}", signal);
                drain.notify_one();

                match tokio::time::timeout(SHUTDOWN_TIMEOUT, server).await {
                    Ok(result) => result?,
                    Err(_) => anyhow::bail!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT),
                }
            }
        }

        info!("Web server stopped");
        Ok(())
    }
}
