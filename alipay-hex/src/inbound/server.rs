//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use alipay_types::GatewayRepository;

use super::handlers::{self, AppState};
use crate::service::{NOTIFY_PATH, RETURN_PATH};
use crate::GatewayService;

/// HTTP Server for the gateway endpoints.
pub struct HttpServer<R: GatewayRepository> {
    state: Arc<AppState<R>>,
}

impl<R: GatewayRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: GatewayService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // HTTP metrics layer (uses the globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        Router::new()
            .route("/health", get(handlers::health))
            .route("/payment/providers", get(handlers::list_providers::<R>))
            .route("/api/transactions", post(handlers::create_transaction::<R>))
            .route(
                "/payment/alipay/redirect/{id}",
                get(handlers::redirect_form::<R>),
            )
            .route(NOTIFY_PATH, post(handlers::notify::<R>))
            .route(
                RETURN_PATH,
                get(handlers::payment_return::<R>).post(handlers::payment_return_form::<R>),
            )
            .layer(metrics)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
