pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use faktura_core::middleware::tracing::request_id_middleware;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{init_metrics, Database, DocumentStore, WebhookVerifier};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub verifier: WebhookVerifier,
}

/// Build the HTTP router over an already-constructed state. Split out
/// of [`Application::build`] so tests can drive the exact production
/// routing against an in-memory store.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route("/documents/:id", get(handlers::documents::get_document))
        .route("/quotes/:id/status", post(handlers::quotes::update_quote_status))
        .route("/webhooks/payment", post(handlers::webhooks::payment_webhook))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        db.run_migrations().await?;

        let verifier = WebhookVerifier::new(config.webhook.secret.clone());
        if verifier.is_configured() {
            tracing::info!("Webhook verifier initialized");
        } else {
            tracing::warn!(
                "FAKTURA_WEBHOOK_SECRET not configured - payment webhooks will be rejected"
            );
        }

        let state = AppState {
            config: config.clone(),
            store: Arc::new(db),
            verifier,
        };

        let router = app_router(state);

        // Port 0 binds a random free port, which tests rely on.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
