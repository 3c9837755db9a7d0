//! Application startup and lifecycle management.

use crate::config::BillingConfig;
use crate::handlers::{
    analytics::analytics_summary,
    clients::{create_client, delete_client, get_client, list_clients, set_status},
    health::{health_check, metrics_endpoint, readiness_check},
    invoices::{build_invoice, send_invoice},
    payments::{apply_payment, list_payments},
};
use crate::services::{
    metrics::track_metrics, Database, EmailSender, InvoiceBuilder, LedgerService, LedgerStore,
    MemoryStore, MockEmailSender, PaymentService, SmtpSender,
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BillingConfig,
    pub store: Arc<dyn LedgerStore>,
    pub ledger: LedgerService,
    pub payments: PaymentService,
    pub invoices: InvoiceBuilder,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn new(
        config: BillingConfig,
        store: Arc<dyn LedgerStore>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let ledger = LedgerService::new(store.clone());
        let payments = PaymentService::new(store.clone());
        let invoices = InvoiceBuilder::new(config.org.clone());
        Self {
            config,
            store,
            ledger,
            payments,
            invoices,
            mailer,
        }
    }
}

/// Build the HTTP router for the billing API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/clients", post(create_client).get(list_clients))
        .route(
            "/clients/:client_id",
            get(get_client).delete(delete_client),
        )
        .route("/clients/:client_id/status", put(set_status))
        .route(
            "/clients/:client_id/payments",
            post(apply_payment).get(list_payments),
        )
        .route("/clients/:client_id/invoice", get(build_invoice))
        .route("/clients/:client_id/invoice/send", post(send_invoice))
        .route("/analytics", get(analytics_summary))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// With no `DATABASE_URL` the in-memory store is used; with SMTP
    /// disabled (or failing to initialize) the mock sender is used. Both
    /// mirror the real collaborators exactly at the trait seam.
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        let store: Arc<dyn LedgerStore> = match &config.database.url {
            Some(url) => {
                let db = Database::new(
                    url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await?;
                db.run_migrations().await?;
                Arc::new(db)
            }
            None => {
                tracing::info!("DATABASE_URL not set, using in-memory ledger store");
                Arc::new(MemoryStore::new())
            }
        };

        let mailer: Arc<dyn EmailSender> = if config.smtp.enabled {
            match SmtpSender::new(config.smtp.clone()) {
                Ok(sender) => {
                    tracing::info!("SMTP email sender initialized");
                    Arc::new(sender)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP sender: {}. Using mock.", e);
                    Arc::new(MockEmailSender::new(true))
                }
            }
        } else {
            tracing::info!("SMTP disabled, using mock email sender");
            Arc::new(MockEmailSender::new(true))
        };

        let state = AppState::new(config.clone(), store, mailer);

        // Port 0 = random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("billing-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
