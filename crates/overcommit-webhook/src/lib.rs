mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc};

use ::tracing::info;
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use overcommit_evaluator::ReviewPipeline;
use tokio::signal;
use tower_http::trace::{self, TraceLayer};

use crate::api::{
    handlers::{readiness_handler, review_handler},
    state::ApiServerState,
};
use crate::config::Config;

/// The admission webhook: one review pipeline behind an HTTP(S) endpoint.
pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl WebhookServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let pipeline = ReviewPipeline::new(config.policy.build());
        info!(
            service = config::SERVICE_NAME,
            host = config::HOSTNAME.as_str(),
            policy = pipeline.policy_name(),
            "policy loaded"
        );

        let state = Arc::new(ApiServerState { pipeline });

        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(certs::create_tls_config(tls_config).await?),
            None => None,
        };

        Ok(Self {
            router: router(state),
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(shutdown_on_signal(handle.clone()));

        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }
        info!("server stopped");

        Ok(())
    }
}

fn router(state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route("/", post(review_handler))
        .route("/validate", post(review_handler))
        .route("/readiness", get(readiness_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(::tracing::Level::DEBUG))
                .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::DEBUG)),
        )
}

async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            ::tracing::error!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                ::tracing::error!(error = %e, "cannot listen for SIGTERM");
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

    info!("shutdown signal received, draining connections");
    handle.graceful_shutdown(None);
}
