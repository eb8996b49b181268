//! `api` crate: HTTP boundary in front of the run engine.
//!
//! Exposes:
//!   POST   /api/flows
//!   GET    /api/flows
//!   GET    /api/flows/{id}
//!   POST   /api/flows/{id}/trigger
//!   GET    /api/runs/{id}

pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use engine::{Dispatcher, FlowStore, RunStore};

pub use error::ApiError;

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub flows: Arc<dyn FlowStore>,
    pub runs: Arc<dyn RunStore>,
    pub dispatcher: Dispatcher,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/flows", post(handlers::flows::create).get(handlers::flows::list))
        .route("/api/flows/:id", get(handlers::flows::get))
        .route("/api/flows/:id/trigger", post(handlers::runs::trigger))
        .route("/api/runs/:id", get(handlers::runs::get))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `bind` until `shutdown` resolves.
pub async fn serve(
    bind: &str,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("api listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
