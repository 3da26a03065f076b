//! JSON HTTP API over the resolver and reader.

mod handlers;
mod state;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{LocationResponse, SaveRequest, SaveResponse};
pub use state::{AppState, SharedGeocoder, SharedStore};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/records/{id}/location",
            get(handlers::get_location)
                .put(handlers::put_location)
                .delete(handlers::delete_location),
        )
        .route("/api/records/{id}/address", get(handlers::get_address))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_router(Arc::new(state));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind to {}", addr))?;

    info!("location geometry server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
