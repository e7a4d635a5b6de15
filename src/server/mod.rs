mod handlers;
mod state;

use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::Pipeline;

pub use handlers::SESSION_HEADER;
pub use state::{AppState, SessionRegistry};

pub fn build_router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState::new(pipeline));

    Router::new()
        .route("/weather-forecast", post(handlers::weather_forecast))
        .route("/country_response", post(handlers::country_list))
        .route("/province_response", post(handlers::province_list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, pipeline: Pipeline) -> std::io::Result<()> {
    let app = build_router(pipeline);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Forecast relay listening on http://{}", addr);
    axum::serve(listener, app).await
}
