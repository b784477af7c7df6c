use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use sreagent_collector::exporter::render_registry;

/// Router exposing `registry` in the text exposition format at `path`.
pub fn metrics_router(path: &str, registry: Registry) -> Router {
    Router::new()
        .route(path, get(serve_metrics))
        .with_state(registry)
}

async fn serve_metrics(State(registry): State<Registry>) -> Response {
    match render_registry(&registry) {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
