use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health;
use super::middleware::{logging_middleware, request_span};
use super::providers;
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Builds the full router. The metrics route is only mounted when a
/// recorder was installed.
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Dashboard data
        .nest("/api", providers::create_provider_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span));

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m, metrics_path));
    }

    router
}
