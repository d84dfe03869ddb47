pub mod error;
pub mod volumes;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, middleware::basic_auth};

/// 所有路由（统一入口）
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(volumes::metrics_handler))
        .merge(volumes::routes())
        // 需要认证的路由
        .nest(
            "/sec",
            volumes::secured_routes().layer(from_fn_with_state(state.clone(), basic_auth)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}
