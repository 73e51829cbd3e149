use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    add_handler, health_handler, list_handler, method_not_allowed_handler, metrics_handler,
    not_found_handler, remove_handler, AppState,
};

/// Paths served by one listener; `None` leaves the endpoint off that listener
#[derive(Debug, Clone, Copy, Default)]
pub struct Endpoints<'a> {
    pub metrics: Option<&'a str>,
    pub control: Option<&'a str>,
}

pub fn create_router(state: AppState, endpoints: Endpoints<'_>) -> Router {
    let mut router = Router::new().route("/health", get(health_handler));

    if let Some(path) = endpoints.metrics {
        router = router.route(path, get(metrics_handler).fallback(method_not_allowed_handler));
    }

    if let Some(path) = endpoints.control {
        router = router.route(
            path,
            get(list_handler)
                .post(add_handler)
                .delete(remove_handler)
                // HEAD would otherwise be answered by the GET handler
                .head(method_not_allowed_handler)
                .fallback(method_not_allowed_handler),
        );
    }

    router
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
