//! Router construction for the registry server.

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::allow_list::AllowList;
use crate::service::ExperimentRegistry;

/// Build the axum router: one `/experiments` resource.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// allow-list can see peer addresses.
pub fn build_router(registry: Arc<ExperimentRegistry>, allow: AllowList) -> Router {
    Router::new()
        .route(
            "/experiments",
            get(handlers::list_experiments)
                .post(handlers::create_experiment)
                .put(handlers::update_experiment),
        )
        .layer(Extension(allow))
        .layer(Extension(registry))
        .layer(TraceLayer::new_for_http())
}
