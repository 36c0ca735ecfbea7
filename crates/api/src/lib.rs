//! HTTP API server for the gradebook service.
//!
//! Provides REST endpoints for authentication, students, marks, dashboards
//! and Excel exports, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::SchoolStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SchoolStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/me", get(routes::auth::me::<S>))
        .route(
            "/students",
            get(routes::students::list::<S>).post(routes::students::create::<S>),
        )
        .route(
            "/students/email/{email}",
            get(routes::students::get_by_email::<S>),
        )
        .route(
            "/students/{id}",
            get(routes::students::get::<S>)
                .put(routes::students::update::<S>)
                .delete(routes::students::delete::<S>),
        )
        .route(
            "/marks",
            get(routes::marks::list::<S>).post(routes::marks::create::<S>),
        )
        .route("/marks/download", get(routes::marks::download_all::<S>))
        .route(
            "/marks/student/{student_id}",
            get(routes::marks::for_student::<S>),
        )
        .route(
            "/marks/student/{student_id}/download",
            get(routes::marks::download_for_student::<S>),
        )
        .route(
            "/marks/{id}",
            get(routes::marks::get::<S>)
                .put(routes::marks::update::<S>)
                .delete(routes::marks::delete::<S>),
        )
        .route("/dashboard/stats", get(routes::dashboard::stats::<S>))
        .route("/dashboard/teachers", get(routes::dashboard::teachers::<S>))
        .route(
            "/dashboard/teacher/{teacher_id}/stats",
            get(routes::dashboard::teacher_stats::<S>),
        );

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .fallback(routes::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store.
pub fn create_state<S: SchoolStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, config))
}
