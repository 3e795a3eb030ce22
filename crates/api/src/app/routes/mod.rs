use axum::Router;

pub mod alerts;
pub mod conflicts;
pub mod system;

/// Router for all query endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/conflicts", conflicts::router())
        .nest("/alerts", alerts::router())
}
