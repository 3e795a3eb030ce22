use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};

use bridge_correlation::ConflictReport;

use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/history", get(get_history))
        .route("/keys", get(get_keys))
}

/// Alert reports emitted by this process, oldest first.
pub async fn get_history(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Vec<ConflictReport>> {
    Json(services.sink.history())
}

pub async fn get_keys(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<dto::AlertKeysResponse> {
    let keys = services.alert_keys();
    Json(dto::AlertKeysResponse {
        count: keys.len(),
        keys,
    })
}
