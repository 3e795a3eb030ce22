use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum::response::IntoResponse;

use bridge_correlation::{ConflictReport, EngineError};
use bridge_infra::{run_alert_pass, ConflictSink};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/alerts", post(run_alerts))
}

pub async fn get_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SummaryQuery>,
) -> axum::response::Response {
    let threshold = match query.threshold_or(services.threshold) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let result = blocking(move || services.engine.summarize(threshold)).await;
    match result {
        Ok(report) => Json(report).into_response(),
        Err(resp) => resp,
    }
}

/// Run alert mode now. New conflicts are recorded in the shared store and appended
/// to the history, exactly as a scheduled pass would.
pub async fn run_alerts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let svc = services.clone();
    let result = blocking(move || run_alert_pass(&svc.engine, svc.threshold, &*svc.store)).await;

    match result {
        Ok(report) => {
            if !report.is_empty() {
                services.sink.emit(report.clone());
            }
            Json(report).into_response()
        }
        Err(resp) => resp,
    }
}

/// Engine passes read files and take a std mutex; keep them off the async workers.
async fn blocking<F>(f: F) -> Result<ConflictReport, axum::response::Response>
where
    F: FnOnce() -> Result<ConflictReport, EngineError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(errors::engine_error_to_response(e)),
        Err(e) => Err(errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            e.to_string(),
        )),
    }
}
