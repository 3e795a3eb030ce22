use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bridge_correlation::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Dedup(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "dedup_store_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
