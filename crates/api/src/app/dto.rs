use serde::{Deserialize, Serialize};

use bridge_correlation::RiskThreshold;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Query string for `GET /conflicts/summary`.
///
/// The threshold is kept as text so a bad value maps to our own 400 body instead of
/// the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub threshold: Option<String>,
}

impl SummaryQuery {
    pub fn threshold_or(
        &self,
        default: RiskThreshold,
    ) -> Result<RiskThreshold, axum::response::Response> {
        match self.threshold.as_deref() {
            None => Ok(default),
            Some(raw) => raw.parse::<RiskThreshold>().map_err(|e| {
                errors::json_error(
                    axum::http::StatusCode::BAD_REQUEST,
                    "invalid_threshold",
                    e.to_string(),
                )
            }),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AlertKeysResponse {
    pub count: usize,
    pub keys: Vec<String>,
}
