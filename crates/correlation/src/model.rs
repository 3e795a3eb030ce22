//! Strict record types produced by the normalizer.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bridge_core::{normalize_key, CategoryName, DomainError, VesselId};

/// Scale a risk feed publishes its scores on.
///
/// Everything downstream of ingestion works on the canonical 0–100 scale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// Scores already in 0–100.
    #[default]
    Percent,
    /// Scores in 0–1; multiplied by 100 at ingestion.
    Fraction,
}

impl ScoreScale {
    /// Convert a raw feed score to the canonical 0–100 scale.
    pub fn to_canonical(self, raw: f64) -> f64 {
        match self {
            ScoreScale::Percent => raw,
            ScoreScale::Fraction => raw * 100.0,
        }
    }
}

impl FromStr for ScoreScale {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "percent" | "0-100" => Ok(ScoreScale::Percent),
            "fraction" | "0-1" => Ok(ScoreScale::Fraction),
            other => Err(DomainError::validation(format!(
                "unknown score scale `{other}` (expected `percent` or `fraction`)"
            ))),
        }
    }
}

/// Categorical risk level published alongside the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    /// Any other label, lower-cased.
    Other(String),
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Self {
        let key = normalize_key(raw);
        if key == "critical" {
            RiskLevel::Critical
        } else {
            RiskLevel::Other(key)
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, RiskLevel::Critical)
    }
}

/// Delay risk for one vessel (one feed row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselRisk {
    pub vessel: VesselId,
    /// Canonical 0–100 score.
    pub risk_score: f64,
    pub risk_level: Option<RiskLevel>,
}

/// "This vessel carries this category."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub vessel: VesselId,
    pub category: CategoryName,
}

/// Forecast row for one category within the stockout horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockoutPrediction {
    pub category: CategoryName,
    pub stockout_flag: f64,
    pub item_count: Option<u64>,
}

impl StockoutPrediction {
    /// A flag of 1 or more means a stockout is predicted inside the horizon.
    pub fn predicts_stockout(&self) -> bool {
        self.stockout_flag >= 1.0
    }
}
