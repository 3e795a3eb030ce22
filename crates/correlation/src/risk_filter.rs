//! Risk filter: which vessels count as critically delayed.

use core::str::FromStr;

use serde::Serialize;

use bridge_core::{DomainError, DomainResult};

use crate::model::VesselRisk;

/// Score a vessel must strictly exceed to be critical, on the canonical 0–100 scale.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RiskThreshold(f64);

impl RiskThreshold {
    pub const DEFAULT: f64 = 75.0;

    pub fn new(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("risk threshold must be a finite number"));
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(DomainError::validation(format!(
                "risk threshold {value} is outside the 0-100 scale"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for RiskThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl FromStr for RiskThreshold {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s
            .trim()
            .parse::<f64>()
            .map_err(|e| DomainError::validation(format!("risk threshold `{s}`: {e}")))?;
        Self::new(v)
    }
}

impl core::fmt::Display for RiskThreshold {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Selects critical vessels.
///
/// Critical means `risk_score > threshold` or a `risk_level` of "critical".
#[derive(Debug, Copy, Clone, Default)]
pub struct RiskFilter {
    threshold: RiskThreshold,
}

impl RiskFilter {
    pub fn new(threshold: RiskThreshold) -> Self {
        Self { threshold }
    }

    pub fn is_critical(&self, vessel: &VesselRisk) -> bool {
        vessel.risk_score > self.threshold.value()
            || vessel.risk_level.as_ref().is_some_and(|l| l.is_critical())
    }

    pub fn critical<'a>(&self, vessels: &'a [VesselRisk]) -> Vec<&'a VesselRisk> {
        vessels.iter().filter(|v| self.is_critical(v)).collect()
    }
}
