//! Engine output: conflict mode, the conflict list, run statistics and the report
//! handed to reporting collaborators.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use bridge_core::{normalize_key, DomainError};

use crate::aggregate::{Conflict, ConflictSummary};
use crate::dedup::DedupError;
use crate::risk_filter::RiskThreshold;

/// How the engine aggregates conflicts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictMode {
    /// Vessel counts per category; ignores the dedup store.
    Summary,
    /// New (vessel, category) pairs only; records them in the dedup store.
    Alert,
}

impl FromStr for ConflictMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "summary" => Ok(ConflictMode::Summary),
            "alert" | "alerts" => Ok(ConflictMode::Alert),
            other => Err(DomainError::validation(format!("unknown conflict mode `{other}`"))),
        }
    }
}

/// Identifier of one engine invocation (for correlating logs and reports).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Ordered conflict output, shaped by mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "conflicts", rename_all = "snake_case")]
pub enum ConflictList {
    Summary(Vec<ConflictSummary>),
    Alert(Vec<Conflict>),
}

impl ConflictList {
    pub fn empty(mode: ConflictMode) -> Self {
        match mode {
            ConflictMode::Summary => ConflictList::Summary(Vec::new()),
            ConflictMode::Alert => ConflictList::Alert(Vec::new()),
        }
    }

    pub fn mode(&self) -> ConflictMode {
        match self {
            ConflictList::Summary(_) => ConflictMode::Summary,
            ConflictList::Alert(_) => ConflictMode::Alert,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ConflictList::Summary(rows) => rows.len(),
            ConflictList::Alert(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters collected while running the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub vessels_read: usize,
    pub vessels_skipped: usize,
    pub mappings_read: usize,
    pub mappings_skipped: usize,
    pub predictions_read: usize,
    pub predictions_skipped: usize,
    pub critical_vessels: usize,
    pub unmapped_critical_vessels: usize,
    pub categories_at_risk: usize,
    pub conflicts_found: usize,
    pub conflicts_suppressed: usize,
    /// Daily-window keys from past days dropped from the store.
    pub keys_expired: usize,
    /// Names of feeds that could not be fetched this run.
    pub sources_unavailable: Vec<String>,
}

/// Output of one `compute_conflicts` call.
///
/// An empty `conflicts` list is the signal that no report should be generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub threshold: RiskThreshold,
    #[serde(flatten)]
    pub conflicts: ConflictList,
    pub stats: RunStats,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn mode(&self) -> ConflictMode {
        self.conflicts.mode()
    }

    /// One-line description for logs.
    pub fn explanation(&self) -> String {
        format!(
            "{} {} conflict(s) from {} critical vessel(s) and {} at-risk categor(y/ies) (threshold={}, suppressed={})",
            self.conflicts.len(),
            match self.mode() {
                ConflictMode::Summary => "summarized",
                ConflictMode::Alert => "new",
            },
            self.stats.critical_vessels,
            self.stats.categories_at_risk,
            self.threshold,
            self.stats.conflicts_suppressed,
        )
    }
}

/// Failure of an engine pass. Feed problems never surface here; they yield an
/// empty report instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Dedup(#[from] DedupError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_mode_next_to_conflicts() {
        let report = ConflictReport {
            run_id: RunId::new(),
            generated_at: Utc::now(),
            threshold: RiskThreshold::default(),
            conflicts: ConflictList::empty(ConflictMode::Summary),
            stats: RunStats::default(),
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["mode"], "summary");
        assert!(v["conflicts"].as_array().unwrap().is_empty());
        assert_eq!(v["threshold"], 75.0);
    }

    #[test]
    fn mode_parses() {
        assert_eq!("ALERT".parse::<ConflictMode>().unwrap(), ConflictMode::Alert);
        assert!("digest".parse::<ConflictMode>().is_err());
    }
}
