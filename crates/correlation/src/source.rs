//! Feed boundary: where raw record sets come from.
//!
//! This crate stays storage-agnostic. Sources are provided by callers (infra reads
//! sheet exports from disk; tests use in-memory sources).

use std::sync::{Arc, RwLock};

use thiserror::Error;

use bridge_core::RawRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source `{name}` unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("source `{name}` returned a malformed payload: {reason}")]
    Malformed { name: String, reason: String },
}

impl SourceError {
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// One upstream feed (a spreadsheet tab, an export file, ...).
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;

    /// Read the feed fresh. No caching across calls.
    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// The three feeds the engine joins.
#[derive(Clone)]
pub struct SourceSet {
    pub vessel_risk: Arc<dyn RecordSource>,
    pub category_mapping: Arc<dyn RecordSource>,
    pub stockout_predictions: Arc<dyn RecordSource>,
}

impl SourceSet {
    pub fn new(
        vessel_risk: Arc<dyn RecordSource>,
        category_mapping: Arc<dyn RecordSource>,
        stockout_predictions: Arc<dyn RecordSource>,
    ) -> Self {
        Self {
            vessel_risk,
            category_mapping,
            stockout_predictions,
        }
    }
}

impl core::fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SourceSet")
            .field("vessel_risk", &self.vessel_risk.name())
            .field("category_mapping", &self.category_mapping.name())
            .field("stockout_predictions", &self.stockout_predictions.name())
            .finish()
    }
}

/// In-memory source for tests/dev. Contents can be swapped between runs.
#[derive(Debug, Default)]
pub struct InMemorySource {
    name: String,
    records: RwLock<Vec<RawRecord>>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }

    pub fn replace(&self, records: Vec<RawRecord>) {
        *self.records.write().unwrap_or_else(|e| e.into_inner()) = records;
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.records.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}
