//! `bridge-correlation`
//!
//! **Responsibility:** the risk-correlation engine.
//!
//! Joins vessel delay risk, category stockout forecasts and the vessel→category
//! mapping into conflicts, then ranks them (summary) or deduplicates them against
//! previously reported alerts (alert).
//!
//! This crate is deliberately free of I/O:
//! - Feeds come in through [`RecordSource`].
//! - Alert memory goes through [`DedupStore`].
//! - Turning a [`ConflictReport`] into a message is the caller's job.

pub mod aggregate;
pub mod dedup;
pub mod engine;
pub mod model;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod risk_filter;
pub mod source;
pub mod stockout;

pub use aggregate::{Conflict, ConflictSummary};
pub use dedup::{prune_expired, AlertKey, DedupError, DedupStore, DedupWindow, InMemoryDedupStore};
pub use engine::{correlate, CorrelationEngine, CorrelationInput, EngineSettings};
pub use model::{CategoryMapping, RiskLevel, ScoreScale, StockoutPrediction, VesselRisk};
pub use normalize::Normalizer;
pub use report::{ConflictList, ConflictMode, ConflictReport, EngineError, RunId, RunStats};
pub use resolver::CategoryIndex;
pub use risk_filter::{RiskFilter, RiskThreshold};
pub use source::{InMemorySource, RecordSource, SourceError, SourceSet};
pub use stockout::StockoutIndex;
