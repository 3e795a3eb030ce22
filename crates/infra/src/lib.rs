//! Infrastructure layer: config, feed files, durable dedup, scheduled runs.

pub mod config;
pub mod dedup;
pub mod feeds;
pub mod runner;


pub use config::{BridgeConfig, ConfigError, FeedPaths};
pub use dedup::JsonFileDedupStore;
pub use feeds::JsonFileSource;
pub use runner::{
    run_alert_pass, ConflictAlertRunner, ConflictAlertRunnerHandle, ConflictSink,
    InMemoryConflictSink, LogConflictSink,
};

use std::sync::Arc;

use bridge_correlation::{CorrelationEngine, SourceSet};

/// Feed names as they appear in logs and report stats.
pub const VESSEL_RISK_FEED: &str = "risk_alerts";
pub const CATEGORY_MAPPING_FEED: &str = "supply_chain_map";
pub const STOCKOUT_PREDICTIONS_FEED: &str = "stockout_predictions";

/// Wire the JSON-file feeds named in `cfg` into an engine.
pub fn build_engine(cfg: &BridgeConfig) -> CorrelationEngine {
    let sources = SourceSet::new(
        Arc::new(JsonFileSource::new(VESSEL_RISK_FEED, &cfg.feeds.vessel_risk)),
        Arc::new(JsonFileSource::new(CATEGORY_MAPPING_FEED, &cfg.feeds.category_mapping)),
        Arc::new(JsonFileSource::new(STOCKOUT_PREDICTIONS_FEED, &cfg.feeds.stockout_predictions)),
    );
    CorrelationEngine::new(sources).with_settings(cfg.engine_settings())
}
