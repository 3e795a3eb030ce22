//! The correlation engine: fetch → normalize → filter → resolve → match → aggregate.
//!
//! Each call is a single synchronous pass with no state of its own; the dedup store
//! is the only thing that survives between calls, and the caller lends it for the
//! whole pass.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bridge_core::RawRecord;

use crate::aggregate::{collect_alerts, join, summarize};
use crate::dedup::{prune_expired, DedupStore, DedupWindow, InMemoryDedupStore};
use crate::model::ScoreScale;
use crate::normalize::Normalizer;
use crate::report::{ConflictList, ConflictMode, ConflictReport, EngineError, RunId, RunStats};
use crate::resolver::CategoryIndex;
use crate::risk_filter::{RiskFilter, RiskThreshold};
use crate::source::{RecordSource, SourceSet};
use crate::stockout::StockoutIndex;

/// Knobs that are fixed for a deployment (unlike the per-call threshold).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub scale: ScoreScale,
    pub window: DedupWindow,
}

/// Raw rows of the three feeds for one pass.
#[derive(Debug, Clone, Default)]
pub struct CorrelationInput {
    pub vessel_risk: Vec<RawRecord>,
    pub category_mapping: Vec<RawRecord>,
    pub stockout_predictions: Vec<RawRecord>,
}

/// Run the pipeline over already-fetched rows.
///
/// Any feed that is empty after normalization yields an empty list.
pub fn correlate<D: DedupStore + ?Sized>(
    input: &CorrelationInput,
    settings: EngineSettings,
    mode: ConflictMode,
    threshold: RiskThreshold,
    store: &mut D,
    now: DateTime<Utc>,
    stats: &mut RunStats,
) -> Result<ConflictList, EngineError> {
    let normalizer = Normalizer::new(settings.scale);
    let vessels = normalizer.vessel_risks(&input.vessel_risk);
    let mappings = normalizer.category_mappings(&input.category_mapping);
    let predictions = normalizer.stockout_predictions(&input.stockout_predictions);

    stats.vessels_read = vessels.records.len();
    stats.vessels_skipped = vessels.skipped;
    stats.mappings_read = mappings.records.len();
    stats.mappings_skipped = mappings.skipped;
    stats.predictions_read = predictions.records.len();
    stats.predictions_skipped = predictions.skipped;

    if vessels.is_empty() || mappings.is_empty() || predictions.is_empty() {
        debug!(
            vessels = vessels.records.len(),
            mappings = mappings.records.len(),
            predictions = predictions.records.len(),
            "a feed is empty after normalization; nothing to correlate"
        );
        return Ok(ConflictList::empty(mode));
    }

    let critical = RiskFilter::new(threshold).critical(&vessels.records);
    let categories = CategoryIndex::build(&mappings.records);
    let stockouts = StockoutIndex::build(&predictions.records);
    stats.critical_vessels = critical.len();
    stats.categories_at_risk = stockouts.at_risk_count();

    let joined = join(&critical, &categories, &stockouts);
    stats.unmapped_critical_vessels = joined.unmapped_vessels;
    stats.conflicts_found = joined.pairs.len();

    match mode {
        ConflictMode::Summary => Ok(ConflictList::Summary(summarize(&joined.pairs))),
        ConflictMode::Alert => {
            stats.keys_expired = prune_expired(store, settings.window, now)?;
            if stats.keys_expired > 0 {
                debug!(expired = stats.keys_expired, "pruned alert keys from past days");
            }
            let outcome = collect_alerts(&joined.pairs, store, settings.window, now)?;
            stats.conflicts_suppressed = outcome.suppressed;
            Ok(ConflictList::Alert(outcome.conflicts))
        }
    }
}

/// Engine bound to a set of feeds.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    sources: SourceSet,
    settings: EngineSettings,
}

impl CorrelationEngine {
    pub fn new(sources: SourceSet) -> Self {
        Self {
            sources,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_window(mut self, window: DedupWindow) -> Self {
        self.settings.window = window;
        self
    }

    /// Fetch all feeds and compute conflicts.
    ///
    /// A feed that fails to fetch is logged and recorded in the report stats; the
    /// result is then empty rather than an error. Errors only come from the dedup
    /// store in alert mode.
    pub fn compute_conflicts<D: DedupStore + ?Sized>(
        &self,
        mode: ConflictMode,
        threshold: RiskThreshold,
        store: &mut D,
    ) -> Result<ConflictReport, EngineError> {
        self.compute_conflicts_at(mode, threshold, store, Utc::now())
    }

    /// Same as [`CorrelationEngine::compute_conflicts`] with an explicit clock.
    pub fn compute_conflicts_at<D: DedupStore + ?Sized>(
        &self,
        mode: ConflictMode,
        threshold: RiskThreshold,
        store: &mut D,
        now: DateTime<Utc>,
    ) -> Result<ConflictReport, EngineError> {
        let run_id = RunId::new();
        let mut stats = RunStats::default();

        let conflicts = match self.fetch_input(&mut stats) {
            Some(input) => correlate(&input, self.settings, mode, threshold, store, now, &mut stats)?,
            None => ConflictList::empty(mode),
        };

        let report = ConflictReport {
            run_id,
            generated_at: now,
            threshold,
            conflicts,
            stats,
        };

        info!(
            run_id = %report.run_id,
            mode = ?mode,
            conflicts = report.conflicts.len(),
            "{}",
            report.explanation()
        );
        Ok(report)
    }

    /// Summary mode without a caller-provided store (summary never touches it).
    pub fn summarize(&self, threshold: RiskThreshold) -> Result<ConflictReport, EngineError> {
        let mut scratch = InMemoryDedupStore::new();
        self.compute_conflicts(ConflictMode::Summary, threshold, &mut scratch)
    }

    fn fetch_input(&self, stats: &mut RunStats) -> Option<CorrelationInput> {
        let vessel_risk = fetch_or_record(self.sources.vessel_risk.as_ref(), stats);
        let category_mapping = fetch_or_record(self.sources.category_mapping.as_ref(), stats);
        let stockout_predictions = fetch_or_record(self.sources.stockout_predictions.as_ref(), stats);

        Some(CorrelationInput {
            vessel_risk: vessel_risk?,
            category_mapping: category_mapping?,
            stockout_predictions: stockout_predictions?,
        })
    }
}

fn fetch_or_record(source: &dyn RecordSource, stats: &mut RunStats) -> Option<Vec<RawRecord>> {
    match source.fetch() {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!(source = source.name(), error = %e, "feed unavailable; skipping correlation");
            stats.sources_unavailable.push(source.name().to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::source::{InMemorySource, SourceError};

    struct DownSource;

    impl RecordSource for DownSource {
        fn name(&self) -> &str {
            "risk_alerts"
        }

        fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
            Err(SourceError::unavailable("risk_alerts", "sheet offline"))
        }
    }

    fn rows(values: serde_json::Value) -> Vec<RawRecord> {
        values
            .as_array()
            .unwrap()
            .iter()
            .cloned()
            .filter_map(RawRecord::from_value)
            .collect()
    }

    fn fleet() -> (Vec<RawRecord>, Vec<RawRecord>, Vec<RawRecord>) {
        let vessels = rows(json!([
            {"ship_name": "Megastar", "risk_score": 92, "risk_level": "HIGH"},
            {"ship_name": "Star", "risk_score": 40, "risk_level": "critical"},
            {"ship_name": "Finlandia", "risk_score": 75},
            {"ship_name": "Europa", "risk_score": 88},
        ]));
        let mapping = rows(json!([
            {"ship_name_raw": "Megastar", "assigned_category": "Electronics"},
            {"ship_name_raw": "MEGAStar", "assigned_category": "Electronics"},
            {"ship_name_raw": "Megastar", "assigned_category": "Toys"},
            {"ship_name_raw": "Star", "assigned_category": "Electronics"},
            {"ship_name_raw": "Star", "assigned_category": "Toys"},
            {"ship_name_raw": "Finlandia", "assigned_category": "Furniture"},
            {"ship_name_raw": "Europa", "assigned_category": "Groceries"},
        ]));
        let predictions = rows(json!([
            {"category": "Electronics", "stockout_14d_pred": 1, "item_count": 12},
            {"category": "Toys", "stockout_14d_pred": "1"},
            {"category": "Furniture", "stockout_14d_pred": 1},
            {"category": "Groceries", "stockout_14d_pred": 0},
        ]));
        (vessels, mapping, predictions)
    }

    fn engine() -> CorrelationEngine {
        let (v, m, p) = fleet();
        CorrelationEngine::new(SourceSet::new(
            Arc::new(InMemorySource::new("risk_alerts", v)),
            Arc::new(InMemorySource::new("supply_chain_map", m)),
            Arc::new(InMemorySource::new("stockout_predictions", p)),
        ))
    }

    #[test]
    fn summary_ranks_categories_by_vessel_count() {
        let report = engine().summarize(RiskThreshold::default()).unwrap();
        let ConflictList::Summary(rows) = &report.conflicts else {
            panic!("expected summary");
        };
        let got: Vec<(&str, usize)> = rows
            .iter()
            .map(|r| (r.category.display(), r.vessel_count))
            .collect();
        // Finlandia sits exactly on the threshold; Europa's category is not at risk.
        assert_eq!(got, vec![("Electronics", 2), ("Toys", 2)]);
        assert_eq!(report.stats.critical_vessels, 3);
    }

    #[test]
    fn alert_mode_emits_each_pair_once() {
        let engine = engine();
        let mut store = InMemoryDedupStore::new();

        let first = engine
            .compute_conflicts(ConflictMode::Alert, RiskThreshold::default(), &mut store)
            .unwrap();
        let second = engine
            .compute_conflicts(ConflictMode::Alert, RiskThreshold::default(), &mut store)
            .unwrap();

        let ConflictList::Alert(alerts) = &first.conflicts else {
            panic!("expected alerts");
        };
        let keys: Vec<&str> = alerts.iter().map(|c| c.alert_key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["megastar_electronics", "megastar_toys", "star_electronics", "star_toys"]
        );
        assert_eq!(alerts[0].items_at_risk, Some(12));
        assert!(second.is_empty());
        assert_eq!(second.stats.conflicts_suppressed, 4);
    }

    #[test]
    fn daily_window_realerts_next_day() {
        let engine = engine().with_window(DedupWindow::Daily);
        let mut store = InMemoryDedupStore::new();
        let day1 = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap();
        let t = RiskThreshold::default();

        let a = engine.compute_conflicts_at(ConflictMode::Alert, t, &mut store, day1).unwrap();
        let b = engine.compute_conflicts_at(ConflictMode::Alert, t, &mut store, day1).unwrap();
        let c = engine.compute_conflicts_at(ConflictMode::Alert, t, &mut store, day2).unwrap();

        assert_eq!(a.conflicts.len(), 4);
        assert!(b.is_empty());
        assert_eq!(c.conflicts.len(), 4);
        // Yesterday's keys are gone; the store only holds today's.
        assert_eq!(c.stats.keys_expired, 4);
        assert_eq!(store.len(), 4);
        assert!(store.keys().iter().all(|k| k.as_str().starts_with("2026-05-02:")));
    }

    #[test]
    fn unavailable_feed_yields_empty_report() {
        let (_, m, p) = fleet();
        let engine = CorrelationEngine::new(SourceSet::new(
            Arc::new(DownSource),
            Arc::new(InMemorySource::new("supply_chain_map", m)),
            Arc::new(InMemorySource::new("stockout_predictions", p)),
        ));
        let mut store = InMemoryDedupStore::new();

        let report = engine
            .compute_conflicts(ConflictMode::Alert, RiskThreshold::default(), &mut store)
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.sources_unavailable, vec!["risk_alerts".to_string()]);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_feed_yields_empty_list() {
        let (v, m, _) = fleet();
        let input = CorrelationInput {
            vessel_risk: v,
            category_mapping: m,
            stockout_predictions: Vec::new(),
        };
        let mut store = InMemoryDedupStore::new();
        let mut stats = RunStats::default();

        let out = correlate(
            &input,
            EngineSettings::default(),
            ConflictMode::Summary,
            RiskThreshold::default(),
            &mut store,
            Utc::now(),
            &mut stats,
        )
        .unwrap();

        assert_eq!(out, ConflictList::Summary(Vec::new()));
    }

    #[test]
    fn fraction_scale_feed_matches_percent_threshold() {
        let v = rows(json!([{"vessel_id": "Star", "risk_score": 0.8}]));
        let m = rows(json!([{"vessel_identifier": "star", "category": "Toys"}]));
        let p = rows(json!([{"category": "toys", "stockout_flag": true}]));
        let input = CorrelationInput {
            vessel_risk: v,
            category_mapping: m,
            stockout_predictions: p,
        };
        let settings = EngineSettings {
            scale: ScoreScale::Fraction,
            window: DedupWindow::Forever,
        };
        let mut store = InMemoryDedupStore::new();
        let mut stats = RunStats::default();

        let out = correlate(
            &input,
            settings,
            ConflictMode::Summary,
            RiskThreshold::default(),
            &mut store,
            Utc::now(),
            &mut stats,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
    }
}
