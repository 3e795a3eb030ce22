//! Record normalizer: untyped feed rows in, strict records out.
//!
//! Normalization never fails. Numeric garbage becomes `0` and the row is kept (the
//! risk filter or stockout matcher will then discard it naturally). The only rows
//! dropped here are those without a usable join identifier, since they can never
//! take part in a join.

use tracing::debug;

use bridge_core::{CategoryName, RawRecord, VesselId};

use crate::model::{CategoryMapping, RiskLevel, ScoreScale, StockoutPrediction, VesselRisk};

/// Field aliases, in priority order.
pub mod fields {
    pub const VESSEL_ID: &[&str] = &["vessel_id", "ship_name", "identifier", "vessel", "vessel_name"];
    pub const RISK_SCORE: &[&str] = &["risk_score", "score"];
    pub const RISK_LEVEL: &[&str] = &["risk_level", "level"];

    pub const MAPPING_VESSEL: &[&str] = &[
        "ship_name_raw",
        "vessel_identifier",
        "vessel_id",
        "ship_name",
        "vessel",
    ];
    pub const MAPPING_CATEGORY: &[&str] = &["assigned_category", "category"];

    pub const PREDICTION_CATEGORY: &[&str] = &["category", "assigned_category"];
    pub const STOCKOUT_FLAG: &[&str] = &["stockout_14d_pred", "stockout_flag", "stockout_pred"];
    pub const ITEM_COUNT: &[&str] = &["item_count", "items_at_risk", "items"];
}

/// Output of normalizing one feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    /// Rows dropped for lack of a join identifier.
    pub skipped: usize,
}

impl<T> Normalized<T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Converts raw rows of the three feeds into strict records.
#[derive(Debug, Copy, Clone, Default)]
pub struct Normalizer {
    scale: ScoreScale,
}

impl Normalizer {
    pub fn new(scale: ScoreScale) -> Self {
        Self { scale }
    }

    pub fn vessel_risk(&self, raw: &RawRecord) -> Option<VesselRisk> {
        let vessel = VesselId::parse(raw.text(fields::VESSEL_ID)?).ok()?;
        let risk_score = self.scale.to_canonical(raw.number(fields::RISK_SCORE));
        let risk_level = raw.text(fields::RISK_LEVEL).map(|l| RiskLevel::parse(&l));
        Some(VesselRisk {
            vessel,
            risk_score,
            risk_level,
        })
    }

    pub fn category_mapping(&self, raw: &RawRecord) -> Option<CategoryMapping> {
        let vessel = VesselId::parse(raw.text(fields::MAPPING_VESSEL)?).ok()?;
        let category = CategoryName::parse(raw.text(fields::MAPPING_CATEGORY)?).ok()?;
        Some(CategoryMapping { vessel, category })
    }

    pub fn stockout_prediction(&self, raw: &RawRecord) -> Option<StockoutPrediction> {
        let category = CategoryName::parse(raw.text(fields::PREDICTION_CATEGORY)?).ok()?;
        let stockout_flag = raw.number(fields::STOCKOUT_FLAG);
        let item_count = raw
            .optional_number(fields::ITEM_COUNT)
            .map(|n| n.max(0.0).round() as u64);
        Some(StockoutPrediction {
            category,
            stockout_flag,
            item_count,
        })
    }

    pub fn vessel_risks(&self, raws: &[RawRecord]) -> Normalized<VesselRisk> {
        normalize_all(raws, "vessel_risk", |r| self.vessel_risk(r))
    }

    pub fn category_mappings(&self, raws: &[RawRecord]) -> Normalized<CategoryMapping> {
        normalize_all(raws, "category_mapping", |r| self.category_mapping(r))
    }

    pub fn stockout_predictions(&self, raws: &[RawRecord]) -> Normalized<StockoutPrediction> {
        normalize_all(raws, "stockout_prediction", |r| self.stockout_prediction(r))
    }
}

fn normalize_all<T>(
    raws: &[RawRecord],
    feed: &'static str,
    f: impl Fn(&RawRecord) -> Option<T>,
) -> Normalized<T> {
    let mut records = Vec::with_capacity(raws.len());
    let mut skipped = 0;
    for (row, raw) in raws.iter().enumerate() {
        match f(raw) {
            Some(r) => records.push(r),
            None => {
                skipped += 1;
                debug!(feed, row, "skipping record without a join identifier");
            }
        }
    }
    Normalized { records, skipped }
}
