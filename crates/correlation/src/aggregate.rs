//! Conflict aggregation: join critical vessels to at-risk categories, then either
//! rank per category (summary) or emit unseen pairs (alert).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bridge_core::{CategoryName, VesselId};

use crate::dedup::{AlertKey, DedupError, DedupStore, DedupWindow};
use crate::model::VesselRisk;
use crate::resolver::CategoryIndex;
use crate::stockout::StockoutIndex;

/// A critically delayed vessel carrying a category predicted to stock out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub vessel: VesselId,
    pub category: CategoryName,
    pub alert_key: AlertKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_at_risk: Option<u64>,
}

/// Per-category ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub category: CategoryName,
    pub vessel_count: usize,
}

/// One joined (vessel, category) pair, before aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictPair<'a> {
    pub vessel: &'a VesselId,
    pub category: &'a CategoryName,
    pub items_at_risk: Option<u64>,
}

/// Result of the join step.
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome<'a> {
    /// Pairs in feed order (vessel rows first, then mapping order).
    pub pairs: Vec<ConflictPair<'a>>,
    /// Critical vessels that had no mapping entry.
    pub unmapped_vessels: usize,
}

/// Join critical vessels through the category index against the stockout index.
pub fn join<'a>(
    critical: &[&'a VesselRisk],
    categories: &'a CategoryIndex,
    stockouts: &StockoutIndex,
) -> JoinOutcome<'a> {
    let mut out = JoinOutcome::default();
    for v in critical {
        let carried = categories.resolve(&v.vessel);
        if carried.is_empty() {
            out.unmapped_vessels += 1;
            continue;
        }
        for category in carried.iter().filter(|c| stockouts.is_at_risk(c)) {
            out.pairs.push(ConflictPair {
                vessel: &v.vessel,
                category,
                items_at_risk: stockouts.items_at_risk(category),
            });
        }
    }
    out
}

/// Group pairs by category and count distinct vessels.
///
/// Sorted by vessel count descending, then category key ascending.
pub fn summarize(pairs: &[ConflictPair<'_>]) -> Vec<ConflictSummary> {
    let mut groups: HashMap<&str, (&CategoryName, HashSet<&str>)> = HashMap::new();
    for p in pairs {
        groups
            .entry(p.category.key())
            .or_insert_with(|| (p.category, HashSet::new()))
            .1
            .insert(p.vessel.key());
    }

    let mut rows: Vec<ConflictSummary> = groups
        .into_values()
        .map(|(category, vessels)| ConflictSummary {
            category: category.clone(),
            vessel_count: vessels.len(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.vessel_count
            .cmp(&a.vessel_count)
            .then_with(|| a.category.key().cmp(b.category.key()))
    });
    rows
}

/// Alerts emitted by one alert-mode pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertOutcome {
    pub conflicts: Vec<Conflict>,
    /// Pairs already present in the store.
    pub suppressed: usize,
}

/// Emit each pair whose key is not yet in `store`, recording it as it goes.
///
/// The key is added before the conflict is returned, so a failure to persist stops
/// the pass instead of handing out an alert the store does not remember.
pub fn collect_alerts<D: DedupStore + ?Sized>(
    pairs: &[ConflictPair<'_>],
    store: &mut D,
    window: DedupWindow,
    now: DateTime<Utc>,
) -> Result<AlertOutcome, DedupError> {
    let mut out = AlertOutcome::default();
    for p in pairs {
        let key = AlertKey::windowed(p.vessel, p.category, window, now);
        if store.contains(&key) {
            out.suppressed += 1;
            continue;
        }
        store.add(key.clone())?;
        out.conflicts.push(Conflict {
            vessel: p.vessel.clone(),
            category: p.category.clone(),
            alert_key: key,
            items_at_risk: p.items_at_risk,
        });
    }
    Ok(out)
}
