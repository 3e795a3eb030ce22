//! Stockout matcher: is a category predicted to run out within the horizon?

use std::collections::HashMap;

use bridge_core::CategoryName;

use crate::model::StockoutPrediction;

#[derive(Debug, Clone, Default)]
struct AtRisk {
    items: Option<u64>,
}

/// Set of categories with at least one positive stockout prediction.
///
/// Multiple rows for one category resolve existentially: a single flagged row is
/// enough, regardless of how many rows disagree.
#[derive(Debug, Clone, Default)]
pub struct StockoutIndex {
    at_risk: HashMap<String, AtRisk>,
}

impl StockoutIndex {
    pub fn build(predictions: &[StockoutPrediction]) -> Self {
        let mut at_risk: HashMap<String, AtRisk> = HashMap::new();
        for p in predictions.iter().filter(|p| p.predicts_stockout()) {
            let entry = at_risk.entry(p.category.key().to_string()).or_default();
            if let Some(n) = p.item_count {
                entry.items = Some(entry.items.unwrap_or(0).saturating_add(n));
            }
        }
        Self { at_risk }
    }

    pub fn is_at_risk(&self, category: &CategoryName) -> bool {
        self.at_risk.contains_key(category.key())
    }

    /// Sum of item counts across the flagged rows, if any row reported one.
    pub fn items_at_risk(&self, category: &CategoryName) -> Option<u64> {
        self.at_risk.get(category.key()).and_then(|a| a.items)
    }

    pub fn at_risk_count(&self) -> usize {
        self.at_risk.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(category: &str, flag: f64, items: Option<u64>) -> StockoutPrediction {
        StockoutPrediction {
            category: CategoryName::parse(category).unwrap(),
            stockout_flag: flag,
            item_count: items,
        }
    }

    fn cat(name: &str) -> CategoryName {
        CategoryName::parse(name).unwrap()
    }

    #[test]
    fn any_flagged_row_wins() {
        let idx = StockoutIndex::build(&[p("Toys", 0.0, None), p("toys", 1.0, None), p("TOYS", 0.0, None)]);
        assert!(idx.is_at_risk(&cat("Toys")));
    }

    #[test]
    fn all_zero_flags_mean_no_risk() {
        let idx = StockoutIndex::build(&[p("Furniture", 0.0, Some(3)), p("Furniture", 0.5, None)]);
        assert!(!idx.is_at_risk(&cat("Furniture")));
        assert_eq!(idx.at_risk_count(), 0);
    }

    #[test]
    fn item_counts_sum_over_flagged_rows_only() {
        let idx = StockoutIndex::build(&[
            p("Electronics", 1.0, Some(4)),
            p("Electronics", 2.0, Some(6)),
            p("Electronics", 0.0, Some(100)),
            p("Clothing", 1.0, None),
        ]);
        assert_eq!(idx.items_at_risk(&cat("electronics")), Some(10));
        assert_eq!(idx.items_at_risk(&cat("Clothing")), None);
        assert!(idx.is_at_risk(&cat("Clothing")));
    }
}
