//! Category resolver: vessel → carried categories.

use std::collections::HashMap;

use bridge_core::{CategoryName, VesselId};

use crate::model::CategoryMapping;

/// Lookup from normalized vessel key to the categories it carries.
///
/// A vessel maps to every category listed for it (fan-out). Repeated rows for the
/// same pair, however they are cased, collapse to one entry; first-seen order is
/// preserved.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    by_vessel: HashMap<String, Vec<CategoryName>>,
}

impl CategoryIndex {
    pub fn build(mappings: &[CategoryMapping]) -> Self {
        let mut by_vessel: HashMap<String, Vec<CategoryName>> = HashMap::new();
        for m in mappings {
            let cats = by_vessel.entry(m.vessel.key().to_string()).or_default();
            if !cats.contains(&m.category) {
                cats.push(m.category.clone());
            }
        }
        Self { by_vessel }
    }

    /// Categories carried by `vessel`; empty when the vessel is unmapped.
    pub fn resolve(&self, vessel: &VesselId) -> &[CategoryName] {
        self.by_vessel
            .get(vessel.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
