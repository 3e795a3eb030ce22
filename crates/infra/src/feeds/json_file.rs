//! Feeds exported as JSON files (one file per spreadsheet tab).
//!
//! Each file holds a JSON array of row objects, e.g.
//! `[{"ship_name": "Megastar", "risk_score": 92}, ...]`. Non-object rows are dropped
//! here; field-level cleanup is the normalizer's job.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, warn};

use bridge_core::RawRecord;
use bridge_correlation::{RecordSource, SourceError};

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let bytes = fs::read(&self.path).map_err(|e| {
            SourceError::unavailable(&self.name, format!("{}: {e}", self.path.display()))
        })?;

        let rows = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(rows)) => rows,
            Ok(_) => {
                return Err(SourceError::malformed(&self.name, "expected a JSON array of rows"));
            }
            Err(e) => return Err(SourceError::malformed(&self.name, e.to_string())),
        };

        let total = rows.len();
        let records: Vec<RawRecord> = rows.into_iter().filter_map(RawRecord::from_value).collect();
        if records.len() < total {
            warn!(
                source = %self.name,
                dropped = total - records.len(),
                "dropped non-object rows from feed"
            );
        }
        debug!(source = %self.name, rows = records.len(), "feed fetched");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn file_with(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_row_objects() {
        let f = file_with(r#"[{"ship_name": "Star", "risk_score": 80}, {"ship_name": "Europa"}]"#);
        let src = JsonFileSource::new("risk_alerts", f.path());
        let rows = src.fetch().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number(&["risk_score"]), 80.0);
    }

    #[test]
    fn non_object_rows_are_dropped() {
        let f = file_with(r#"[{"category": "Toys"}, 17, "junk", null]"#);
        let rows = JsonFileSource::new("stockout_predictions", f.path()).fetch().unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let src = JsonFileSource::new("supply_chain_map", dir.path().join("nope.json"));
        assert!(matches!(src.fetch(), Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let f = file_with(r#"{"rows": []}"#);
        let src = JsonFileSource::new("risk_alerts", f.path());
        assert!(matches!(src.fetch(), Err(SourceError::Malformed { .. })));

        let f = file_with("not json");
        let src = JsonFileSource::new("risk_alerts", f.path());
        assert!(matches!(src.fetch(), Err(SourceError::Malformed { .. })));
    }
}
