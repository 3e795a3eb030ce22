//! Alert deduplication: which conflicts have already been reported.

use core::str::FromStr;
use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use bridge_core::{normalize_key, CategoryName, DomainError, VesselId};

/// Dedup identity of a conflict: `"{vessel}_{category}"` over normalized keys,
/// optionally prefixed by a UTC date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlertKey(String);

impl AlertKey {
    pub fn new(vessel: &VesselId, category: &CategoryName) -> Self {
        Self(format!("{}_{}", vessel.key(), category.key()))
    }

    /// Key scoped by `window`; `now` only matters for [`DedupWindow::Daily`].
    pub fn windowed(
        vessel: &VesselId,
        category: &CategoryName,
        window: DedupWindow,
        now: DateTime<Utc>,
    ) -> Self {
        let base = Self::new(vessel, category);
        match window {
            DedupWindow::Forever => base,
            DedupWindow::Daily => Self(format!("{}:{}", now.format("%Y-%m-%d"), base.0)),
        }
    }

    /// Rebuild a key read back from durable storage.
    ///
    /// Older files spelled keys in feed casing (`"Megastar_Electronics"`); they are
    /// folded to the normalized form so they keep suppressing their pair.
    pub fn from_raw(raw: impl AsRef<str>) -> Self {
        Self(normalize_key(raw.as_ref()))
    }

    /// UTC date of a [`DedupWindow::Daily`] key; `None` for undated keys.
    pub fn window_date(&self) -> Option<NaiveDate> {
        let (prefix, _) = self.0.split_once(':')?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AlertKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

/// How long a reported conflict stays suppressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupWindow {
    /// Never re-alert a pair once reported.
    #[default]
    Forever,
    /// Re-alert at most once per UTC day.
    Daily,
}

impl FromStr for DedupWindow {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "forever" => Ok(DedupWindow::Forever),
            "daily" => Ok(DedupWindow::Daily),
            other => Err(DomainError::validation(format!(
                "unknown dedup window `{other}` (expected `forever` or `daily`)"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("dedup store I/O failed at `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("dedup store encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent set of already-reported alert keys.
///
/// Single writer per invocation: callers hold `&mut` for the whole read/modify/write
/// cycle.
pub trait DedupStore: Send {
    fn contains(&self, key: &AlertKey) -> bool;

    /// Record a key. Durable implementations write it through before returning.
    fn add(&mut self, key: AlertKey) -> Result<(), DedupError>;

    /// Read the full key set from the backing storage.
    fn load(&self) -> Result<BTreeSet<AlertKey>, DedupError>;

    /// Replace the backing storage with `keys`.
    fn persist(&mut self, keys: &BTreeSet<AlertKey>) -> Result<(), DedupError>;

    /// Current keys, sorted.
    fn keys(&self) -> Vec<AlertKey>;
}

/// Drop daily keys dated before `now`'s UTC day.
///
/// Only acts under [`DedupWindow::Daily`]; those keys can never match again once
/// their day is over. Undated keys are kept. The store is rewritten only when
/// something was removed. Returns the number of keys dropped.
pub fn prune_expired<D: DedupStore + ?Sized>(
    store: &mut D,
    window: DedupWindow,
    now: DateTime<Utc>,
) -> Result<usize, DedupError> {
    if window != DedupWindow::Daily {
        return Ok(0);
    }
    let today = now.date_naive();
    let mut keys = store.load()?;
    let before = keys.len();
    keys.retain(|k| k.window_date().is_none_or(|d| d >= today));
    let dropped = before - keys.len();
    if dropped > 0 {
        store.persist(&keys)?;
    }
    Ok(dropped)
}

/// Process-local store for tests and summary-only callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDedupStore {
    keys: BTreeSet<AlertKey>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl DedupStore for InMemoryDedupStore {
    fn contains(&self, key: &AlertKey) -> bool {
        self.keys.contains(key)
    }

    fn add(&mut self, key: AlertKey) -> Result<(), DedupError> {
        self.keys.insert(key);
        Ok(())
    }

    fn load(&self) -> Result<BTreeSet<AlertKey>, DedupError> {
        Ok(self.keys.clone())
    }

    fn persist(&mut self, keys: &BTreeSet<AlertKey>) -> Result<(), DedupError> {
        self.keys = keys.clone();
        Ok(())
    }

    fn keys(&self) -> Vec<AlertKey> {
        self.keys.iter().cloned().collect()
    }
}
