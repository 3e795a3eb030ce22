//! Configuration loading and representation.
//!
//! Everything comes from `BRIDGE_*` environment variables with defaults. Values are
//! validated into typed form up front so a bad deployment fails at startup rather
//! than on the first scheduled tick.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use bridge_correlation::{DedupWindow, EngineSettings, RiskThreshold, ScoreScale};

pub const ENV_RISK_THRESHOLD: &str = "BRIDGE_RISK_THRESHOLD";
pub const ENV_SCORE_SCALE: &str = "BRIDGE_SCORE_SCALE";
pub const ENV_DEDUP_WINDOW: &str = "BRIDGE_DEDUP_WINDOW";
pub const ENV_DATA_DIR: &str = "BRIDGE_DATA_DIR";
pub const ENV_VESSEL_RISK_FILE: &str = "BRIDGE_VESSEL_RISK_FILE";
pub const ENV_MAPPING_FILE: &str = "BRIDGE_MAPPING_FILE";
pub const ENV_PREDICTIONS_FILE: &str = "BRIDGE_PREDICTIONS_FILE";
pub const ENV_DEDUP_FILE: &str = "BRIDGE_DEDUP_FILE";
pub const ENV_RUN_INTERVAL_SECS: &str = "BRIDGE_RUN_INTERVAL_SECS";
pub const ENV_BIND_ADDR: &str = "BRIDGE_BIND_ADDR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Locations of the three feed exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPaths {
    pub vessel_risk: PathBuf,
    pub category_mapping: PathBuf,
    pub stockout_predictions: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Canonical-scale (0-100) score a vessel must exceed to be critical.
    pub risk_threshold: RiskThreshold,
    /// Scale the risk feed publishes on.
    pub score_scale: ScoreScale,
    pub dedup_window: DedupWindow,
    pub feeds: FeedPaths,
    pub dedup_path: PathBuf,
    pub run_interval: Duration,
    pub bind_addr: SocketAddr,
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = PathBuf::from(get(ENV_DATA_DIR).unwrap_or_else(|| "data".to_string()));
        let in_data_dir = |key: &'static str, default: &str| {
            resolve_path(&data_dir, &get(key).unwrap_or_else(|| default.to_string()))
        };

        let interval_secs: u64 = parse_or(get(ENV_RUN_INTERVAL_SECS), ENV_RUN_INTERVAL_SECS, 3600)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_RUN_INTERVAL_SECS,
                value: "0".to_string(),
                reason: "interval must be at least one second".to_string(),
            });
        }

        Ok(Self {
            risk_threshold: parse_or(get(ENV_RISK_THRESHOLD), ENV_RISK_THRESHOLD, RiskThreshold::default())?,
            score_scale: parse_or(get(ENV_SCORE_SCALE), ENV_SCORE_SCALE, ScoreScale::default())?,
            dedup_window: parse_or(get(ENV_DEDUP_WINDOW), ENV_DEDUP_WINDOW, DedupWindow::default())?,
            feeds: FeedPaths {
                vessel_risk: in_data_dir(ENV_VESSEL_RISK_FILE, "risk_alerts.json"),
                category_mapping: in_data_dir(ENV_MAPPING_FILE, "supply_chain_map.json"),
                stockout_predictions: in_data_dir(ENV_PREDICTIONS_FILE, "stockout_predictions.json"),
            },
            dedup_path: in_data_dir(ENV_DEDUP_FILE, "sent_alerts.json"),
            run_interval: Duration::from_secs(interval_secs),
            bind_addr: parse_or(
                get(ENV_BIND_ADDR),
                ENV_BIND_ADDR,
                SocketAddr::from(([0, 0, 0, 0], 8080)),
            )?,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scale: self.score_scale,
            window: self.dedup_window,
        }
    }
}

fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    let p = PathBuf::from(raw);
    if p.is_absolute() { p } else { base.join(p) }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<BridgeConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BridgeConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.risk_threshold.value(), 75.0);
        assert_eq!(cfg.score_scale, ScoreScale::Percent);
        assert_eq!(cfg.dedup_window, DedupWindow::Forever);
        assert_eq!(cfg.feeds.vessel_risk, PathBuf::from("data/risk_alerts.json"));
        assert_eq!(cfg.dedup_path, PathBuf::from("data/sent_alerts.json"));
        assert_eq!(cfg.run_interval, Duration::from_secs(3600));
        assert_eq!(cfg.bind_addr.port(), 8080);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[
            (ENV_RISK_THRESHOLD, "10"),
            (ENV_SCORE_SCALE, "fraction"),
            (ENV_DEDUP_WINDOW, "daily"),
            (ENV_DATA_DIR, "/srv/bridge"),
            (ENV_DEDUP_FILE, "/var/lib/bridge/alerts.json"),
            (ENV_RUN_INTERVAL_SECS, "60"),
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(cfg.risk_threshold.value(), 10.0);
        assert_eq!(cfg.score_scale, ScoreScale::Fraction);
        assert_eq!(cfg.dedup_window, DedupWindow::Daily);
        assert_eq!(cfg.feeds.category_mapping, PathBuf::from("/srv/bridge/supply_chain_map.json"));
        assert_eq!(cfg.dedup_path, PathBuf::from("/var/lib/bridge/alerts.json"));
        assert_eq!(cfg.run_interval, Duration::from_secs(60));
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn bad_threshold_is_rejected_with_key() {
        let err = load(&[(ENV_RISK_THRESHOLD, "seventy")]).unwrap_err();
        let ConfigError::Invalid { key, value, .. } = err;
        assert_eq!(key, ENV_RISK_THRESHOLD);
        assert_eq!(value, "seventy");
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(load(&[(ENV_RUN_INTERVAL_SECS, "0")]).is_err());
    }
}
