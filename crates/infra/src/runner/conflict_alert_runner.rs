use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use bridge_correlation::{
    ConflictMode, ConflictReport, CorrelationEngine, DedupStore, EngineError, RiskThreshold,
};

use crate::config::BridgeConfig;
use crate::runner::sink::ConflictSink;

/// Run one alert-mode pass with exclusive access to the store.
///
/// The lock is held for the whole pass so two passes never interleave their
/// check/add calls.
pub fn run_alert_pass<D: DedupStore + ?Sized>(
    engine: &CorrelationEngine,
    threshold: RiskThreshold,
    store: &Mutex<D>,
) -> Result<ConflictReport, EngineError> {
    let mut guard = store.lock().unwrap_or_else(|e| e.into_inner());
    engine.compute_conflicts(ConflictMode::Alert, threshold, &mut *guard)
}

/// Config for the conflict alert runner.
#[derive(Debug, Clone)]
pub struct ConflictAlertRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub threshold: RiskThreshold,
}

impl Default for ConflictAlertRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            threshold: RiskThreshold::default(),
        }
    }
}

/// Handle for the running runner (shutdown + trigger hook).
#[derive(Debug)]
pub struct ConflictAlertRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ConflictAlertRunnerHandle {
    /// Ask for a pass as soon as possible (e.g. after a feed was refreshed).
    ///
    /// Triggers are coalesced: if a pass is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the runner thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ConflictAlertRunner {
    pub fn from_config(cfg: &BridgeConfig) -> Self {
        Self {
            interval: cfg.run_interval,
            threshold: cfg.risk_threshold,
            ..Self::default()
        }
    }

    /// Spawn the runner thread.
    ///
    /// - Schedule: runs once at startup, then every `interval`
    /// - On demand: `handle.trigger()`
    /// - Failures: logged + retried with bounded exponential backoff; never propagate
    pub fn spawn<D, S>(
        &self,
        name: &'static str,
        engine: CorrelationEngine,
        store: Arc<Mutex<D>>,
        sink: Arc<S>,
    ) -> io::Result<ConflictAlertRunnerHandle>
    where
        D: DedupStore + 'static,
        S: ConflictSink,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, cfg, shutdown_rx, trigger_rx, engine, store, sink))?;

        Ok(ConflictAlertRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn runner_loop<D, S>(
    name: &'static str,
    cfg: ConflictAlertRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    engine: CorrelationEngine,
    store: Arc<Mutex<D>>,
    sink: Arc<S>,
) where
    D: DedupStore + 'static,
    S: ConflictSink,
{
    info!(
        runner = name,
        interval_secs = cfg.interval.as_secs(),
        threshold = cfg.threshold.value(),
        "conflict alert runner started"
    );

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        // Shutdown has priority.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        match run_alert_pass(&engine, cfg.threshold, &*store) {
            Ok(report) => {
                failures = 0;
                if !report.is_empty() {
                    sink.emit(report);
                }
            }
            Err(e) => {
                warn!(runner = name, error = %e, attempt = failures + 1, "conflict alert pass failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, "conflict alert runner stopped");
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // base * 2^(attempt-1), capped at 10s.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(pow as u128);
    Duration::from_millis(ms.min(10_000) as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use bridge_core::RawRecord;
    use bridge_correlation::{
        AlertKey, ConflictList, DedupError, InMemoryDedupStore, InMemorySource, SourceSet,
    };

    use super::*;
    use crate::runner::sink::InMemoryConflictSink;

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        cond()
    }

    fn sources(vessels: Arc<InMemorySource>) -> SourceSet {
        SourceSet::new(
            vessels,
            Arc::new(InMemorySource::new(
                "supply_chain_map",
                vec![
                    RawRecord::new().with("ship_name_raw", "Megastar").with("assigned_category", "Toys"),
                    RawRecord::new().with("ship_name_raw", "Star").with("assigned_category", "Toys"),
                ],
            )),
            Arc::new(InMemorySource::new(
                "stockout_predictions",
                vec![RawRecord::new().with("category", "Toys").with("stockout_14d_pred", 1)],
            )),
        )
    }

    #[test]
    fn backoff_grows_and_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff(base, 1), Duration::from_millis(250));
        assert_eq!(backoff(base, 3), Duration::from_millis(1000));
        assert_eq!(backoff(base, 30), Duration::from_millis(10_000));
    }

    #[test]
    fn startup_pass_and_trigger_emit_only_new_conflicts() {
        let vessels = Arc::new(InMemorySource::new(
            "risk_alerts",
            vec![RawRecord::new().with("ship_name", "Megastar").with("risk_score", 90)],
        ));
        let engine = CorrelationEngine::new(sources(vessels.clone()));
        let store = Arc::new(Mutex::new(InMemoryDedupStore::new()));
        let sink = Arc::new(InMemoryConflictSink::new());

        let runner = ConflictAlertRunner {
            interval: Duration::from_secs(3600),
            ..ConflictAlertRunner::default()
        };
        let handle = runner
            .spawn("test.conflict_alerts", engine, store.clone(), sink.clone())
            .unwrap();

        assert!(wait_for(|| sink.len() == 1));

        // Same data again: nothing new to report.
        handle.trigger();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(sink.len(), 1);

        // A second vessel turns critical.
        vessels.replace(vec![
            RawRecord::new().with("ship_name", "Megastar").with("risk_score", 90),
            RawRecord::new().with("ship_name", "STAR").with("risk_level", "Critical"),
        ]);
        handle.trigger();
        assert!(wait_for(|| sink.len() == 2));
        handle.shutdown();

        let reports = sink.all();
        let ConflictList::Alert(second) = &reports[1].conflicts else {
            panic!("expected alert report");
        };
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].alert_key.as_str(), "star_toys");
        assert_eq!(store.lock().unwrap().len(), 2);
    }

    /// Store that fails the first `n` writes.
    struct FlakyStore {
        inner: InMemoryDedupStore,
        failures_left: u32,
    }

    impl DedupStore for FlakyStore {
        fn contains(&self, key: &AlertKey) -> bool {
            self.inner.contains(key)
        }

        fn add(&mut self, key: AlertKey) -> Result<(), DedupError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(DedupError::Io {
                    path: "flaky.json".into(),
                    source: io::Error::other("disk full"),
                });
            }
            self.inner.add(key)
        }

        fn load(&self) -> Result<BTreeSet<AlertKey>, DedupError> {
            self.inner.load()
        }

        fn persist(&mut self, keys: &BTreeSet<AlertKey>) -> Result<(), DedupError> {
            self.inner.persist(keys)
        }

        fn keys(&self) -> Vec<AlertKey> {
            self.inner.keys()
        }
    }

    #[test]
    fn dedup_failures_are_retried() {
        let vessels = Arc::new(InMemorySource::new(
            "risk_alerts",
            vec![RawRecord::new().with("ship_name", "Star").with("risk_score", 99)],
        ));
        let engine = CorrelationEngine::new(sources(vessels));
        let store = Arc::new(Mutex::new(FlakyStore {
            inner: InMemoryDedupStore::new(),
            failures_left: 2,
        }));
        let sink = Arc::new(InMemoryConflictSink::new());

        let runner = ConflictAlertRunner {
            base_backoff: Duration::from_millis(10),
            ..ConflictAlertRunner::default()
        };
        let handle = runner
            .spawn("test.flaky_store", engine, store.clone(), sink.clone())
            .unwrap();

        assert!(wait_for(|| sink.len() == 1));
        handle.shutdown();
        assert_eq!(store.lock().unwrap().keys().len(), 1);
    }
}
