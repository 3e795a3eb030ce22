use std::sync::{Arc, Mutex};

use bridge_correlation::{ConflictReport, CorrelationEngine, DedupStore, RiskThreshold};
use bridge_infra::{
    build_engine, BridgeConfig, ConflictSink, InMemoryConflictSink, LogConflictSink,
};

/// Dedup store shared between the HTTP handlers and the background runner.
pub type SharedDedupStore = Arc<Mutex<dyn DedupStore>>;

/// API-local conflict sink: logs every report and keeps it for `/alerts/history`.
#[derive(Debug, Default)]
pub struct ApiConflictSink {
    log: LogConflictSink,
    history: InMemoryConflictSink,
}

impl ApiConflictSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ConflictReport> {
        self.history.all()
    }
}

impl ConflictSink for ApiConflictSink {
    fn emit(&self, report: ConflictReport) {
        self.log.emit(report.clone());
        self.history.emit(report);
    }
}

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    pub engine: CorrelationEngine,
    pub threshold: RiskThreshold,
    pub store: SharedDedupStore,
    pub sink: Arc<ApiConflictSink>,
}

impl AppServices {
    pub fn new(cfg: &BridgeConfig, store: SharedDedupStore, sink: Arc<ApiConflictSink>) -> Self {
        Self {
            engine: build_engine(cfg),
            threshold: cfg.risk_threshold,
            store,
            sink,
        }
    }

    /// Sorted alert keys currently remembered by the store.
    pub fn alert_keys(&self) -> Vec<String> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = store.keys().into_iter().map(|k| k.to_string()).collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("engine", &self.engine)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
