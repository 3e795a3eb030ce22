use std::sync::Mutex;

use tracing::info;

use bridge_correlation::{ConflictList, ConflictReport};

/// Receiver of new-conflict reports (the reporting collaborator's entry point).
///
/// Phrasing the report and delivering it to people is the sink's business.
pub trait ConflictSink: Send + Sync + 'static {
    fn emit(&self, report: ConflictReport);
}

/// In-memory sink for tests/dev; also backs the API's alert history.
#[derive(Debug, Default)]
pub struct InMemoryConflictSink {
    inner: Mutex<Vec<ConflictReport>>,
}

impl InMemoryConflictSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ConflictReport> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConflictSink for InMemoryConflictSink {
    fn emit(&self, report: ConflictReport) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push(report);
    }
}

/// Writes each conflict as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConflictSink;

impl ConflictSink for LogConflictSink {
    fn emit(&self, report: ConflictReport) {
        match &report.conflicts {
            ConflictList::Alert(conflicts) => {
                for c in conflicts {
                    info!(
                        run_id = %report.run_id,
                        vessel = %c.vessel,
                        category = %c.category,
                        alert_key = %c.alert_key,
                        items_at_risk = ?c.items_at_risk,
                        "supply chain conflict"
                    );
                }
            }
            ConflictList::Summary(rows) => {
                for r in rows {
                    info!(
                        run_id = %report.run_id,
                        category = %r.category,
                        vessel_count = r.vessel_count,
                        "supply chain conflict summary"
                    );
                }
            }
        }
    }
}
