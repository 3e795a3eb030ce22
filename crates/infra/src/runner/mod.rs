//! Scheduled conflict detection.
//!
//! The runner triggers alert-mode passes on a schedule or on demand and hands new
//! conflicts to a sink. Failures are isolated: they are logged and retried, never
//! propagated to whoever owns the runner.

pub mod conflict_alert_runner;
pub mod sink;

pub use conflict_alert_runner::{run_alert_pass, ConflictAlertRunner, ConflictAlertRunnerHandle};
pub use sink::{ConflictSink, InMemoryConflictSink, LogConflictSink};
