//! Tracing/logging setup shared by every binary in the workspace.

/// Initialize process-wide observability (tracing/logging).
///
/// Output format comes from `BRIDGE_LOG_FORMAT` (`json`, `pretty`, `compact`),
/// filtering from `RUST_LOG`. Safe to call multiple times; subsequent calls become
/// no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::LogFormat;
