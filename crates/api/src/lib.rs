//! HTTP API: query surface over the correlation engine and the `supply-bridge` binary.

pub mod app;
