//! Durable alert deduplication stores.

pub mod file_store;

pub use file_store::JsonFileDedupStore;
