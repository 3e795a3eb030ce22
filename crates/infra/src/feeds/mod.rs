//! Feed adapters: where the three record sets are read from.

pub mod json_file;

pub use json_file::JsonFileSource;
