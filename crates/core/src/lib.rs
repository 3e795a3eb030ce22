//! `bridge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, normalized identifiers, and the untyped record bag that feeds
//! arrive in.

pub mod error;
pub mod ident;
pub mod record;

pub use error::{DomainError, DomainResult};
pub use ident::{normalize_key, CategoryName, VesselId};
pub use record::{coerce_number, coerce_text, RawRecord};
