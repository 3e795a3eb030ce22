//! Normalized identifiers used as join keys across the record sets.
//!
//! Upstream feeds spell the same vessel or category with different casing and
//! stray whitespace (`"Megastar"`, `"MEGASTAR "`). Each identifier keeps two forms:
//! - `display`: the trimmed original, used when reporting.
//! - `key`: trimmed and lower-cased, used for every comparison.
//!
//! Equality, ordering and hashing only look at `key`.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Identifier of a vessel (name or numeric id, as published by the risk feed).
#[derive(Debug, Clone)]
pub struct VesselId {
    display: String,
    key: String,
}

/// Name of an inventory category (e.g. "Electronics").
#[derive(Debug, Clone)]
pub struct CategoryName {
    display: String,
    key: String,
}

/// Canonical comparison form of a raw identifier.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

macro_rules! impl_normalized_ident {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier from raw text.
            ///
            /// Fails if nothing is left after trimming.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
                let display = raw.as_ref().trim();
                if display.is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " is empty")));
                }
                Ok(Self {
                    display: display.to_string(),
                    key: normalize_key(display),
                })
            }

            /// Trimmed original spelling.
            pub fn display(&self) -> &str {
                &self.display
            }

            /// Lower-cased comparison key.
            pub fn key(&self) -> &str {
                &self.key
            }
        }

        impl PartialEq for $t {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        impl Eq for $t {}

        impl Hash for $t {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key.hash(state);
            }
        }

        impl PartialOrd for $t {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $t {
            fn cmp(&self, other: &Self) -> Ordering {
                self.key.cmp(&other.key)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.display)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.display)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_normalized_ident!(VesselId, "vessel identifier");
impl_normalized_ident!(CategoryName, "category name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_whitespace_collapse_to_one_key() {
        let a = VesselId::parse("Megastar").unwrap();
        let b = VesselId::parse("MEGASTAR ").unwrap();
        let c = VesselId::parse("  megastar").unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.key(), "megastar");
        assert_eq!(b.display(), "MEGASTAR");
    }

    #[test]
    fn blank_identifier_is_rejected() {
        assert!(matches!(
            CategoryName::parse("   "),
            Err(DomainError::InvalidId(_))
        ));
    }

    #[test]
    fn serializes_as_display_form() {
        let c = CategoryName::parse(" Toys ").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"Toys\"");

        let back: CategoryName = serde_json::from_str("\"TOYS\"").unwrap();
        assert_eq!(back, c);
    }
}
