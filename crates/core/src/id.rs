//! Strongly-typed identifiers used across the portal.
//!
//! The portal backend keys every row by a positive integer, so identifiers
//! wrap an `i64` rather than a UUID.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a portal account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a settled enterprise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnterpriseId(i64);

/// Identifier of a settled contractor company.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractorId(i64);

/// Identifier of a department inside an enterprise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(EnterpriseId, "EnterpriseId");
impl_int_newtype!(ContractorId, "ContractorId");
impl_int_newtype!(DepartmentId, "DepartmentId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_non_numeric_ids() {
        let err = "abc".parse::<DepartmentId>().unwrap_err();
        assert!(err.to_string().contains("DepartmentId"));
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&EnterpriseId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        let id: ContractorId = " 7\n".parse().unwrap();
        assert_eq!(id.get(), 7);
    }
}
