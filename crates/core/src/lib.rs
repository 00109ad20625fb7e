//! `workportal-core`: shared building blocks for the portal client.
//!
//! This crate contains **pure** primitives (no transport, no storage).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ContractorId, DepartmentId, EnterpriseId, UserId};
