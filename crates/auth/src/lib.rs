//! `workportal-auth`: pure account model and access policy.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod access;
pub mod claims;
pub mod roles;
pub mod user;

pub use access::{AccessExplanation, AccessReason, AccessVerdict, evaluate, explain, onboarding_path, paths};
pub use claims::{TokenClaims, TokenError, decode_unverified, is_token_valid, validate_expiry};
pub use roles::{PortalRole, StaffRole};
pub use user::{
    Account, AdminUser, AuditStatus, ContractorUser, EnterpriseUser, StaffPayload, StaffProfile,
    UserLevel, UserPayload, UserSnapshot, UserType,
};
