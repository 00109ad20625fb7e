//! Typed snapshot of the signed-in portal account.
//!
//! The backend returns a loosely shaped record whose status fields depend on
//! the account type. This module normalizes that record once, at the session
//! boundary, into a tagged union so the access policy never has to reason about
//! missing or foreign fields.

use serde::{Deserialize, Serialize};

use workportal_core::{ContractorId, DepartmentId, DomainError, DomainResult, EnterpriseId, UserId};

use crate::roles::{PortalRole, StaffRole};

// ─────────────────────────────────────────────────────────────────────────────
// Status codes
// ─────────────────────────────────────────────────────────────────────────────

/// Account category; selects which onboarding flow applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Enterprise,
    Contractor,
}

impl UserType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "admin" => Some(Self::Admin),
            "enterprise" => Some(Self::Enterprise),
            "contractor" => Some(Self::Contractor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Enterprise => "enterprise",
            Self::Contractor => "contractor",
        }
    }
}

impl core::fmt::Display for UserType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onboarding audit progress (`audit_status` on the wire).
///
/// A missing code is read as [`AuditStatus::NotSubmitted`]: freshly registered
/// accounts have not sent their application yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum AuditStatus {
    /// `1`: the apply/bind form has not been submitted.
    #[default]
    NotSubmitted,
    /// `2`: approved.
    Approved,
    /// `3`: submitted and waiting for review.
    Pending,
    /// Any other code.
    Other(i64),
}

impl AuditStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            None | Some(1) => Self::NotSubmitted,
            Some(2) => Self::Approved,
            Some(3) => Self::Pending,
            Some(other) => Self::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::NotSubmitted => 1,
            Self::Approved => 2,
            Self::Pending => 3,
            Self::Other(code) => *code,
        }
    }
}

/// Permission level an administrator has applied for (`user_level`).
///
/// `-1` (or an absent field) means no level has been chosen yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum UserLevel {
    #[default]
    Unset,
    Level(i64),
}

impl UserLevel {
    pub const UNSET_SENTINEL: i64 = -1;

    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            None | Some(Self::UNSET_SENTINEL) => Self::Unset,
            Some(level) => Self::Level(level),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Fields every account carries regardless of type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Option<UserId>,
    pub username: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Staff approval status (`user_status`); informational only.
    pub user_status: Option<i64>,
}

/// Staff profile linking an account to the company that employs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffProfile<Org> {
    pub staff_id: Option<i64>,
    pub organization: Org,
    pub name: String,
    pub phone: Option<String>,
    pub role: Option<StaffRole>,
    pub department: Option<DepartmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub account: Account,
    pub level: UserLevel,
    pub audit: AuditStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterpriseUser {
    pub account: Account,
    pub audit: AuditStatus,
    pub staff: Option<StaffProfile<EnterpriseId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractorUser {
    pub account: Account,
    pub audit: AuditStatus,
    pub staff: Option<StaffProfile<ContractorId>>,
}

/// Immutable view of the current account, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSnapshot {
    Admin(AdminUser),
    Enterprise(EnterpriseUser),
    Contractor(ContractorUser),
    /// The backend reported a `user_type` this client does not know.
    Unrecognized { account: Account, user_type: String },
}

impl UserSnapshot {
    pub fn account(&self) -> &Account {
        match self {
            Self::Admin(u) => &u.account,
            Self::Enterprise(u) => &u.account,
            Self::Contractor(u) => &u.account,
            Self::Unrecognized { account, .. } => account,
        }
    }

    pub fn username(&self) -> &str {
        &self.account().username
    }

    pub fn user_type(&self) -> Option<UserType> {
        match self {
            Self::Admin(_) => Some(UserType::Admin),
            Self::Enterprise(_) => Some(UserType::Enterprise),
            Self::Contractor(_) => Some(UserType::Contractor),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Raw type label, including unrecognized ones.
    pub fn user_type_label(&self) -> &str {
        match self {
            Self::Unrecognized { user_type, .. } => user_type,
            other => other.user_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    pub fn audit_status(&self) -> Option<AuditStatus> {
        match self {
            Self::Admin(u) => Some(u.audit),
            Self::Enterprise(u) => Some(u.audit),
            Self::Contractor(u) => Some(u.audit),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Portal role, when the account is an admin or a staff member with a known role.
    pub fn role(&self) -> Option<PortalRole> {
        match self {
            Self::Admin(_) => Some(PortalRole::Admin),
            Self::Enterprise(u) => u
                .staff
                .as_ref()
                .and_then(|s| s.role)
                .map(PortalRole::Enterprise),
            Self::Contractor(u) => u
                .staff
                .as_ref()
                .and_then(|s| s.role)
                .map(PortalRole::Contractor),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Normalize a decoded `/users/me/` payload.
    pub fn from_payload(payload: UserPayload) -> DomainResult<Self> {
        let username = payload.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::malformed("user payload has an empty username"));
        }

        let account = Account {
            id: payload.user_id.map(UserId::new),
            username,
            phone: payload.phone,
            email: payload.email,
            user_status: payload.user_status,
        };
        let audit = AuditStatus::from_code(payload.audit_status);

        let snapshot = match UserType::parse(&payload.user_type) {
            Some(UserType::Admin) => Self::Admin(AdminUser {
                account,
                level: UserLevel::from_code(payload.user_level),
                audit,
            }),
            Some(UserType::Enterprise) => Self::Enterprise(EnterpriseUser {
                account,
                audit,
                staff: payload.enterprise_user.and_then(|staff| {
                    let org = staff.enterprise_id.map(EnterpriseId::new)?;
                    Some(staff.into_profile(org))
                }),
            }),
            Some(UserType::Contractor) => Self::Contractor(ContractorUser {
                account,
                audit,
                staff: payload.contractor_user.and_then(|staff| {
                    let org = staff.contractor_id.map(ContractorId::new)?;
                    Some(staff.into_profile(org))
                }),
            }),
            None => Self::Unrecognized {
                account,
                user_type: payload.user_type,
            },
        };

        Ok(snapshot)
    }

    /// Decode and normalize a raw JSON body.
    pub fn from_json(body: &[u8]) -> DomainResult<Self> {
        let payload: UserPayload = serde_json::from_slice(body)
            .map_err(|e| DomainError::malformed(format!("user payload: {e}")))?;
        Self::from_payload(payload)
    }
}

impl TryFrom<UserPayload> for UserSnapshot {
    type Error = DomainError;

    fn try_from(value: UserPayload) -> Result<Self, Self::Error> {
        Self::from_payload(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shape
// ─────────────────────────────────────────────────────────────────────────────

/// `/users/me/` response as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub user_type: String,
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_level: Option<i64>,
    #[serde(default)]
    pub audit_status: Option<i64>,
    #[serde(default)]
    pub user_status: Option<i64>,
    #[serde(default)]
    pub enterprise_user: Option<StaffPayload>,
    #[serde(default)]
    pub contractor_user: Option<StaffPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub enterprise_id: Option<i64>,
    #[serde(default)]
    pub contractor_id: Option<i64>,
    #[serde(default)]
    pub department_id: Option<i64>,
}

impl StaffPayload {
    fn into_profile<Org>(self, organization: Org) -> StaffProfile<Org> {
        StaffProfile {
            staff_id: self.id,
            organization,
            name: self.name,
            phone: self.phone,
            role: self.role_type.as_deref().and_then(StaffRole::parse),
            department: self.department_id.map(DepartmentId::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> UserSnapshot {
        UserSnapshot::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn admin_without_level_is_unset() {
        let user = parse(r#"{"user_type":"admin","username":"root","audit_status":2}"#);
        let UserSnapshot::Admin(admin) = user else {
            panic!("expected admin snapshot");
        };
        assert!(admin.level.is_unset());
        assert_eq!(admin.audit, AuditStatus::Approved);
    }

    #[test]
    fn minus_one_level_is_the_unset_sentinel() {
        let user = parse(r#"{"user_type":"admin","username":"root","user_level":-1,"audit_status":3}"#);
        let UserSnapshot::Admin(admin) = user else {
            panic!("expected admin snapshot");
        };
        assert_eq!(admin.level, UserLevel::Unset);
        assert_eq!(admin.audit, AuditStatus::Pending);
    }

    #[test]
    fn missing_audit_status_reads_as_not_submitted() {
        let user = parse(r#"{"user_type":"enterprise","username":"acme"}"#);
        assert_eq!(user.audit_status(), Some(AuditStatus::NotSubmitted));
    }

    #[test]
    fn unknown_user_type_is_kept_as_unrecognized() {
        let user = parse(r#"{"user_type":"auditor","username":"x","audit_status":2}"#);
        assert_eq!(user.user_type(), None);
        assert_eq!(user.user_type_label(), "auditor");
        assert_eq!(user.audit_status(), None);
    }

    #[test]
    fn enterprise_staff_profile_is_typed() {
        let user = parse(
            r#"{
                "user_id": 12,
                "user_type": "enterprise",
                "username": "li.wei",
                "audit_status": 2,
                "enterprise_user": {
                    "id": 5,
                    "name": "Li Wei",
                    "phone": "13800000000",
                    "role_type": "approver",
                    "enterprise_id": 9,
                    "department_id": 3
                }
            }"#,
        );

        let UserSnapshot::Enterprise(ent) = &user else {
            panic!("expected enterprise snapshot");
        };
        let staff = ent.staff.as_ref().unwrap();
        assert_eq!(staff.organization, EnterpriseId::new(9));
        assert_eq!(staff.department, Some(DepartmentId::new(3)));
        assert_eq!(user.role(), Some(PortalRole::Enterprise(StaffRole::Approver)));
        assert_eq!(user.account().id, Some(UserId::new(12)));
    }

    #[test]
    fn staff_profile_without_owner_is_dropped() {
        let user = parse(
            r#"{"user_type":"contractor","username":"c","contractor_user":{"name":"C","role_type":"manager"}}"#,
        );
        let UserSnapshot::Contractor(con) = user else {
            panic!("expected contractor snapshot");
        };
        assert!(con.staff.is_none());
    }

    #[test]
    fn empty_username_is_rejected() {
        let err = UserSnapshot::from_json(br#"{"user_type":"admin","username":"  "}"#).unwrap_err();
        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = UserSnapshot::from_json(b"<html>").unwrap_err();
        assert!(err.to_string().contains("user payload"));
    }
}
