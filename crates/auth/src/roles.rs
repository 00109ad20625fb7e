use serde::{Deserialize, Serialize};

use crate::user::UserType;

/// Role of a staff member inside an enterprise or contractor company.
///
/// The backend sends this as a free-form `role_type` string; anything other
/// than the three known roles is kept out of the typed model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Manager,
    Approver,
    SiteStaff,
}

impl StaffRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "manager" => Some(Self::Manager),
            "approver" => Some(Self::Approver),
            "site_staff" => Some(Self::SiteStaff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Approver => "approver",
            Self::SiteStaff => "site_staff",
        }
    }

    /// Numeric permission level used by the backend (`role_level`).
    pub fn permission_level(&self) -> u8 {
        match self {
            Self::Manager => 3,
            Self::Approver => 2,
            Self::SiteStaff => 1,
        }
    }
}

impl core::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined role of a portal account, as used for menus and page-level checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PortalRole {
    Admin,
    Enterprise(StaffRole),
    Contractor(StaffRole),
}

impl PortalRole {
    pub fn user_type(&self) -> UserType {
        match self {
            Self::Admin => UserType::Admin,
            Self::Enterprise(_) => UserType::Enterprise,
            Self::Contractor(_) => UserType::Contractor,
        }
    }

    pub fn staff_role(&self) -> Option<StaffRole> {
        match self {
            Self::Admin => None,
            Self::Enterprise(role) | Self::Contractor(role) => Some(*role),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Enterprise(StaffRole::Manager) => "enterprise_manager",
            Self::Enterprise(StaffRole::Approver) => "enterprise_approver",
            Self::Enterprise(StaffRole::SiteStaff) => "enterprise_site_staff",
            Self::Contractor(StaffRole::Manager) => "contractor_manager",
            Self::Contractor(StaffRole::Approver) => "contractor_approver",
            Self::Contractor(StaffRole::SiteStaff) => "contractor_site_staff",
        }
    }
}

impl core::fmt::Display for PortalRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
