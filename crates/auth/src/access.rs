use serde::Serialize;

use crate::user::{AuditStatus, UserSnapshot, UserType};

/// Well-known application paths the access policy can send a user to.
pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const DASHBOARD: &str = "/dashboard";
    pub const ADMIN_PERMISSION_APPLY: &str = "/admin/permission-apply";
    pub const ENTERPRISE_BIND: &str = "/enterprise/bind";
    pub const CONTRACTOR_BIND: &str = "/contractor/bind";
}

/// Outcome of evaluating an account against the onboarding policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "verdict", content = "path", rename_all = "snake_case")]
pub enum AccessVerdict {
    Allow,
    RedirectTo(&'static str),
}

impl AccessVerdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectTo(path) => Some(path),
        }
    }
}

/// Why an account is (or is not) let into the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Approved,
    Unauthenticated,
    /// The apply/bind form still has to be filled in.
    OnboardingIncomplete,
    PendingReview,
    /// Type or status code the policy does not know.
    Unrecognized,
}

/// Evaluate the current account.
///
/// - No IO
/// - No panics
/// - Total: unknown types and codes fail closed to the login page
pub fn evaluate(user: Option<&UserSnapshot>) -> AccessVerdict {
    assess(user).0
}

fn assess(user: Option<&UserSnapshot>) -> (AccessVerdict, AccessReason) {
    let Some(user) = user else {
        return (AccessVerdict::RedirectTo(paths::LOGIN), AccessReason::Unauthenticated);
    };

    match user {
        UserSnapshot::Admin(admin) => {
            if admin.level.is_unset() || admin.audit == AuditStatus::NotSubmitted {
                return (
                    AccessVerdict::RedirectTo(paths::ADMIN_PERMISSION_APPLY),
                    AccessReason::OnboardingIncomplete,
                );
            }
            audit_verdict(admin.audit, paths::ADMIN_PERMISSION_APPLY)
        }
        UserSnapshot::Enterprise(ent) => audit_verdict(ent.audit, paths::ENTERPRISE_BIND),
        UserSnapshot::Contractor(con) => audit_verdict(con.audit, paths::CONTRACTOR_BIND),
        UserSnapshot::Unrecognized { .. } => {
            (AccessVerdict::RedirectTo(paths::LOGIN), AccessReason::Unrecognized)
        }
    }
}

fn audit_verdict(audit: AuditStatus, onboarding_path: &'static str) -> (AccessVerdict, AccessReason) {
    match audit {
        AuditStatus::NotSubmitted => (
            AccessVerdict::RedirectTo(onboarding_path),
            AccessReason::OnboardingIncomplete,
        ),
        AuditStatus::Pending => (AccessVerdict::RedirectTo(paths::LOGIN), AccessReason::PendingReview),
        AuditStatus::Approved => (AccessVerdict::Allow, AccessReason::Approved),
        AuditStatus::Other(_) => (AccessVerdict::RedirectTo(paths::LOGIN), AccessReason::Unrecognized),
    }
}

/// The self-service page an account type uses to complete onboarding.
pub fn onboarding_path(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Admin => paths::ADMIN_PERMISSION_APPLY,
        UserType::Enterprise => paths::ENTERPRISE_BIND,
        UserType::Contractor => paths::CONTRACTOR_BIND,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation (diagnostics)
// ─────────────────────────────────────────────────────────────────────────────

/// Serializable explanation of an access verdict.
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub verdict: AccessVerdict,
    pub reason: AccessReason,
    pub username: Option<String>,
    pub user_type: Option<String>,
    pub audit_status: Option<i64>,
    pub message: String,
    pub remediation: Option<String>,
}

/// Explain the verdict [`evaluate`] would return for `user`.
pub fn explain(user: Option<&UserSnapshot>) -> AccessExplanation {
    let (verdict, reason) = assess(user);

    let message = match reason {
        AccessReason::Approved => "account is approved".to_string(),
        AccessReason::Unauthenticated => "no signed-in account".to_string(),
        AccessReason::OnboardingIncomplete => "onboarding application has not been submitted".to_string(),
        AccessReason::PendingReview => "onboarding application is waiting for review".to_string(),
        AccessReason::Unrecognized => format!(
            "unrecognized account state (type '{}', audit status {:?})",
            user.map(|u| u.user_type_label()).unwrap_or_default(),
            user.and_then(|u| u.audit_status()).map(|a| a.code()),
        ),
    };

    let remediation = match reason {
        AccessReason::Approved => None,
        AccessReason::Unauthenticated => Some("sign in".to_string()),
        AccessReason::OnboardingIncomplete => verdict
            .redirect_path()
            .map(|path| format!("complete the form at {path}")),
        AccessReason::PendingReview => Some("wait for an administrator to approve the application".to_string()),
        AccessReason::Unrecognized => Some("contact a portal administrator".to_string()),
    };

    AccessExplanation {
        verdict,
        reason,
        username: user.map(|u| u.username().to_string()),
        user_type: user.map(|u| u.user_type_label().to_string()),
        audit_status: user.and_then(|u| u.audit_status()).map(|a| a.code()),
        message,
        remediation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Account, AdminUser, ContractorUser, EnterpriseUser, UserLevel};
    use proptest::prelude::*;

    fn account() -> Account {
        Account {
            id: None,
            username: "tester".to_string(),
            phone: None,
            email: None,
            user_status: None,
        }
    }

    fn admin(level: UserLevel, audit: AuditStatus) -> UserSnapshot {
        UserSnapshot::Admin(AdminUser {
            account: account(),
            level,
            audit,
        })
    }

    fn enterprise(audit: AuditStatus) -> UserSnapshot {
        UserSnapshot::Enterprise(EnterpriseUser {
            account: account(),
            audit,
            staff: None,
        })
    }

    fn contractor(audit: AuditStatus) -> UserSnapshot {
        UserSnapshot::Contractor(ContractorUser {
            account: account(),
            audit,
            staff: None,
        })
    }

    fn audit_strategy() -> impl Strategy<Value = AuditStatus> {
        prop_oneof![
            Just(AuditStatus::NotSubmitted),
            Just(AuditStatus::Approved),
            Just(AuditStatus::Pending),
            (4i64..1000).prop_map(AuditStatus::Other),
            (-1000i64..=0).prop_map(AuditStatus::Other),
        ]
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(evaluate(None), AccessVerdict::RedirectTo(paths::LOGIN));
    }

    #[test]
    fn admin_not_submitted_goes_to_permission_apply() {
        let user = admin(UserLevel::Level(1), AuditStatus::NotSubmitted);
        assert_eq!(
            evaluate(Some(&user)),
            AccessVerdict::RedirectTo(paths::ADMIN_PERMISSION_APPLY)
        );
    }

    #[test]
    fn pending_accounts_only_reach_login() {
        for user in [
            admin(UserLevel::Level(0), AuditStatus::Pending),
            enterprise(AuditStatus::Pending),
            contractor(AuditStatus::Pending),
        ] {
            assert_eq!(evaluate(Some(&user)), AccessVerdict::RedirectTo(paths::LOGIN));
        }
    }

    #[test]
    fn unbound_staff_go_to_their_bind_page() {
        assert_eq!(
            evaluate(Some(&enterprise(AuditStatus::NotSubmitted))),
            AccessVerdict::RedirectTo(paths::ENTERPRISE_BIND)
        );
        assert_eq!(
            evaluate(Some(&contractor(AuditStatus::NotSubmitted))),
            AccessVerdict::RedirectTo(paths::CONTRACTOR_BIND)
        );
    }

    #[test]
    fn unknown_audit_code_fails_closed() {
        let user = enterprise(AuditStatus::Other(7));
        assert_eq!(evaluate(Some(&user)), AccessVerdict::RedirectTo(paths::LOGIN));
        assert_eq!(explain(Some(&user)).reason, AccessReason::Unrecognized);
    }

    #[test]
    fn explanation_names_the_remediation_page() {
        let user = contractor(AuditStatus::NotSubmitted);
        let explanation = explain(Some(&user));
        assert_eq!(explanation.reason, AccessReason::OnboardingIncomplete);
        assert_eq!(explanation.audit_status, Some(1));
        assert!(explanation.remediation.unwrap().contains(paths::CONTRACTOR_BIND));
    }

    #[test]
    fn explanation_serializes_verdict_with_path() {
        let json = serde_json::to_value(explain(None)).unwrap();
        assert_eq!(json["verdict"]["verdict"], "redirect_to");
        assert_eq!(json["verdict"]["path"], paths::LOGIN);
        assert_eq!(json["reason"], "unauthenticated");
    }

    #[test]
    fn onboarding_path_matches_policy_redirects() {
        assert_eq!(onboarding_path(UserType::Enterprise), paths::ENTERPRISE_BIND);
        assert_eq!(onboarding_path(UserType::Admin), paths::ADMIN_PERMISSION_APPLY);
    }

    proptest! {
        #[test]
        fn unrecognized_types_always_go_to_login(label in "[a-z_]{1,12}") {
            prop_assume!(UserType::parse(&label).is_none());
            let user = UserSnapshot::Unrecognized { account: account(), user_type: label };
            prop_assert_eq!(evaluate(Some(&user)), AccessVerdict::RedirectTo(paths::LOGIN));
        }

        #[test]
        fn admin_without_level_always_goes_to_permission_apply(audit in audit_strategy()) {
            let user = admin(UserLevel::Unset, audit);
            prop_assert_eq!(
                evaluate(Some(&user)),
                AccessVerdict::RedirectTo(paths::ADMIN_PERMISSION_APPLY)
            );
        }

        #[test]
        fn approved_accounts_with_level_are_allowed(level in 0i64..10) {
            prop_assert_eq!(evaluate(Some(&admin(UserLevel::Level(level), AuditStatus::Approved))), AccessVerdict::Allow);
            prop_assert_eq!(evaluate(Some(&enterprise(AuditStatus::Approved))), AccessVerdict::Allow);
            prop_assert_eq!(evaluate(Some(&contractor(AuditStatus::Approved))), AccessVerdict::Allow);
        }

        #[test]
        fn redirects_only_target_known_pages(level in prop_oneof![Just(UserLevel::Unset), (0i64..5).prop_map(UserLevel::Level)], audit in audit_strategy()) {
            let known = [
                paths::LOGIN,
                paths::ADMIN_PERMISSION_APPLY,
                paths::ENTERPRISE_BIND,
                paths::CONTRACTOR_BIND,
            ];
            for user in [admin(level, audit), enterprise(audit), contractor(audit)] {
                if let AccessVerdict::RedirectTo(path) = evaluate(Some(&user)) {
                    prop_assert!(known.contains(&path));
                }
            }
        }
    }
}
