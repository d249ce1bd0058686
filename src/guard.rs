use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    paths::{DEFAULT_LANDING_ROUTE, LOGIN_ROUTE},
    session::SessionOracle,
};

/// RequiredRoles
///
/// The roles allowed into a guarded subtree. An empty set admits nobody.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequiredRoles(BTreeSet<String>);

impl RequiredRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// NavigationCommand
///
/// An instruction for the navigation layer. `replace` means the current history
/// entry is overwritten, so "back" never returns to the guarded URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationCommand {
    pub to: String,
    pub replace: bool,
}

impl NavigationCommand {
    pub fn replace(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            replace: true,
        }
    }
}

/// GuardDecision
///
/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "command", rename_all = "lowercase")]
#[ts(export)]
pub enum GuardDecision {
    /// Render the nested content.
    Allow,
    /// Leave for another route.
    Redirect(NavigationCommand),
}

/// evaluate
///
/// Decides access to a guarded subtree from the current session alone. Holds no
/// state between calls.
///
/// - no identity: redirect to login
/// - identity whose role is not in `required` (always the case when `required`
///   is empty): redirect to the default landing route
/// - otherwise: allow
pub fn evaluate<S>(required: &RequiredRoles, session: &S) -> GuardDecision
where
    S: SessionOracle + ?Sized,
{
    let Some(identity) = session.current_user() else {
        tracing::debug!("guard: no session, redirecting to login");
        return GuardDecision::Redirect(NavigationCommand::replace(LOGIN_ROUTE.pattern));
    };

    if required.is_empty() {
        tracing::warn!(
            role = %identity.role,
            "guard evaluated with an empty role set; denying access"
        );
    }

    if required.contains(&identity.role) {
        tracing::debug!(role = %identity.role, "guard: access granted");
        GuardDecision::Allow
    } else {
        tracing::debug!(role = %identity.role, "guard: role not permitted, redirecting");
        GuardDecision::Redirect(NavigationCommand::replace(DEFAULT_LANDING_ROUTE.pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AnonymousSession, StaticSession};

    fn to_login() -> GuardDecision {
        GuardDecision::Redirect(NavigationCommand::replace("/login"))
    }

    fn to_dashboard() -> GuardDecision {
        GuardDecision::Redirect(NavigationCommand::replace("/dashboard"))
    }

    #[test]
    fn test_decision_table() {
        let role_sets = [
            RequiredRoles::default(),
            RequiredRoles::new(["admin"]),
            RequiredRoles::new(["user", "admin"]),
        ];
        let roles = ["admin", "user", "guest", ""];

        for required in &role_sets {
            assert_eq!(evaluate(required, &AnonymousSession), to_login());
            assert_eq!(evaluate(required, &StaticSession(None)), to_login());

            for role in roles {
                let expected = if !required.is_empty() && required.contains(role) {
                    GuardDecision::Allow
                } else {
                    to_dashboard()
                };
                assert_eq!(
                    evaluate(required, &StaticSession::signed_in(role)),
                    expected,
                    "roles={required:?} role={role:?}"
                );
            }
        }
    }

    #[test]
    fn test_user_on_admin_route_lands_on_dashboard() {
        let decision = evaluate(&RequiredRoles::new(["admin"]), &StaticSession::signed_in("user"));
        match decision {
            GuardDecision::Redirect(cmd) => {
                assert_eq!(cmd.to, "/dashboard");
                assert!(cmd.replace);
            }
            GuardDecision::Allow => panic!("user must not enter admin subtree"),
        }
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(to_login()).unwrap();
        assert_eq!(json["kind"], "redirect");
        assert_eq!(json["command"]["to"], "/login");
        assert_eq!(json["command"]["replace"], true);
        assert_eq!(serde_json::to_value(GuardDecision::Allow).unwrap()["kind"], "allow");
    }
}
