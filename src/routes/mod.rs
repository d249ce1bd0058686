//! Route Table
//!
//! The application's navigation map as plain data: every logical route is
//! registered once with the view it renders and the resolver stages guarding it.
//! Resolution is a pure function of the requested path and the current session,
//! so it can be exercised without any HTTP or rendering harness.
//!
//! Entries are grouped by access tier, mirroring the Path Registry.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::ConfigError,
    guard::{self, GuardDecision, NavigationCommand, RequiredRoles},
    paths::{self, LOGIN_ROUTE, RouteDescriptor, RouteTier},
    session::SessionOracle,
};

/// Routes reachable without a session.
pub mod public;

/// Routes for any signed-in identity, plus the citizen ('user') tier.
pub mod protected;

/// Routes restricted to the 'admin' role.
pub mod admin;

/// ResolverStage
///
/// One check in a route's resolution pipeline. Stages run in registration order
/// and the first redirect wins.
pub trait ResolverStage: Send + Sync {
    fn check(&self, session: &dyn SessionOracle) -> GuardDecision;

    /// Rejects stage configurations that could never behave correctly.
    fn validate(&self, _route: &str) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// RoleGuard
///
/// The role-based route guard as a resolver stage.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    roles: RequiredRoles,
}

impl RoleGuard {
    pub fn new(roles: RequiredRoles) -> Self {
        Self { roles }
    }
}

impl ResolverStage for RoleGuard {
    fn check(&self, session: &dyn SessionOracle) -> GuardDecision {
        guard::evaluate(&self.roles, session)
    }

    fn validate(&self, route: &str) -> Result<(), ConfigError> {
        if self.roles.is_empty() {
            return Err(ConfigError::EmptyRoleSet {
                route: route.to_string(),
            });
        }
        Ok(())
    }
}

/// SignedIn
///
/// Admits any identity regardless of role. Guards the default landing route, which
/// must accept every identity the role guard sends there.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedIn;

impl ResolverStage for SignedIn {
    fn check(&self, session: &dyn SessionOracle) -> GuardDecision {
        match session.current_user() {
            Some(_) => GuardDecision::Allow,
            None => GuardDecision::Redirect(NavigationCommand::replace(LOGIN_ROUTE.pattern)),
        }
    }
}

/// RouteEntry
///
/// A logical route bound to the view it renders.
pub struct RouteEntry {
    pub tier: RouteTier,
    pub descriptor: RouteDescriptor,
    pub view: &'static str,
    stages: Vec<Box<dyn ResolverStage>>,
}

impl RouteEntry {
    pub fn new(tier: RouteTier, descriptor: RouteDescriptor, view: &'static str) -> Self {
        Self {
            tier,
            descriptor,
            view,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl ResolverStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn guarded<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_stage(RoleGuard::new(RequiredRoles::new(roles)))
    }

    pub fn signed_in(self) -> Self {
        self.with_stage(SignedIn)
    }
}

/// Resolution
///
/// What the navigation layer should do with a requested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export)]
pub enum Resolution {
    /// Render `view` inside the tier's layout.
    Render {
        route: String,
        tier: RouteTier,
        view: String,
        params: BTreeMap<String, String>,
    },
    /// Navigate elsewhere instead of rendering.
    Navigate { command: NavigationCommand },
    /// No route matches the path.
    NotFound { path: String },
}

/// RouteTable
///
/// The registered routes, matched in registration order.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full application table: public, protected, user and admin tiers.
    pub fn standard() -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for entry in public::entries()
            .into_iter()
            .chain(protected::entries())
            .chain(admin::entries())
        {
            table.register(entry)?;
        }
        Ok(table)
    }

    /// register
    ///
    /// Adds a route after checking its pattern and stages. Fails fast on a malformed
    /// pattern, a duplicate name within the tier, or a guard with no roles.
    pub fn register(&mut self, entry: RouteEntry) -> Result<(), ConfigError> {
        entry.descriptor.validate()?;

        let duplicate = self
            .entries
            .iter()
            .any(|e| e.tier == entry.tier && e.descriptor.name == entry.descriptor.name);
        if duplicate {
            return Err(ConfigError::DuplicateRoute {
                route: entry.descriptor.name.to_string(),
            });
        }

        for stage in &entry.stages {
            stage.validate(entry.descriptor.name)?;
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tiers that have at least one registered route.
    pub fn tiers(&self) -> HashSet<RouteTier> {
        self.entries.iter().map(|e| e.tier).collect()
    }

    fn find(&self, path: &str) -> Option<(&RouteEntry, BTreeMap<String, String>)> {
        self.entries
            .iter()
            .find_map(|entry| entry.descriptor.matches(path).map(|params| (entry, params)))
    }

    /// resolve
    ///
    /// Matches `path` (query string and fragment ignored) and runs the matched
    /// route's stages against the session. Evaluated fresh on every call.
    /// A matching but non-canonical path (`//squares///17/`) navigates to its
    /// canonical spelling before any stage runs.
    pub fn resolve(&self, path: &str, session: &dyn SessionOracle) -> Resolution {
        let full = path;
        let path = full.split(['?', '#']).next().unwrap_or_default();

        let Some((entry, params)) = self.find(path) else {
            tracing::debug!(path, "no route matches");
            return Resolution::NotFound {
                path: path.to_string(),
            };
        };

        // One URL per page: stray or doubled slashes are sent to the canonical spelling.
        let canonical = paths::canonical(path);
        if canonical != path {
            let to = format!("{canonical}{}", &full[path.len()..]);
            tracing::debug!(path, %to, "non-canonical path");
            return Resolution::Navigate {
                command: NavigationCommand::replace(to),
            };
        }

        for stage in &entry.stages {
            if let GuardDecision::Redirect(command) = stage.check(session) {
                tracing::debug!(route = entry.descriptor.name, to = %command.to, "navigation redirected");
                return Resolution::Navigate { command };
            }
        }

        Resolution::Render {
            route: entry.descriptor.name.to_string(),
            tier: entry.tier,
            view: entry.view.to_string(),
            params,
        }
    }
}
