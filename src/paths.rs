use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::PathError;

/// RouteTier
///
/// The access tier a logical route belongs to. Route names are unique within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RouteTier {
    Public,
    Protected,
    Admin,
    User,
}

impl RouteTier {
    pub const ALL: [RouteTier; 4] = [
        RouteTier::Public,
        RouteTier::Protected,
        RouteTier::Admin,
        RouteTier::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteTier::Public => "public",
            RouteTier::Protected => "protected",
            RouteTier::Admin => "admin",
            RouteTier::User => "user",
        }
    }

    /// The static route table of this tier.
    pub fn routes(self) -> &'static [RouteDescriptor] {
        match self {
            RouteTier::Public => public::ALL,
            RouteTier::Protected => protected::ALL,
            RouteTier::Admin => admin::ALL,
            RouteTier::User => user::ALL,
        }
    }
}

impl fmt::Display for RouteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("unknown route tier `{s}`"))
    }
}

/// RouteDescriptor
///
/// A named logical route and its URL template. Placeholders occupy a whole path
/// segment and are written `{name}`, e.g. `/squares/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: &'static str,
    pub pattern: &'static str,
}

enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn is_dot_segment(value: &str) -> bool {
    value == "." || value == ".."
}

/// The canonical spelling of `path`: one leading slash, no empty segments, no
/// trailing slash (except for the root itself).
pub fn canonical(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

fn classify(segment: &str) -> Segment<'_> {
    match segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(name) => Segment::Param(name),
        None => Segment::Literal(segment),
    }
}

impl RouteDescriptor {
    pub const fn new(name: &'static str, pattern: &'static str) -> Self {
        Self { name, pattern }
    }

    /// Placeholder names in the order they appear in the pattern.
    pub fn placeholders(&self) -> Vec<&'static str> {
        segments(self.pattern)
            .filter_map(|segment| match classify(segment) {
                Segment::Param(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Checks that the pattern is a well-formed URL template.
    pub fn validate(&self) -> Result<(), PathError> {
        let invalid = |reason: &str| PathError::InvalidPattern {
            pattern: self.pattern.to_string(),
            reason: reason.to_string(),
        };

        if !self.pattern.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }

        let mut seen = Vec::new();
        for segment in segments(self.pattern) {
            match classify(segment) {
                Segment::Param(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return Err(invalid("placeholder names must be non-empty identifiers"));
                    }
                    if seen.contains(&name) {
                        return Err(invalid("placeholder declared twice"));
                    }
                    seen.push(name);
                }
                Segment::Literal(text) => {
                    if text.contains('{') || text.contains('}') {
                        return Err(invalid("placeholders must span a whole segment"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Substitutes every placeholder with its percent-encoded value.
    ///
    /// Fails with `MissingParam` / `EmptyParam` rather than emitting a partially
    /// substituted URL, and with `InvalidParam` for a value of `.` or `..`.
    /// Parameters the pattern does not declare are ignored.
    pub fn build<I, K, V>(&self, params: I) -> Result<String, PathError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        let mut url = String::new();
        for segment in segments(self.pattern) {
            url.push('/');
            match classify(segment) {
                Segment::Literal(text) => url.push_str(text),
                Segment::Param(name) => {
                    let value = params.get(name).ok_or_else(|| PathError::MissingParam {
                        route: self.name.to_string(),
                        param: name.to_string(),
                    })?;
                    if value.is_empty() {
                        return Err(PathError::EmptyParam {
                            route: self.name.to_string(),
                            param: name.to_string(),
                        });
                    }
                    // Percent-encoding leaves dots alone; a bare `.`/`..` would be
                    // collapsed by the browser into a different route.
                    if is_dot_segment(value) {
                        return Err(PathError::InvalidParam {
                            route: self.name.to_string(),
                            param: name.to_string(),
                        });
                    }
                    url.push_str(&urlencoding::encode(value));
                }
            }
        }

        if url.is_empty() {
            url.push('/');
        }
        Ok(url)
    }

    /// Matches a concrete path against the pattern, returning decoded parameters.
    /// A parameter that decodes to `.` or `..` never matches.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut pattern = segments(self.pattern);
        let mut concrete = segments(path);
        let mut params = BTreeMap::new();

        loop {
            match (pattern.next(), concrete.next()) {
                (None, None) => return Some(params),
                (Some(expected), Some(actual)) => match classify(expected) {
                    Segment::Literal(text) if text == actual => {}
                    Segment::Literal(_) => return None,
                    Segment::Param(name) => {
                        let value = urlencoding::decode(actual).ok()?;
                        if is_dot_segment(&value) {
                            return None;
                        }
                        params.insert(name.to_string(), value.into_owned());
                    }
                },
                _ => return None,
            }
        }
    }
}

/// Public routes: reachable without a session.
pub mod public {
    use super::RouteDescriptor;

    pub const HOME: RouteDescriptor = RouteDescriptor::new("home", "/");
    pub const LOGIN: RouteDescriptor = RouteDescriptor::new("login", "/login");
    pub const REGISTER: RouteDescriptor = RouteDescriptor::new("register", "/register");
    pub const SQUARES: RouteDescriptor = RouteDescriptor::new("squares", "/squares");
    pub const SQUARE_DETAIL: RouteDescriptor =
        RouteDescriptor::new("square_detail", "/squares/{id}");
    pub const ABOUT: RouteDescriptor = RouteDescriptor::new("about", "/about");

    pub const ALL: &[RouteDescriptor] = &[HOME, LOGIN, REGISTER, SQUARES, SQUARE_DETAIL, ABOUT];
}

/// Protected routes: any authenticated identity.
pub mod protected {
    use super::RouteDescriptor;

    pub const DASHBOARD: RouteDescriptor = RouteDescriptor::new("dashboard", "/dashboard");
    pub const PROFILE: RouteDescriptor = RouteDescriptor::new("profile", "/profile");
    pub const SETTINGS: RouteDescriptor = RouteDescriptor::new("settings", "/settings");

    pub const ALL: &[RouteDescriptor] = &[DASHBOARD, PROFILE, SETTINGS];
}

/// Admin routes: moderation of squares, users and reports.
pub mod admin {
    use super::RouteDescriptor;

    pub const DASHBOARD: RouteDescriptor = RouteDescriptor::new("admin_dashboard", "/admin");
    pub const USERS: RouteDescriptor = RouteDescriptor::new("admin_users", "/admin/users");
    pub const USER_DETAIL: RouteDescriptor =
        RouteDescriptor::new("admin_user_detail", "/admin/users/{id}");
    pub const SQUARES: RouteDescriptor = RouteDescriptor::new("admin_squares", "/admin/squares");
    pub const SQUARE_DETAIL: RouteDescriptor =
        RouteDescriptor::new("admin_square_detail", "/admin/squares/{id}");
    pub const REPORTS: RouteDescriptor = RouteDescriptor::new("admin_reports", "/admin/reports");
    pub const REPORT_DETAIL: RouteDescriptor =
        RouteDescriptor::new("admin_report_detail", "/admin/reports/{id}");

    pub const ALL: &[RouteDescriptor] = &[
        DASHBOARD,
        USERS,
        USER_DETAIL,
        SQUARES,
        SQUARE_DETAIL,
        REPORTS,
        REPORT_DETAIL,
    ];
}

/// User routes: a citizen's own adoptions and reports.
pub mod user {
    use super::RouteDescriptor;

    pub const MY_ADOPTIONS: RouteDescriptor =
        RouteDescriptor::new("my_adoptions", "/user/adoptions");
    pub const ADOPTION_DETAIL: RouteDescriptor =
        RouteDescriptor::new("adoption_detail", "/user/adoptions/{id}");
    pub const MY_REPORTS: RouteDescriptor = RouteDescriptor::new("my_reports", "/user/reports");
    pub const REPORT_DETAIL: RouteDescriptor =
        RouteDescriptor::new("report_detail", "/user/reports/{id}");
    pub const NEW_REPORT: RouteDescriptor =
        RouteDescriptor::new("new_report", "/user/squares/{squareId}/reports/new");

    pub const ALL: &[RouteDescriptor] = &[
        MY_ADOPTIONS,
        ADOPTION_DETAIL,
        MY_REPORTS,
        REPORT_DETAIL,
        NEW_REPORT,
    ];
}

/// Where unauthenticated visitors are sent.
pub const LOGIN_ROUTE: RouteDescriptor = public::LOGIN;

/// Where authenticated but unauthorized visitors are sent.
pub const DEFAULT_LANDING_ROUTE: RouteDescriptor = protected::DASHBOARD;

/// Finds a route by tier and name.
pub fn lookup(tier: RouteTier, name: &str) -> Result<&'static RouteDescriptor, PathError> {
    tier.routes()
        .iter()
        .find(|route| route.name == name)
        .ok_or_else(|| PathError::UnknownRoute {
            tier,
            name: name.to_string(),
        })
}

// --- Typed builders ---

pub fn square_detail(id: &str) -> Result<String, PathError> {
    public::SQUARE_DETAIL.build([("id", id)])
}

pub fn admin_user_detail(id: &str) -> Result<String, PathError> {
    admin::USER_DETAIL.build([("id", id)])
}

pub fn admin_square_detail(id: &str) -> Result<String, PathError> {
    admin::SQUARE_DETAIL.build([("id", id)])
}

pub fn admin_report_detail(id: &str) -> Result<String, PathError> {
    admin::REPORT_DETAIL.build([("id", id)])
}

pub fn adoption_detail(id: &str) -> Result<String, PathError> {
    user::ADOPTION_DETAIL.build([("id", id)])
}

pub fn report_detail(id: &str) -> Result<String, PathError> {
    user::REPORT_DETAIL.build([("id", id)])
}

pub fn new_report(square_id: &str) -> Result<String, PathError> {
    user::NEW_REPORT.build([("squareId", square_id)])
}
