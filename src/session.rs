use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;

/// Header carrying the authenticated user's id, set by the upstream auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role, set by the upstream auth proxy.
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Identity
///
/// The authenticated user as reported by the identity provider. The core only
/// ever reads `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Identity {
    pub id: Option<Uuid>,
    // RBAC field: 'user' or 'admin'.
    pub role: String,
}

impl Identity {
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            id: None,
            role: role.into(),
        }
    }
}

/// SessionOracle
///
/// Read-only view of the current session. Implementations are owned by the
/// identity provider; nothing in this crate writes through it.
pub trait SessionOracle: Send + Sync {
    fn current_user(&self) -> Option<Identity>;
}

/// No session at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

impl SessionOracle for AnonymousSession {
    fn current_user(&self) -> Option<Identity> {
        None
    }
}

/// A fixed session snapshot. Used by tests and by callers that already hold the
/// provider's output.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<Identity>);

impl StaticSession {
    pub fn signed_in(role: impl Into<String>) -> Self {
        Self(Some(Identity::with_role(role)))
    }
}

impl SessionOracle for StaticSession {
    fn current_user(&self) -> Option<Identity> {
        self.0.clone()
    }
}

/// HeaderSession
///
/// Identity forwarded by the auth proxy in front of the shell. A request without
/// a non-empty role header is anonymous; a malformed id is dropped, not rejected.
#[derive(Debug, Clone, Default)]
pub struct HeaderSession {
    identity: Option<Identity>,
}

impl HeaderSession {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let identity = header(USER_ROLE_HEADER).map(|role| Identity {
            id: header(USER_ID_HEADER).and_then(|raw| Uuid::parse_str(raw).ok()),
            role: role.to_string(),
        });

        Self { identity }
    }
}

impl SessionOracle for HeaderSession {
    fn current_user(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

/// CurrentSession Extractor
///
/// The session oracle for one HTTP request. Identity headers are only read when
/// the configuration trusts the proxy in front of the shell; otherwise every
/// request is anonymous. Never rejects: absence of a session is a normal state.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Identity>);

impl SessionOracle for CurrentSession {
    fn current_user(&self) -> Option<Identity> {
        self.0.clone()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        if !config.trust_identity_headers {
            return Ok(Self(None));
        }
        Ok(Self(HeaderSession::from_headers(&parts.headers).current_user()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_session_reads_role_and_id() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("admin"));
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        let identity = HeaderSession::from_headers(&headers).current_user().unwrap();
        assert_eq!(identity.role, "admin");
        assert_eq!(identity.id, Some(id));
    }

    #[test]
    fn test_header_session_without_role_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(HeaderSession::from_headers(&headers).current_user().is_none());

        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("  "));
        assert!(HeaderSession::from_headers(&headers).current_user().is_none());
    }

    #[test]
    fn test_malformed_id_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("user"));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        let identity = HeaderSession::from_headers(&headers).current_user().unwrap();
        assert_eq!(identity, Identity::with_role("user"));
    }
}
