use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::paths::RouteTier;

/// PathError
///
/// Raised by the Path Registry when a URL cannot be produced without guessing.
/// A builder never returns a path that still contains a `{placeholder}` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no route named `{name}` in the {tier} tier")]
    UnknownRoute { tier: RouteTier, name: String },

    #[error("route `{route}` requires parameter `{param}`, which was not supplied")]
    MissingParam { route: String, param: String },

    #[error("route `{route}` received an empty value for parameter `{param}`")]
    EmptyParam { route: String, param: String },

    #[error("route `{route}` received `.` or `..` for parameter `{param}`, which would change the route")]
    InvalidParam { route: String, param: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// ThemeError
///
/// Failures of the process-wide Theme Store. `MissingContext` is a programmer error:
/// the store was read before `theme::install` or after `theme::teardown`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("theme store accessed outside its lifetime (not installed or already torn down)")]
    MissingContext,

    #[error("a theme store is already installed for this process")]
    AlreadyInstalled,

    #[error("theme persistence failed: {0}")]
    Storage(String),

    #[error("theme store lock poisoned")]
    LockPoisoned,
}

/// ConfigError
///
/// Misconfiguration detected while assembling the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("route `{route}` is guarded by an empty role set; no identity could ever enter it")]
    EmptyRoleSet { route: String },

    #[error("route `{route}` is registered twice")]
    DuplicateRoute { route: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// AppError
///
/// The single error type surfaced by the HTTP navigation layer. Configuration and
/// missing-context errors are not recovered: they become visible 500 responses so
/// the misuse is obvious to whoever is driving the UI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Path(PathError::UnknownRoute { .. }) => StatusCode::NOT_FOUND,
            AppError::Path(
                PathError::MissingParam { .. }
                | PathError::EmptyParam { .. }
                | PathError::InvalidParam { .. },
            ) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed on misconfiguration");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
