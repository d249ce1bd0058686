use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Request Payloads (Input Schemas) ---

/// NavigationQuery
///
/// Query parameters for `GET /api/navigation`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct NavigationQuery {
    /// The path the client wants to enter, e.g. `/admin/reports`.
    pub path: String,
}

/// BuildPathRequest
///
/// Placeholder values for `POST /api/paths/{tier}/{name}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BuildPathRequest {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

// --- Response Payloads (Output Schemas) ---

/// BuildPathResponse
///
/// The concrete URL produced by a path builder.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BuildPathResponse {
    pub path: String,
}
