use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    error::AppError,
    models::{BuildPathRequest, BuildPathResponse, NavigationQuery},
    paths::{self, RouteTier},
    routes::Resolution,
    session::CurrentSession,
    theme::{self, ThemeMode, ThemeSnapshot},
};

// --- Theme ---

/// get_theme
///
/// Current appearance mode of the process-wide theme store.
///
/// *Failure*: 500 when the store is not installed.
#[utoipa::path(
    get,
    path = "/api/theme",
    responses(
        (status = 200, description = "Current theme", body = ThemeSnapshot),
        (status = 500, description = "Theme store not installed")
    )
)]
pub async fn get_theme() -> Result<Json<ThemeSnapshot>, AppError> {
    Ok(Json(theme::use_theme()?.read()?))
}

/// toggle_theme
///
/// Flips light/dark. The new mode is persisted before the response is sent.
#[utoipa::path(
    post,
    path = "/api/theme/toggle",
    responses(
        (status = 200, description = "Theme after toggling", body = ThemeSnapshot),
        (status = 500, description = "Persistence failed or store not installed")
    )
)]
pub async fn toggle_theme() -> Result<Json<ThemeSnapshot>, AppError> {
    Ok(Json(theme::use_theme()?.toggle()?))
}

// --- Navigation ---

/// resolve_navigation
///
/// Resolves a path against the route table for the caller's session without
/// performing the navigation. Client-side routers use this before each transition.
#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Resolution", body = Resolution))
)]
pub async fn resolve_navigation(
    session: CurrentSession,
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> Json<Resolution> {
    Json(state.routes.resolve(&query.path, &session))
}

/// build_path
///
/// Turns a logical route plus parameters into a concrete URL.
///
/// *Errors*: 404 for an unknown route, 422 when a placeholder is missing, empty,
/// or `.`/`..`.
#[utoipa::path(
    post,
    path = "/api/paths/{tier}/{name}",
    params(
        ("tier" = RouteTier, Path, description = "Route tier"),
        ("name" = String, Path, description = "Route name within the tier")
    ),
    request_body = BuildPathRequest,
    responses(
        (status = 200, description = "Built", body = BuildPathResponse),
        (status = 404, description = "Unknown route"),
        (status = 422, description = "Missing, empty or dot-segment parameter")
    )
)]
pub async fn build_path(
    Path((tier, name)): Path<(RouteTier, String)>,
    Json(payload): Json<BuildPathRequest>,
) -> Result<Json<BuildPathResponse>, AppError> {
    let route = paths::lookup(tier, &name)?;
    let path = route.build(&payload.params)?;
    Ok(Json(BuildPathResponse { path }))
}

// --- Page shell ---

fn page(title: &str, mode: ThemeMode, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html class=\"{mode}\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>{body}</body>\n</html>\n",
        mode = mode.as_str(),
    )
}

/// render_page
///
/// Fallback for every non-API path: the navigation layer that interprets a
/// `Resolution`. A `Navigate` becomes a 303 redirect; the browser does not keep
/// a history entry for a redirected request, which gives replace semantics.
pub async fn render_page(
    session: CurrentSession,
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, AppError> {
    let mode = theme::use_theme()?.read()?.mode;

    let response = match state.routes.resolve(uri.path(), &session) {
        Resolution::Render { route, view, .. } => {
            let body = format!("<main data-route=\"{route}\" data-view=\"{view}\"></main>");
            Html(page(&view, mode, &body)).into_response()
        }
        Resolution::Navigate { command } => Redirect::to(&command.to).into_response(),
        Resolution::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Html(page("Not Found", mode, "<main data-view=\"NotFoundPage\"></main>")),
        )
            .into_response(),
    };

    Ok(response)
}
