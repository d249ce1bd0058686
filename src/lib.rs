use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: path registry, theme store, session boundary, route guard.
pub mod guard;
pub mod paths;
pub mod session;
pub mod theme;

// Explicit route table evaluated by the navigation layer.
pub mod routes;

// HTTP navigation layer and its ambient pieces.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, ConfigError, PathError, ThemeError};
pub use routes::{Resolution, RouteTable};

/// ApiDoc
///
/// OpenAPI document for the shell's JSON endpoints, served at
/// `/api-docs/openapi.json` and browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_theme, handlers::toggle_theme,
        handlers::resolve_navigation, handlers::build_path
    ),
    components(
        schemas(
            theme::ThemeMode, theme::ThemeSnapshot, guard::NavigationCommand,
            routes::Resolution, paths::RouteTier, models::BuildPathRequest,
            models::BuildPathResponse,
        )
    ),
    tags(
        (name = "public-squares-web", description = "Public Squares UI shell")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request of the navigation
/// layer. Cloning is cheap: the route table sits behind an `Arc`.
///
/// The theme store is not held here: it is the process-wide instance reached
/// through `theme::use_theme`, with its own install/teardown lifetime.
#[derive(Clone)]
pub struct AppState {
    /// Route Table: every page route with its view and resolver stages.
    pub routes: Arc<RouteTable>,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds state around the standard route table, failing on misconfiguration
    /// (an empty role set, a route registered twice, a malformed pattern).
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            routes: Arc::new(RouteTable::standard()?),
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets the `CurrentSession` extractor read the header-trust flag without
// depending on the whole AppState.
impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the JSON API, the page fallback and the observability layers, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. JSON API: theme, navigation resolution and path building.
    let api = Router::new()
        .route("/theme", get(handlers::get_theme))
        .route("/theme/toggle", post(handlers::toggle_theme))
        .route("/navigation", get(handlers::resolve_navigation))
        .route("/paths/{tier}/{name}", post(handlers::build_path));

    // 3. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        // Pages: every other path is resolved through the route table.
        // Only GET (and HEAD) render a page; other methods get 405.
        .fallback(get(handlers::render_page))
        // Apply the shared state to all routes.
        .with_state(state);

    // 4. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a fresh UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: one span per request, tagged with that ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (Applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to build the request span. It reads the
/// `x-request-id` header (if present) and records it next to the HTTP method
/// and URI, so every log line of one request is correlated by a single ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // The structured log format used by the tracing macros.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
