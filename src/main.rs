use public_squares_web::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    theme::{self, ClassList, FileStorage, ThemeStore},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing every core
/// component: Configuration, Logging, the Theme Store, the Route Table and the
/// HTTP Server.
///
/// The runtime is single-threaded, matching the event-loop model the core assumes.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() panics when production is missing THEME_STORE_PATH.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins when set; otherwise verbose defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "public_squares_web=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for centralized log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("UI shell starting in {:?} mode", config.env);

    // 4. Theme Store Initialization
    // Reads the persisted mode exactly once, applies the class hint, and installs
    // the single process-wide instance. Until installed the store answers nothing.
    let storage = Arc::new(FileStorage::new(&config.theme_store_path));
    let store = ThemeStore::initialize(storage, Arc::new(ClassList::new()));
    theme::install(store).expect("FATAL: theme store installed twice");
    tracing::info!(path = %config.theme_store_path.display(), "theme store installed");

    // 5. Route Table and Shared State
    // Fails fast on a misconfigured guard (empty role set) or a duplicate route.
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config).expect("FATAL: invalid route table");

    // 6. Router and Server Startup
    let app = create_router(state);

    // Binds the TCP listener and starts serving.
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited");
    }

    // 7. Shutdown: end the theme store's lifetime so stale handles fail loudly.
    theme::teardown();
}
