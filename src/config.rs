use std::{env, path::PathBuf};

/// Local fallback for the preferences file holding the persisted theme.
pub const DEFAULT_THEME_STORE_PATH: &str = ".public-squares/preferences.json";

/// AppConfig
///
/// Immutable configuration of the UI shell, loaded once at startup and shared
/// through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls logging format and identity-header trust.
    pub env: Env,
    // Durable key-value file backing the theme store.
    pub theme_store_path: PathBuf,
    // Socket address the shell listens on.
    pub bind_addr: String,
    // Whether identity headers forwarded by the auth proxy are believed.
    pub trust_identity_headers: bool,
}

/// Env
///
/// Runtime context: local development or a deployed instance behind the auth proxy.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            theme_store_path: PathBuf::from(DEFAULT_THEME_STORE_PATH),
            bind_addr: "127.0.0.1:0".to_string(),
            trust_identity_headers: true,
        }
    }
}

fn flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment.
    ///
    /// # Panics
    /// Panics in production when `THEME_STORE_PATH` is unset, so a deployment never
    /// silently writes preferences into its working directory.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let theme_store_path = match env {
            Env::Production => env::var("THEME_STORE_PATH")
                .expect("FATAL: THEME_STORE_PATH must be set in production."),
            Env::Local => env::var("THEME_STORE_PATH")
                .unwrap_or_else(|_| DEFAULT_THEME_STORE_PATH.to_string()),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        // Production only believes identity headers when told the proxy sets them.
        let trust_identity_headers = flag("TRUST_IDENTITY_HEADERS").unwrap_or(env == Env::Local);

        Self {
            env,
            theme_store_path: PathBuf::from(theme_store_path),
            bind_addr,
            trust_identity_headers,
        }
    }
}
