use public_squares_web::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, path::PathBuf};

// --- Setup/Teardown Utilities ---

const VARS: [&str; 4] = ["APP_ENV", "THEME_STORE_PATH", "BIND_ADDR", "TRUST_IDENTITY_HEADERS"];

/// Runs `test` with a clean slate for the shell's variables and restores them afterwards.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(
        config.theme_store_path,
        PathBuf::from(".public-squares/preferences.json")
    );
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert!(config.trust_identity_headers);
}

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // THEME_STORE_PATH is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without THEME_STORE_PATH"
    );
}

#[test]
#[serial]
fn test_app_config_production_distrusts_headers_by_default() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("THEME_STORE_PATH", "/var/lib/squares/prefs.json");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert!(!config.trust_identity_headers);

    let trusted = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("THEME_STORE_PATH", "/var/lib/squares/prefs.json");
            env::set_var("TRUST_IDENTITY_HEADERS", "true");
        }
        AppConfig::load()
    });
    assert!(trusted.trust_identity_headers);
}
