use public_squares_web::{
    AppConfig, AppState, Resolution, create_router,
    guard::NavigationCommand,
    session::{USER_ID_HEADER, USER_ROLE_HEADER},
    theme::{self, ClassList, MemoryStorage, ThemeSnapshot, ThemeStore},
};
use reqwest::{StatusCode, header::LOCATION, redirect::Policy};
use serial_test::serial;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

async fn spawn_with(config: AppConfig) -> TestApp {
    let state = AppState::new(config).expect("standard route table");
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are asserted on, not followed.
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp { address, client }
}

/// Starts the shell with a fresh in-memory theme store installed.
async fn spawn_app() -> TestApp {
    theme::teardown();
    let store = ThemeStore::initialize(Arc::new(MemoryStorage::new()), Arc::new(ClassList::new()));
    theme::install(store).unwrap();
    spawn_with(AppConfig::default()).await
}

impl TestApp {
    async fn get_page(&self, path: &str, role: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{}", self.address, path));
        if let Some(role) = role {
            request = request
                .header(USER_ROLE_HEADER, role)
                .header(USER_ID_HEADER, Uuid::new_v4().to_string());
        }
        request.send().await.expect("req fail")
    }

    async fn resolve(&self, path: &str, role: Option<&str>) -> Resolution {
        let mut request = self
            .client
            .get(format!("{}/api/navigation", self.address))
            .query(&[("path", path)]);
        if let Some(role) = role {
            request = request.header(USER_ROLE_HEADER, role);
        }
        request.send().await.unwrap().json().await.unwrap()
    }
}

#[tokio::test]
#[serial]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[serial]
async fn test_theme_read_and_toggle() {
    let app = spawn_app().await;

    let initial: ThemeSnapshot = app
        .client
        .get(format!("{}/api/theme", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!initial.is_dark);

    let toggled: serde_json::Value = app
        .client
        .post(format!("{}/api/theme/toggle", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled, serde_json::json!({ "mode": "dark", "isDark": true }));

    // The page shell reflects the new mode on its root element.
    let html = app.get_page("/", None).await.text().await.unwrap();
    assert!(html.contains(r#"<html class="dark">"#), "{html}");
}

#[tokio::test]
#[serial]
async fn test_theme_without_store_is_visible_failure() {
    let app = spawn_app().await;
    theme::teardown();

    let response = app
        .client
        .get(format!("{}/api/theme", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("outside its lifetime"));
}

#[tokio::test]
#[serial]
async fn test_anonymous_admin_page_redirects_to_login() {
    let app = spawn_app().await;
    let response = app.get_page("/admin", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
#[serial]
async fn test_user_admin_page_redirects_to_dashboard() {
    let app = spawn_app().await;
    let response = app.get_page("/admin/reports/3", Some("user")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/dashboard");

    let landing = app.get_page("/dashboard", Some("user")).await;
    assert_eq!(landing.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_admin_page_renders_for_admin() {
    let app = spawn_app().await;
    let response = app.get_page("/admin/users/5", Some("admin")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"data-view="AdminUserDetailPage""#));
}

#[tokio::test]
#[serial]
async fn test_unknown_page_is_not_found() {
    let app = spawn_app().await;
    let response = app.get_page("/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_navigation_api_resolutions() {
    let app = spawn_app().await;

    assert_eq!(
        app.resolve("/user/reports", None).await,
        Resolution::Navigate {
            command: NavigationCommand::replace("/login")
        }
    );

    match app.resolve("/user/squares/12/reports/new", Some("user")).await {
        Resolution::Render { route, params, .. } => {
            assert_eq!(route, "new_report");
            assert_eq!(params["squareId"], "12");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_untrusted_identity_headers_are_ignored() {
    theme::teardown();
    let store = ThemeStore::initialize(Arc::new(MemoryStorage::new()), Arc::new(ClassList::new()));
    theme::install(store).unwrap();
    let app = spawn_with(AppConfig {
        trust_identity_headers: false,
        ..AppConfig::default()
    })
    .await;

    let response = app.get_page("/admin", Some("admin")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
#[serial]
async fn test_build_path_endpoint() {
    let app = spawn_app().await;
    let url = |tier: &str, name: &str| format!("{}/api/paths/{}/{}", app.address, tier, name);

    let built: serde_json::Value = app
        .client
        .post(url("public", "square_detail"))
        .json(&serde_json::json!({ "params": { "id": "42" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(built["path"], "/squares/42");

    let missing = app
        .client
        .post(url("public", "square_detail"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let dotted = app
        .client
        .post(url("user", "adoption_detail"))
        .json(&serde_json::json!({ "params": { "id": ".." } }))
        .send()
        .await
        .unwrap();
    assert_eq!(dotted.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unknown = app
        .client
        .post(url("admin", "square_detail"))
        .json(&serde_json::json!({ "params": { "id": "1" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_pages_only_answer_get() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/dashboard", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app
        .client
        .delete(format!("{}/admin", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
#[serial]
async fn test_non_canonical_page_redirects_to_canonical() {
    let app = spawn_app().await;
    let response = app.get_page("/squares///17/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/squares/17");
}
