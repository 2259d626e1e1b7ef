mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use hrm_user_service::routes;

use common::{role, test_config, TestApp};

fn router(app: &TestApp) -> Router {
    routes::app(app.state.clone())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn alice() -> Value {
    json!({
        "username": "alice",
        "password": "pw123456",
        "first_name": "Alice",
        "last_name": "Nguyen",
        "phone": "0901234567",
        "email": "alice@example.com",
        "gender": "female"
    })
}

async fn register_and_login(app: &TestApp) -> Value {
    let (status, _) = send(router(app), json_request(Method::POST, "/api/auth/register", alice())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        router(app),
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "username": "alice", "password": "pw123456" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new();

    let response = router(&app)
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_returns_the_user_without_secrets() {
    let app = TestApp::new();

    let (status, body) = send(router(&app), json_request(Method::POST, "/api/auth/register", alice())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["first_name"], "Alice");
    assert_eq!(body["account"]["username"], "alice");
    assert_eq!(body["account"]["status"], "active");
    let raw = body.to_string();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("pw123456"));
}

#[tokio::test]
async fn invalid_registration_lists_field_errors() {
    let app = TestApp::new();
    let mut payload = alice();
    payload["phone"] = json!("12ab");
    payload["username"] = json!("a!");

    let (status, body) = send(router(&app), json_request(Method::POST, "/api/auth/register", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert!(body["details"]["phone"].is_array());
    assert!(body["details"]["username"].is_array());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = TestApp::new();
    send(router(&app), json_request(Method::POST, "/api/auth/register", alice())).await;

    let (status, body) = send(router(&app), json_request(Method::POST, "/api/auth/register", alice())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn login_then_me() {
    let app = TestApp::new();
    let login = register_and_login(&app).await;
    let token = login["access_token"].as_str().unwrap();

    assert_eq!(login["user"]["phone"], "0901234567");
    assert!(login["refresh_token"].as_str().is_some());

    let (status, body) = send(router(&app), authed(Method::GET, "/api/auth/me", token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["account"]["username"], "alice");
    assert_eq!(body["user"]["id"], login["user"]["id"]);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = TestApp::new();
    send(router(&app), json_request(Method::POST, "/api/auth/register", alice())).await;

    let (status, body) = send(
        router(&app),
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "username": "alice", "password": "wrongpw" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");
}

#[tokio::test]
async fn me_without_a_token_is_unauthorized() {
    let app = TestApp::new();

    let request = Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap();
    let (status, body) = send(router(&app), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");
}

#[tokio::test]
async fn expired_refresh_token_has_its_own_code() {
    let mut config = test_config();
    config.refresh_token_ttl = chrono::Duration::seconds(-1);
    let app = TestApp::with_config(config);
    let login = register_and_login(&app).await;

    let (status, body) = send(
        router(&app),
        json_request(
            Method::POST,
            "/api/auth/refresh-token",
            json!({ "refresh_token": login["refresh_token"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");
}

#[tokio::test]
async fn refresh_returns_a_bearer_pair() {
    let app = TestApp::new();
    let login = register_and_login(&app).await;

    let (status, body) = send(
        router(&app),
        json_request(
            Method::POST,
            "/api/auth/refresh-token",
            json!({ "refresh_token": login["refresh_token"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn user_routes_require_a_token() {
    let app = TestApp::new();

    let request = Request::builder().uri("/api/users").body(Body::empty()).unwrap();
    let (status, _) = send(router(&app), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let app = TestApp::new();
    app.perms.set_roles(vec![role("viewer", &["user:read"])]);
    let login = register_and_login(&app).await;
    let token = login["access_token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(router(&app), request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_routes_check_the_permission_snapshot() {
    let app = TestApp::new();
    let login = register_and_login(&app).await;
    let token = login["access_token"].as_str().unwrap();

    let (status, body) = send(router(&app), authed(Method::GET, "/api/users", token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    // A token minted after the grant carries it.
    app.perms.set_roles(vec![role("viewer", &["user:read"])]);
    let (_, refreshed) = send(
        router(&app),
        json_request(
            Method::POST,
            "/api/auth/refresh-token",
            json!({ "refresh_token": login["refresh_token"] }),
        ),
    )
    .await;
    let token = refreshed["access_token"].as_str().unwrap();

    let (status, body) = send(router(&app), authed(Method::GET, "/api/users?page=1&page_size=10", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    // Reading does not grant deleting.
    let id = login["user"]["id"].as_str().unwrap();
    let (status, _) = send(router(&app), authed(Method::DELETE, &format!("/api/users/{}", id), token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_create_and_delete_users() {
    let app = TestApp::new();
    app.perms.set_roles(vec![role("admin", &["user:read", "user:write", "user:delete"])]);
    let login = register_and_login(&app).await;
    let token = login["access_token"].as_str().unwrap();

    let create = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "first_name": "Bao",
                "last_name": "Tran",
                "phone": "0911111111",
                "account": { "username": "bao", "password": "secret99" }
            })
            .to_string(),
        ))
        .unwrap();
    let (status, created) = send(router(&app), create).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["gender"], "other");

    let id = created["id"].as_str().unwrap();

    let (status, detail) = send(router(&app), authed(Method::GET, &format!("/api/users/{}", id), token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["user"]["account"]["username"], "bao");

    let (status, outcome) = send(router(&app), authed(Method::DELETE, &format!("/api/users/{}", id), token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["success"], true);

    let (status, _) = send(router(&app), authed(Method::GET, &format!("/api/users/{}", id), token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();

    let request = Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap();
    let (status, body) = send(router(&app), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/auth/login"].is_object());
}
