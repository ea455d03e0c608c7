use axum::{
    body::{self, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use infrastructure::Stores;
use serde_json::{json, Value};
use shared::{PasswordHashError, PasswordHasher, TokenService};
use std::sync::Arc;
use todo_api::{app, AppState, AUTH_HEADER};
use tower::ServiceExt; // for `oneshot`

/// テスト用の高速なハッシュ実装
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain${}", plaintext.chars().rev().collect::<String>()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordHashError> {
        Ok(self.hash(plaintext)? == digest)
    }
}

fn test_app() -> Router {
    let state = AppState::new(Stores::in_memory(), TokenService::new("test-secret"))
        .with_hasher(Arc::new(PlainHasher));
    app(state)
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }

    fn token(&self) -> String {
        self.headers[AUTH_HEADER].to_str().unwrap().to_string()
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTH_HEADER, token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        bytes,
    }
}

/// 登録してトークンとユーザー ID を返す
async fn register(app: &Router, email: &str) -> (String, String) {
    let response = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({"email": email, "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let id = response.json()["_id"].as_str().unwrap().to_string();
    (response.token(), id)
}

async fn create_todo(app: &Router, token: &str, text: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/todos",
        Some(token),
        Some(json!({"text": text})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()
}

#[tokio::test]
async fn get_health_returns_ok() {
    let app = test_app();

    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn register_returns_profile_and_token_header() {
    let app = test_app();

    let response = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({"email": " A@X.com ", "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.token().is_empty());

    let json = response.json();
    assert_eq!(json["email"], "a@x.com");
    assert!(json["_id"].is_string());
    assert_eq!(json.as_object().unwrap().len(), 2, "digest must not leak: {json}");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = test_app();
    register(&app, "a@x.com").await;

    let response = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({"email": "a@x.com", "password": "another1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["errors"][0]["field"], "email");
}

#[tokio::test]
async fn register_validates_email_and_password() {
    let app = test_app();

    for (body, field) in [
        (json!({"email": "not-an-email", "password": "secret1"}), "email"),
        (json!({"email": "a@x.com", "password": "123"}), "password"),
        (json!({"email": "a@x.com"}), "password"),
    ] {
        let response = send(&app, Method::POST, "/users", None, Some(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["errors"][0]["field"], field);
    }
}

#[tokio::test]
async fn login_issues_distinct_token_and_keeps_other_sessions() {
    let app = test_app();
    let (first, _) = register(&app, "a@x.com").await;

    let response = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "a@x.com");

    let second = response.token();
    assert_ne!(first, second);

    for token in [&first, &second] {
        let me = send(&app, Method::GET, "/users/me", Some(token), None).await;
        assert_eq!(me.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn login_failure_does_not_reveal_whether_email_exists() {
    let app = test_app();
    register(&app, "a@x.com").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "a@x.com", "password": "wrong-password"})),
    )
    .await;
    let unknown_email = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "b@x.com", "password": "secret1"})),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.bytes, unknown_email.bytes);
    assert!(!wrong_password.headers.contains_key(AUTH_HEADER));
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let app = test_app();
    let (token, _) = register(&app, "a@x.com").await;
    let foreign = TokenService::new("other-secret")
        .issue(&domain::UserId::new())
        .unwrap();

    for candidate in [None, Some("garbage"), Some(foreign.as_str())] {
        let response = send(&app, Method::GET, "/users/me", candidate, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(response.bytes.is_empty());

        let response = send(&app, Method::GET, "/todos", candidate, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let me = send(&app, Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "a@x.com");
}

#[tokio::test]
async fn logout_revokes_only_the_presented_token() {
    let app = test_app();
    let (first, _) = register(&app, "a@x.com").await;
    let second = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await
    .token();

    let response = send(&app, Method::DELETE, "/users/me/token", Some(&first), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.bytes.is_empty());

    // 署名は有効でもセッションが消えていれば 401
    let revoked = send(&app, Method::GET, "/users/me", Some(&first), None).await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);

    let still_valid = send(&app, Method::GET, "/users/me", Some(&second), None).await;
    assert_eq!(still_valid.status, StatusCode::OK);
}

#[tokio::test]
async fn create_todo_returns_document() {
    let app = test_app();
    let (token, user_id) = register(&app, "a@x.com").await;

    let todo = create_todo(&app, &token, "  buy milk ").await;
    assert_eq!(todo["text"], "buy milk");
    assert_eq!(todo["completed"], false);
    assert!(todo["completedAt"].is_null());
    assert_eq!(todo["_creator"], user_id.as_str());
    assert!(todo["_id"].is_string());
}

#[tokio::test]
async fn create_todo_rejects_invalid_body() {
    let app = test_app();
    let (token, _) = register(&app, "a@x.com").await;

    for body in [json!({}), json!({"text": "   "}), json!({"text": 42})] {
        let response = send(&app, Method::POST, "/todos", Some(&token), Some(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/todos")
        .header(AUTH_HEADER, &token)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_returns_only_own_todos() {
    let app = test_app();
    let (alice, _) = register(&app, "a@x.com").await;
    let (bob, _) = register(&app, "b@x.com").await;

    create_todo(&app, &alice, "A1").await;
    create_todo(&app, &alice, "A2").await;
    create_todo(&app, &bob, "B1").await;

    let response = send(&app, Method::GET, "/todos", Some(&alice), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let texts: Vec<String> = response.json()["todos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| todo["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"A1".to_string()) && texts.contains(&"A2".to_string()));
}

#[tokio::test]
async fn other_users_todo_is_not_found() {
    let app = test_app();
    let (alice, _) = register(&app, "a@x.com").await;
    let (bob, _) = register(&app, "b@x.com").await;

    let todo = create_todo(&app, &alice, "buy milk").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let get = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert!(get.bytes.is_empty());

    let patch = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&bob),
        Some(json!({"text": "hacked", "completed": true})),
    )
    .await;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);

    let delete = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    // 所有者からは変更されずに見える
    let own = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json()["todo"], todo);
}

#[tokio::test]
async fn malformed_id_is_not_found() {
    let app = test_app();
    let (token, _) = register(&app, "a@x.com").await;

    for method in [Method::GET, Method::DELETE] {
        let response = send(&app, method, "/todos/123abc", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.bytes.is_empty());
    }

    let response = send(
        &app,
        Method::PATCH,
        "/todos/123abc",
        Some(&token),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_sets_and_clears_completed_at() {
    let app = test_app();
    let (token, _) = register(&app, "a@x.com").await;
    let todo = create_todo(&app, &token, "task").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let done = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"completed": true, "text": "done task"})),
    )
    .await;
    assert_eq!(done.status, StatusCode::OK);
    let json = done.json();
    assert_eq!(json["todo"]["completed"], true);
    assert!(json["todo"]["completedAt"].is_number());
    assert_eq!(json["todo"]["text"], "done task");

    let reopened = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"completed": false})),
    )
    .await;
    let json = reopened.json();
    assert_eq!(json["todo"]["completed"], false);
    assert!(json["todo"]["completedAt"].is_null());
    assert_eq!(json["todo"]["text"], "done task");

    // 真偽値以外は未完了扱い
    let stringly = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"completed": "true"})),
    )
    .await;
    assert_eq!(stringly.json()["todo"]["completed"], false);
}

#[tokio::test]
async fn patch_ignores_fields_outside_allow_list() {
    let app = test_app();
    let (token, user_id) = register(&app, "a@x.com").await;
    let todo = create_todo(&app, &token, "task").await;
    let id = todo["_id"].as_str().unwrap();

    let response = send(
        &app,
        Method::PATCH,
        &format!("/todos/{id}"),
        Some(&token),
        Some(json!({
            "_creator": domain::UserId::new().to_string(),
            "_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "completedAt": 1,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["todo"]["_id"], id);
    assert_eq!(json["todo"]["_creator"], user_id.as_str());
    assert!(json["todo"]["completedAt"].is_null());
}

#[tokio::test]
async fn delete_returns_removed_todo() {
    let app = test_app();
    let (token, _) = register(&app, "a@x.com").await;
    let todo = create_todo(&app, &token, "task").await;
    let uri = format!("/todos/{}", todo["_id"].as_str().unwrap());

    let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["todo"], todo);

    let again = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_and_login_with_argon2() {
    let app = app(AppState::new(
        Stores::in_memory(),
        TokenService::new("test-secret"),
    ));
    register(&app, "a@x.com").await;

    let response = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
}
