//! Handler tests for the users API, wired the same way as the binary

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use database::common::RetryConfig;
use domain_operations::OperationStatusStore;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn app() -> Router {
    let operations = OperationStatusStore::new();
    let service =
        UserService::new(InMemoryUserRepository::new()).with_operations(operations.clone());

    Router::new()
        .nest("/users", handlers::router(service))
        .nest("/status", domain_operations::handlers::router(operations))
}

fn create_request(body: Value) -> Request<Body> {
    Request::post("/users")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn ada() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "password": "secret"
    })
}

#[tokio::test]
async fn test_create_user_returns_201_with_operation_id() {
    let response = app().oneshot(create_request(ada())).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let header = response
        .headers()
        .get("x-operation-id")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap();

    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User created successfully.");
    assert_eq!(body["operationId"], header.as_str());
    assert_eq!(body["user"]["firstName"], "Ada");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_client_operation_id_is_echoed_and_tracked() {
    let app = app();

    let mut request = create_request(ada());
    request
        .headers_mut()
        .insert("x-operation-id", "signup-42".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-operation-id"], "signup-42");

    let response = app
        .oneshot(Request::get("/status/signup-42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = json_body(response.into_body()).await;
    assert_eq!(body["operationId"], "signup-42");
    assert_eq!(body["status"], "Completed");
}

#[tokio::test]
async fn test_duplicate_email_returns_409() {
    let app = app();
    app.clone().oneshot(create_request(ada())).await.unwrap();

    let mut duplicate = ada();
    duplicate["email"] = json!("ADA@example.com");
    let mut request = create_request(duplicate);
    request
        .headers_mut()
        .insert("x-operation-id", "dup-1".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Email must be unique!");
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(body["details"]["operationId"], "dup-1");

    let status = app
        .oneshot(Request::get("/status/dup-1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(status.into_body()).await["status"], "Failed");
}

#[tokio::test]
async fn test_invalid_payload_returns_400() {
    let response = app()
        .oneshot(create_request(json!({
            "firstName": "A",
            "lastName": "Lovelace",
            "email": "not-an-email",
            "password": "123"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"].get("first_name").is_some());
    assert!(body["details"].get("email").is_some());
    assert!(body["details"].get("password").is_some());
}

#[tokio::test]
async fn test_delete_user_returns_200() {
    let app = app();
    let created = app.clone().oneshot(create_request(ada())).await.unwrap();
    let id = json_body(created.into_body()).await["user"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/users/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-operation-id"));
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User deleted successfully.");

    let list = app
        .oneshot(Request::get("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(list.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_delete_unknown_user_returns_404() {
    let response = app()
        .oneshot(
            Request::delete(format!("/users/{}", Uuid::now_v7()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "User not found!");
    assert!(body["details"]["operationId"].is_string());
}

#[tokio::test]
async fn test_delete_with_malformed_id_returns_400() {
    let response = app()
        .oneshot(Request::delete("/users/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_UUID");
}

#[tokio::test]
async fn test_list_users_in_creation_order() {
    let app = app();
    for (first, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
        let mut body = ada();
        body["firstName"] = json!(first);
        body["email"] = json!(email);
        let response = app.clone().oneshot(create_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(Request::get("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["firstName"], "Ada");
    assert_eq!(users[1]["firstName"], "Grace");
    assert!(users[0].get("lastName").is_some());
    assert!(users[0].get("password").is_none());
}

/// Store whose every call fails as if the database were down.
struct UnavailableRepository;

#[async_trait]
impl UserRepository for UnavailableRepository {
    async fn find_by_email(&self, _email: &str) -> UserResult<Option<User>> {
        Err(UserError::DataAccess("connection refused".into()))
    }

    async fn find_by_id(&self, _id: Uuid) -> UserResult<Option<User>> {
        Err(UserError::DataAccess("connection refused".into()))
    }

    async fn insert(&self, _user: User) -> UserResult<User> {
        Err(UserError::DataAccess("connection refused".into()))
    }

    async fn delete(&self, _id: Uuid) -> UserResult<bool> {
        Err(UserError::DataAccess("connection refused".into()))
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        Err(UserError::DataAccess("connection refused".into()))
    }
}

#[tokio::test]
async fn test_list_users_failure_names_the_action() {
    let service = UserService::new(UnavailableRepository)
        .with_retry(RetryConfig::new().with_max_attempts(1));
    let app = Router::new().nest("/users", handlers::router(service));

    let response = app
        .oneshot(Request::get("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Error listing user: data store unavailable");
}
