use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use axum_helpers::{
    AppError, OPERATION_ID_HEADER, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use domain_operations::OperationId;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserError;
use crate::models::{CreateUser, CreateUserResponse, DeleteUserResponse, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "users";

pub const CREATED_MESSAGE: &str = "User created successfully.";
pub const DELETED_MESSAGE: &str = "User deleted successfully.";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, delete_user),
    components(
        schemas(CreateUser, UserResponse, CreateUserResponse, DeleteUserResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "User management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the users router; mount it under `/users`
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", delete(delete_user))
        .with_state(shared_service)
}

/// Attach the operation id to a response header.
fn with_operation_header(mut response: Response, operation_id: &OperationId) -> Response {
    if let Ok(value) = HeaderValue::from_str(operation_id.as_str()) {
        response.headers_mut().insert(OPERATION_ID_HEADER, value);
    }
    response
}

/// Render a failed operation, carrying its id in `details.operationId`.
fn operation_failure(err: UserError, action: &str, operation_id: &OperationId) -> Response {
    let (status, body) = err.into_app_error(action).render();
    let body = body.with_detail("operationId", operation_id.as_str());
    with_operation_header((status, Json(body)).into_response(), operation_id)
}

/// List all users, oldest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = service
        .list_users()
        .await
        .map_err(|e| e.into_app_error("listing"))?;
    Ok(Json(users))
}

/// Create a new user
///
/// The operation id comes from the `X-Operation-Id` header when present,
/// otherwise one is generated. It is echoed in the response header and body.
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateUser,
    params(
        ("x-operation-id" = Option<String>, Header, description = "Client-chosen operation id")
    ),
    responses(
        (status = 201, description = "User created successfully", body = CreateUserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> Response {
    let operation_id = OperationId::from_headers(&headers);

    match service.create_user(&operation_id, input).await {
        Ok(user) => {
            let body = CreateUserResponse {
                message: CREATED_MESSAGE.to_string(),
                operation_id: operation_id.to_string(),
                user,
            };
            with_operation_header((StatusCode::CREATED, Json(body)).into_response(), &operation_id)
        }
        Err(err) => operation_failure(err, "creating", &operation_id),
    }
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("x-operation-id" = Option<String>, Header, description = "Client-chosen operation id")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = DeleteUserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository + 'static>(
    State(service): State<Arc<UserService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> Response {
    let operation_id = OperationId::from_headers(&headers);

    match service.delete_user(&operation_id, id).await {
        Ok(()) => {
            let body = DeleteUserResponse {
                message: DELETED_MESSAGE.to_string(),
                operation_id: operation_id.to_string(),
            };
            with_operation_header((StatusCode::OK, Json(body)).into_response(), &operation_id)
        }
        Err(err) => operation_failure(err, "deleting", &operation_id),
    }
}
