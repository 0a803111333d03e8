use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use utoipa::OpenApi;

use crate::models::{OperationStatus, StatusResponse};
use crate::store::OperationStatusStore;

pub const TAG: &str = "operations";

/// OpenAPI documentation for the operation status API
#[derive(OpenApi)]
#[openapi(
    paths(get_status),
    components(schemas(StatusResponse, OperationStatus)),
    tags(
        (name = TAG, description = "Status lookup for create/delete operations")
    )
)]
pub struct ApiDoc;

/// Create the status router; mount it under `/status`
pub fn router(store: OperationStatusStore) -> Router {
    Router::new()
        .route("/{operation_id}", get(get_status))
        .with_state(store)
}

/// Look up the status of an operation
///
/// Unknown ids are not an error: they report `"Unknown"`.
#[utoipa::path(
    get,
    path = "/{operation_id}",
    tag = TAG,
    params(
        ("operation_id" = String, Path, description = "Operation identifier")
    ),
    responses(
        (status = 200, description = "Current status", body = StatusResponse)
    )
)]
async fn get_status(
    State(store): State<OperationStatusStore>,
    Path(operation_id): Path<String>,
) -> Json<StatusResponse> {
    let status = store.get_status(&operation_id);
    Json(StatusResponse {
        operation_id,
        status,
    })
}
