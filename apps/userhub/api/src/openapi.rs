use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Userhub API",
        version = "0.1.0",
        description = "User management with trackable create/delete operations"
    ),
    nest(
        (path = "/users", api = domain_users::ApiDoc),
        (path = "/status", api = domain_operations::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
