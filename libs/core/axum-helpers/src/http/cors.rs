use axum::http::{HeaderName, HeaderValue, Method, header};
use core_config::cors::CorsConfig;
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Correlation header accepted on requests and exposed on responses.
pub const OPERATION_ID_HEADER: &str = "x-operation-id";

/// Builds the CORS layer from configuration.
///
/// An empty origin list yields a permissive layer (development only). Otherwise
/// only the listed origins are allowed, with the common API methods and the
/// `X-Operation-Id` header allowed and exposed.
///
/// # Errors
/// Returns `InvalidInput` if an origin is not a valid header value.
pub fn create_cors_layer(config: &CorsConfig) -> io::Result<CorsLayer> {
    if config.is_permissive() {
        warn!("CORS_ALLOWED_ORIGIN not set, allowing any origin");
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    info!(origins = ?config.allowed_origins, "CORS configured");

    let operation_id = HeaderName::from_static(OPERATION_ID_HEADER);

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, operation_id.clone()])
        .expose_headers([operation_id])
        .max_age(Duration::from_secs(3600)))
}
