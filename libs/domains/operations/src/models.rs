use axum::http::HeaderMap;
use axum_helpers::OPERATION_ID_HEADER;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle states written to the status store.
///
/// The store itself is string-valued; these are the states this service writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
pub enum OperationStatus {
    /// Never recorded, or already removed
    Unknown,
    /// Accepted, work dispatched
    Pending,
    /// A transient failure occurred, waiting out the backoff
    Retrying,
    Completed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Opaque key correlating a request with its status entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Longest caller-supplied id that is accepted as-is.
    pub const MAX_LEN: usize = 128;

    /// Generate a fresh, time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Accept a caller-supplied id if it is non-blank and at most [`Self::MAX_LEN`] bytes.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > Self::MAX_LEN {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Id from the `X-Operation-Id` request header, or a generated one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(OPERATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Body of `GET /status/{operationId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub operation_id: String,
    #[schema(example = "Completed")]
    pub status: String,
}
