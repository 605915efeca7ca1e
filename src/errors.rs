use crate::{freshness::FreshnessError, store::StoreError};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

pub const BASIC_CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Store(StoreError),
    InvalidTimestamp(FreshnessError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<FreshnessError> for ApiError {
    fn from(e: FreshnessError) -> Self {
        ApiError::InvalidTimestamp(e)
    }
}

/// Convert our custom errors to HTTP responses
///
/// Each failure only affects the request that hit it; the details go to the
/// log and the client gets a short message.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                      "error": "Unauthorized"
                    })),
                )
                    .into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_CHALLENGE),
                );
                return response;
            }
            ApiError::Store(e) => {
                error!("Document store error: {}", e);
                match e {
                    StoreError::Unavailable(_) | StoreError::Timeout(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Document store unavailable".to_string(),
                    ),
                    StoreError::NotFound(_) => {
                        (StatusCode::BAD_GATEWAY, "Document not found".to_string())
                    }
                    StoreError::Malformed(_) => {
                        (StatusCode::BAD_GATEWAY, "Malformed document".to_string())
                    }
                    StoreError::Auth(_) => (
                        StatusCode::BAD_GATEWAY,
                        "Document store rejected our credentials".to_string(),
                    ),
                }
            }
            ApiError::InvalidTimestamp(e) => {
                error!("Unusable update timestamp: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": message
            })),
        )
            .into_response()
    }
}
