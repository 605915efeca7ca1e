use crate::{AppState, errors::ApiError};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

type Digest32 = [u8; 32];

fn digest(value: &str) -> Digest32 {
    Sha256::digest(value.as_bytes()).into()
}

/// Expected Basic credentials, kept only as SHA-256 digests.
///
/// Comparing fixed-size digests in constant time hides both the length and
/// the content of the configured values.
pub struct BasicAuth {
    username: Digest32,
    password: Digest32,
}

impl BasicAuth {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: digest(username),
            password: digest(password),
        }
    }

    /// Both comparisons always run; the result is only combined at the end.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let username_match = digest(username)[..].ct_eq(&self.username[..]);
        let password_match = digest(password)[..].ct_eq(&self.password[..]);

        (username_match & password_match).into()
    }
}

/// Extracts `(username, password)` from an `Authorization: Basic ...` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let (scheme, encoded) = auth_header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    // The password may itself contain ':'
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

pub fn validate_basic(headers: &HeaderMap, expected: &BasicAuth) -> Result<(), ApiError> {
    let authorized = basic_credentials(headers)
        .map(|(username, password)| expected.verify(&username, &password))
        .unwrap_or(false);

    if authorized {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Middleware guarding the protected routes.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    validate_basic(req.headers(), &state.auth).inspect_err(|_| {
        warn!(uri = %req.uri(), "Rejected request with missing or invalid credentials");
    })?;

    Ok(next.run(req).await)
}
