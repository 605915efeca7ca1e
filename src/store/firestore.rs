use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{DocumentRef, DocumentStore, ServiceAccount, StoreError};
use crate::config::{ConfigError, StoreBackend, StoreConfig};
use crate::models::UpdateRecord;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// The emulator grants full access to this token and ignores security rules.
const EMULATOR_TOKEN: &str = "owner";

// ============================================================================
// SERVICE ACCOUNT ASSERTION - exchanged for a short-lived access token
// ============================================================================
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

struct AssertionSigner {
    account: ServiceAccount,
    key: EncodingKey,
}

impl AssertionSigner {
    fn sign(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.account.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| StoreError::Auth(format!("Assertion signing failed: {}", e)))
    }
}

// ============================================================================
// FIRESTORE REST CLIENT
// ============================================================================
/// Reads documents through the Firestore REST API.
///
/// Every fetch exchanges a freshly signed assertion for an access token;
/// nothing is cached between requests.
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: String,
    signer: Option<AssertionSigner>,
    timeout: Duration,
}

impl FirestoreStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, ConfigError> {
        match &config.backend {
            StoreBackend::Emulator { host, project_id } => {
                Self::emulator(host, project_id, config.timeout)
            }
            StoreBackend::Firestore {
                credentials_path,
                project_id,
            } => {
                let account = ServiceAccount::from_file(credentials_path)?;
                let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes()).map_err(
                    |e| ConfigError::CredentialsKey {
                        path: credentials_path.clone(),
                        reason: e.to_string(),
                    },
                )?;
                let project_id = project_id
                    .clone()
                    .unwrap_or_else(|| account.project_id.clone());

                Ok(Self {
                    client: build_client(config.timeout)?,
                    base_url: base_url(FIRESTORE_URL)?,
                    project_id,
                    signer: Some(AssertionSigner { account, key }),
                    timeout: config.timeout,
                })
            }
        }
    }

    /// Talks plain HTTP to a local Firestore emulator at `host` (`host:port`).
    pub fn emulator(host: &str, project_id: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url(&format!("http://{}", host.trim_end_matches('/')))?,
            project_id: project_id.to_string(),
            signer: None,
            timeout,
        })
    }

    /// Document IDs may hold any character but `/`, so each one goes in as
    /// its own percent-encoded path segment.
    pub fn document_url(&self, doc: &DocumentRef) -> Url {
        let mut url = self.base_url.clone();
        // `base_url` rejected cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                &self.project_id,
                "databases",
                "(default)",
                "documents",
                &doc.collection,
                &doc.document,
            ]);
        }
        url
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let Some(signer) = &self.signer else {
            return Ok(EMULATOR_TOKEN.to_string());
        };

        let assertion = signer.sign(Utc::now())?;
        let response = self
            .client
            .post(&signer.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Token exchange rejected: {}", body);
            return Err(StoreError::Auth(format!("token endpoint returned {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("Unreadable token response: {}", e)))?;

        Ok(token.access_token)
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

fn base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::StoreUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::StoreUrl {
            url: raw.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }

    Ok(url)
}

fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn fetch(&self, doc: &DocumentRef) -> Result<UpdateRecord, StoreError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(self.document_url(doc))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StoreError::NotFound(doc.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(StoreError::Auth(format!(
                    "firestore refused access to {}",
                    doc
                )));
            }
            status if !status.is_success() => {
                return Err(StoreError::Unavailable(format!(
                    "firestore returned {}",
                    status
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        debug!(document = %doc, "Fetched document");

        decode_document(&body)
    }
}

// ============================================================================
// DOCUMENT DECODING - typed Firestore values to plain JSON
// ============================================================================

/// Turns a Firestore REST document into an [`UpdateRecord`].
pub fn decode_document(document: &Value) -> Result<UpdateRecord, StoreError> {
    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Malformed("document has no fields".into()))?;

    serde_json::from_value(plain_fields(fields))
        .map_err(|e| StoreError::Malformed(e.to_string()))
}

fn plain_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), plain_value(value)))
            .collect(),
    )
}

fn plain_value(typed: &Value) -> Value {
    let Some((kind, inner)) = typed.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        // int64 travels as a decimal string
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(Value::Null),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(plain_fields)
            .unwrap_or_else(|| Value::Object(Map::new())),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(plain_value).collect())
                .unwrap_or_default(),
        ),
        "nullValue" => Value::Null,
        _ => inner.clone(),
    }
}
