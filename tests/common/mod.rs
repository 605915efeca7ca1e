//! Shared setup for router tests: an in-memory document store, a pinned
//! clock and request helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeZone, Utc};
use feed_check::{
    AppState, app,
    config::Config,
    freshness::{Clock, TIMEZONE},
    models::UpdateRecord,
    store::{DocumentRef, DocumentStore, StoreError},
};
use serde_json::Value;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tower::ServiceExt;

pub const USERNAME: &str = "monitor";
pub const PASSWORD: &str = "s3cret";

/// What the fake store answers with.
pub enum Stub {
    Record(&'static str),
    NotFound,
    Unavailable,
    Malformed,
    Hang,
}

pub struct StubStore {
    stub: Stub,
    calls: AtomicUsize,
}

impl StubStore {
    pub fn new(stub: Stub) -> Arc<Self> {
        Arc::new(Self {
            stub,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for StubStore {
    async fn fetch(&self, doc: &DocumentRef) -> Result<UpdateRecord, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(doc.collection, "feeds");
        assert_eq!(doc.document, "status");

        match self.stub {
            Stub::Record(updated_at) => Ok(UpdateRecord {
                updated_at: updated_at.to_string(),
                network: Some("norte".to_string()),
            }),
            Stub::NotFound => Err(StoreError::NotFound(doc.to_string())),
            Stub::Unavailable => Err(StoreError::Unavailable("connection refused".into())),
            Stub::Malformed => Err(StoreError::Malformed("document has no fields".into())),
            Stub::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(StoreError::Unavailable("never reached".into()))
            }
        }
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|name| {
        let value = match name {
            "AUTH_USERNAME" => USERNAME,
            "AUTH_PASSWORD" => PASSWORD,
            "COLLECTION" => "feeds",
            "DOC" => "status",
            "FIRESTORE_EMULATOR_HOST" => "localhost:8081",
            "STORE_TIMEOUT_SECS" => "2",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// A Sao Paulo wall-clock time in 2026.
pub fn local_time(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    TIMEZONE
        .with_ymd_and_hms(2026, month, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn router(store: Arc<StubStore>, now: DateTime<Utc>) -> Router {
    let state = AppState::new(&test_config(), store, Arc::new(FixedClock(now)));
    app(state)
}

pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Sends `POST /check` with an optional raw `Authorization` header.
pub async fn post_check(
    router: &Router,
    authorization: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(Method::POST).uri("/check");
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }

    send(router, request.body(Body::empty()).unwrap()).await
}

pub async fn get_request(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, body)
}
