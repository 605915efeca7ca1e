use crate::models::UpdateRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod credentials;
mod firestore;

pub use credentials::ServiceAccount;
pub use firestore::{FirestoreStore, decode_document};

/// Where the feed's bookkeeping document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: String,
    pub document: String,
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.document)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("document {0} not found")]
    NotFound(String),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("document store authentication failed: {0}")]
    Auth(String),
}

/// Read access to the document holding the feed's last update.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches the latest stored fields of `doc`.
    async fn fetch(&self, doc: &DocumentRef) -> Result<UpdateRecord, StoreError>;
}
