use crate::{
    auth::BasicAuth,
    config::Config,
    freshness::{Clock, FreshnessPolicy},
    store::{DocumentRef, DocumentStore},
};
use std::{sync::Arc, time::Duration};

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Built once from [`Config`] at startup and cloned into every handler.
///
/// Everything in here is read-only; requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<BasicAuth>,
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
    pub target: DocumentRef,
    pub policy: FreshnessPolicy,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: Arc::new(BasicAuth::new(&config.auth_username, &config.auth_password)),
            store,
            clock,
            target: config.target.clone(),
            policy: FreshnessPolicy::default(),
            store_timeout: config.store.timeout,
        }
    }
}
