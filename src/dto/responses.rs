use serde::{Deserialize, Serialize};

/// Body of `POST /check`, identical for fresh (200) and stale (500) feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessReport {
    #[serde(rename = "lastupdate")]
    pub last_update: String,
    #[serde(rename = "nextupdate")]
    pub next_update: String,
    pub now: String,
}
