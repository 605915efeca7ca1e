use serde::{Deserialize, Serialize};

/// The feed's bookkeeping document as stored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// `DD/MM HH:MM`, no year.
    #[serde(rename = "Atualizado")]
    pub updated_at: String,
    #[serde(rename = "Rede", default)]
    pub network: Option<String>,
}
