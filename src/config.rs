use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::store::DocumentRef;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
const DEFAULT_EMULATOR_PROJECT: &str = "demo-project";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be provided")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read credentials file {path:?}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid credentials file {path:?}: {source}")]
    CredentialsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid private key in {path:?}: {reason}")]
    CredentialsKey { path: PathBuf, reason: String },
    #[error("invalid document store URL {url:?}: {reason}")]
    StoreUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How the document store is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Firestore {
        credentials_path: PathBuf,
        /// Overrides the project named in the credentials file.
        project_id: Option<String>,
    },
    Emulator {
        host: String,
        project_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub timeout: Duration,
}

/// Everything the service needs, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub auth_username: String,
    pub auth_password: String,
    pub host: String,
    pub port: u16,
    pub target: DocumentRef,
    pub store: StoreConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("target", &self.target)
            .field("store", &self.store)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let auth_username = required("AUTH_USERNAME")?;
        let auth_password = required("AUTH_PASSWORD")?;

        let port = match optional("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match optional("STORE_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "STORE_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        let project_id = optional("FIRESTORE_PROJECT_ID");
        let backend = match optional("FIRESTORE_EMULATOR_HOST") {
            Some(host) => StoreBackend::Emulator {
                host,
                project_id: project_id.unwrap_or_else(|| DEFAULT_EMULATOR_PROJECT.to_string()),
            },
            None => StoreBackend::Firestore {
                credentials_path: optional("GOOGLE_APPLICATION_CREDENTIALS")
                    .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string())
                    .into(),
                project_id,
            },
        };

        Ok(Self {
            auth_username,
            auth_password,
            host: optional("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            target: DocumentRef {
                collection: required("COLLECTION")?,
                document: required("DOC")?,
            },
            store: StoreConfig {
                backend,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
