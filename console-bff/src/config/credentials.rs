//! OAuth client credentials held by the server on behalf of the console

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Client credentials injected into every upstream token request
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new<S: Into<String>>(client_id: S, client_secret: S) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Load credentials from a mounted JSON secret
    /// (`{"client_id": "...", "client_secret": "..."}`)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let invalid = |reason: String| ConfigError::CredentialsFile {
            path: path.to_path_buf(),
            reason,
        };

        let contents = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let raw: ClientCredentials =
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

        let client_id = raw.client_id.trim();
        let client_secret = raw.client_secret.trim();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(invalid(
                "client_id and client_secret must not be empty".to_string(),
            ));
        }

        log::info!("Loaded client credentials from {}", path.display());
        Ok(Self::new(client_id, client_secret))
    }

    /// Value of the `Authorization` header for HTTP Basic authentication
    pub fn basic_authorization(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
