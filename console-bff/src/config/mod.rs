use crate::origins::OriginMatching;
use confique::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod credentials;
pub mod mode;

pub use credentials::ClientCredentials;
pub use mode::DeploymentMode;

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] confique::Error),
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("Failed to load client credentials from {}: {reason}", .path.display())]
    CredentialsFile { path: PathBuf, reason: String },
}

/// Raw settings as read from the environment
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// Internal identity service base URL, used as the upstream in production
    #[config(env = "AZ_SVC")]
    pub az_svc: Option<String>,

    /// Public identity provider host
    #[config(env = "SSP_HOST")]
    pub ssp_host: Option<String>,

    /// Public identity provider port (optional)
    #[config(env = "SSP_PORT")]
    pub ssp_port: Option<String>,

    /// OAuth client identifier
    #[config(env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[config(env = "CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Mounted JSON secret with `client_id`/`client_secret`, read in production
    /// when the credentials are not in the environment
    #[config(
        env = "CLIENT_CREDENTIALS_FILE",
        default = "/etc/adminconsole/client.json"
    )]
    pub client_credentials_file: String,

    /// Extra browser origin allowed by CORS
    #[config(env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Serve over HTTPS (default: false)
    #[config(env = "SERVE_HTTPS", default = false)]
    pub serve_https: bool,

    /// Listen port (default: 443 with HTTPS, 3010 otherwise)
    #[config(env = "PORT")]
    pub port: Option<String>,

    /// Listen hostname (default: localhost)
    #[config(env = "HOSTNAME", default = "localhost")]
    pub hostname: String,

    /// PEM certificate used when serving HTTPS
    #[config(env = "TLS_CERT_PATH", default = "./server/certs/cert.pem")]
    pub tls_cert_path: String,

    /// PEM private key used when serving HTTPS
    #[config(env = "TLS_KEY_PATH", default = "./server/certs/key.pem")]
    pub tls_key_path: String,

    /// Directory holding the built console
    #[config(env = "STATIC_DIR", default = "./server/adminconsole")]
    pub static_dir: String,

    /// Marker file whose presence selects development mode
    #[config(env = "DEV_MARKER_FILE", default = "angular.json")]
    pub dev_marker: String,

    /// CORS origin matching: "exact" or the legacy "substring"
    #[config(env = "ORIGIN_MATCHING", default = "exact")]
    pub origin_matching: String,

    /// Upstream token request timeout in seconds (default: 30)
    #[config(env = "UPSTREAM_TIMEOUT", default = 30)]
    pub upstream_timeout: u64,

    /// Verify the identity provider's TLS certificate (default: true)
    #[config(env = "UPSTREAM_TLS_VERIFY", default = true)]
    pub upstream_tls_verify: bool,

    /// Scope requested with the client-credentials grant
    #[config(env = "TOKEN_SCOPE", default = "urn:iam:myscopes")]
    pub token_scope: String,
}

impl Settings {
    /// Read the settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Settings::builder().env().load()?)
    }
}

/// Certificate and key used to serve HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TlsFiles {
    /// Files that do not exist on disk
    pub fn missing(&self) -> Vec<&Path> {
        [self.cert_path.as_path(), self.key_path.as_path()]
            .into_iter()
            .filter(|path| !path.exists())
            .collect()
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub hostname: String,
    pub port: u16,
    /// Present when serving HTTPS
    pub tls: Option<TlsFiles>,
}

/// Upstream identity provider client configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout: Duration,
    pub tls_verify: bool,
    pub scope: String,
}

/// Validated, immutable configuration shared by every request
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: DeploymentMode,
    pub ssp_host: String,
    pub ssp_port: Option<u16>,
    /// Internal identity service, only set in production
    pub internal_service: Option<Url>,
    pub credentials: ClientCredentials,
    pub allowed_origin: Option<String>,
    pub origin_matching: OriginMatching,
    pub upstream: UpstreamConfig,
    pub listen: ListenConfig,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Validate the settings for the given mode.
    ///
    /// Every missing variable is reported at once so that operators can fix
    /// the environment in a single pass.
    pub fn resolve(settings: Settings, mode: DeploymentMode) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        let ssp_host = non_empty(settings.ssp_host);
        if ssp_host.is_none() {
            missing.push("SSP_HOST");
        }

        let az_svc = non_empty(settings.az_svc);
        if mode.is_production() && az_svc.is_none() {
            missing.push("AZ_SVC");
        }

        let client_id = non_empty(settings.client_id);
        let client_secret = non_empty(settings.client_secret);
        if mode.is_development() {
            if client_id.is_none() {
                missing.push("CLIENT_ID");
            }
            if client_secret.is_none() {
                missing.push("CLIENT_SECRET");
            }
        }

        let (Some(ssp_host), true) = (ssp_host, missing.is_empty()) else {
            return Err(ConfigError::MissingVariables(missing));
        };

        let credentials = match (client_id, client_secret) {
            (Some(id), Some(secret)) => ClientCredentials::new(id, secret),
            _ => ClientCredentials::from_file(&settings.client_credentials_file)?,
        };

        let internal_service = match (mode, az_svc) {
            (DeploymentMode::Production, Some(raw)) => Some(parse_internal_service(&raw)?),
            _ => None,
        };

        let origin_matching = settings
            .origin_matching
            .parse::<OriginMatching>()
            .map_err(|reason| ConfigError::Invalid {
                name: "ORIGIN_MATCHING",
                reason,
            })?;

        let ssp_port = parse_port("SSP_PORT", settings.ssp_port)?;
        let port = parse_port("PORT", settings.port)?
            .unwrap_or(if settings.serve_https { 443 } else { 3010 });
        let tls = settings.serve_https.then(|| TlsFiles {
            cert_path: PathBuf::from(settings.tls_cert_path.trim()),
            key_path: PathBuf::from(settings.tls_key_path.trim()),
        });

        Ok(Self {
            mode,
            ssp_host,
            ssp_port,
            internal_service,
            credentials,
            allowed_origin: non_empty(settings.allowed_origin),
            origin_matching,
            upstream: UpstreamConfig {
                timeout: Duration::from_secs(settings.upstream_timeout),
                tls_verify: settings.upstream_tls_verify,
                scope: settings.token_scope.trim().to_string(),
            },
            listen: ListenConfig {
                hostname: settings.hostname.trim().to_string(),
                port,
                tls,
            },
            static_dir: PathBuf::from(settings.static_dir.trim()),
        })
    }

    /// `host[:port]` of the public identity provider
    pub fn ssp_authority(&self) -> String {
        match self.ssp_port {
            Some(port) => format!("{}:{}", self.ssp_host, port),
            None => self.ssp_host.clone(),
        }
    }

    #[cfg(test)]
    pub fn for_test(mode: DeploymentMode) -> Self {
        Self {
            mode,
            ssp_host: "ssp.example.com".to_string(),
            ssp_port: None,
            internal_service: mode
                .is_production()
                .then(|| Url::parse("http://iam-service:8080").unwrap()),
            credentials: ClientCredentials::new("test-client", "test-secret"),
            allowed_origin: Some("https://console.example.com".to_string()),
            origin_matching: OriginMatching::Exact,
            upstream: UpstreamConfig {
                timeout: Duration::from_secs(5),
                tls_verify: true,
                scope: "urn:iam:myscopes".to_string(),
            },
            listen: ListenConfig {
                hostname: "localhost".to_string(),
                port: 0,
                tls: None,
            },
            static_dir: PathBuf::from("./server/adminconsole"),
        }
    }

    #[cfg(test)]
    pub fn for_test_with_mock(upstream_mock: &wiremock::MockServer) -> Self {
        Self {
            internal_service: Some(Url::parse(&upstream_mock.uri()).unwrap()),
            ..Self::for_test(DeploymentMode::Production)
        }
    }
}

#[cfg(test)]
impl Settings {
    /// Settings with every optional variable unset
    pub fn for_test() -> Self {
        Self {
            az_svc: None,
            ssp_host: None,
            ssp_port: None,
            client_id: None,
            client_secret: None,
            client_credentials_file: "/nonexistent/client.json".to_string(),
            allowed_origin: None,
            serve_https: false,
            port: None,
            hostname: "localhost".to_string(),
            tls_cert_path: "./server/certs/cert.pem".to_string(),
            tls_key_path: "./server/certs/key.pem".to_string(),
            static_dir: "./server/adminconsole".to_string(),
            dev_marker: "angular.json".to_string(),
            origin_matching: "exact".to_string(),
            upstream_timeout: 30,
            upstream_tls_verify: true,
            token_scope: "urn:iam:myscopes".to_string(),
        }
    }
}

/// Trim a value and treat blank strings as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_port(name: &'static str, value: Option<String>) -> Result<Option<u16>, ConfigError> {
    non_empty(value)
        .map(|raw| {
            raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// `AZ_SVC` may be given as a bare `host[:port]`
fn parse_internal_service(raw: &str) -> Result<Url, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&candidate).map_err(|e| ConfigError::Invalid {
        name: "AZ_SVC",
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            name: "AZ_SVC",
            reason: "URL has no host".to_string(),
        });
    }
    Ok(url)
}
