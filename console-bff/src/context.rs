//! Per-request host, tenant and referrer resolution

use crate::config::{AppConfig, DeploymentMode};
use crate::state::AppState;
use axum::extract::FromRequestParts;
use http::header::{HOST, REFERER};
use http::request::Parts;
use http::{HeaderMap, Uri};
use std::convert::Infallible;

/// Identity host override, honoured in development only
pub const SSP_HOST_HEADER: &str = "x-ssp-host";
/// Tenant the console is operating on
pub const TENANT_HEADER: &str = "x-tenant-name";
pub const DEFAULT_TENANT: &str = "default";

/// Host, tenant and referrer of the request being handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub host: String,
    pub tenant: String,
    pub referrer: String,
}

impl RequestContext {
    /// In production the public host is the `Host` header, or the URI
    /// authority for HTTP/2 requests that carry `:authority` instead.
    pub fn resolve(headers: &HeaderMap, uri: &Uri, config: &AppConfig) -> Self {
        let host = match config.mode {
            DeploymentMode::Development => header_value(headers, SSP_HOST_HEADER),
            DeploymentMode::Production => {
                header_value(headers, HOST.as_str()).or_else(|| uri_authority(uri))
            }
        }
        .unwrap_or_else(|| config.ssp_authority());

        let tenant =
            header_value(headers, TENANT_HEADER).unwrap_or_else(|| DEFAULT_TENANT.to_string());
        let referrer = header_value(headers, REFERER.as_str()).unwrap_or_default();

        Self {
            host,
            tenant,
            referrer,
        }
    }

    /// `https://{host}/{tenant}/`
    pub fn api_url(&self) -> String {
        format!("https://{}/{}/", self.host, self.tenant)
    }

    /// Token requests must come from a page served by the identity host
    pub fn referrer_matches_host(&self) -> bool {
        self.referrer.starts_with(&format!("https://{}", self.host))
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(&parts.headers, &parts.uri, &state.config))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn uri_authority(uri: &Uri) -> Option<String> {
    uri.authority()
        .map(|authority| authority.as_str().trim())
        .filter(|authority| !authority.is_empty())
        .map(str::to_string)
}
