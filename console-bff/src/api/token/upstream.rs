//! Token request forwarded to the identity provider

use super::grant::TokenGrant;
use crate::config::{AppConfig, DeploymentMode};
use crate::context::RequestContext;
use axum::body::Bytes;
use axum::response::{IntoResponse, Response};
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use log::error;
use reqwest::Client;
use thiserror::Error;

const TOKEN_PATH: &str = "oauth2/v1/token";
const FAILURE_BODY: &str = "An error occured";

const X_TENANT_NAME: HeaderName = HeaderName::from_static("x-tenant-name");
const X_CLIENT_TENANT_NAME: HeaderName = HeaderName::from_static("x-client-tenant-name");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_PORT: HeaderName = HeaderName::from_static("x-forwarded-port");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Errors that can occur while exchanging a token upstream
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Token request to identity provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Identity provider responded with {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("Invalid upstream header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl ProxyError {
    /// Status relayed to the console: the upstream's when it answered, 500 otherwise
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) | Self::InvalidHeader(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!("{}", self);
        (
            self.status_code(),
            [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
            FAILURE_BODY,
        )
            .into_response()
    }
}

/// Successful identity provider answer, relayed verbatim
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.body,
        )
            .into_response()
    }
}

/// A fully built upstream token request
#[derive(Debug)]
pub struct UpstreamTokenRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl UpstreamTokenRequest {
    pub fn build(
        config: &AppConfig,
        ctx: &RequestContext,
        grant: &TokenGrant,
    ) -> Result<Self, ProxyError> {
        let url = match (config.mode, &config.internal_service) {
            (DeploymentMode::Production, Some(base)) => {
                format!("{}/{TOKEN_PATH}", base.as_str().trim_end_matches('/'))
            }
            _ => format!("https://{}/{}/{TOKEN_PATH}", ctx.host, ctx.tenant),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.credentials.basic_authorization())?,
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(X_TENANT_NAME, HeaderValue::from_str(&ctx.tenant)?);
        headers.insert(X_CLIENT_TENANT_NAME, HeaderValue::from_static("system"));

        if config.mode.is_production() {
            // The internal service must see the host the browser talked to
            let host = HeaderValue::from_str(&ctx.host)?;
            headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
            headers.insert(X_FORWARDED_PORT, HeaderValue::from_static("443"));
            headers.insert(X_FORWARDED_HOST, host.clone());
            headers.insert(HOST, host);
        }

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(grant.form_fields(&config.upstream.scope))
            .finish();

        Ok(Self { url, headers, body })
    }

    /// Perform the single upstream call
    pub async fn forward(self, client: &Client) -> Result<UpstreamResponse, ProxyError> {
        let response = client
            .post(&self.url)
            .headers(self.headers)
            .body(self.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::Upstream { status, body });
        }

        let body = response.bytes().await?;
        Ok(UpstreamResponse { status, body })
    }
}
