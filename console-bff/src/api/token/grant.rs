//! OAuth2 grant selection from the console's token request body

use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid request body: {0}")]
pub struct BodyError(#[from] serde_json::Error);

/// Fields the console may send to the token endpoint
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TokenRequestBody {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
}

impl TokenRequestBody {
    /// Parse the body according to its content type.
    /// Bodies that are neither JSON nor form-encoded carry no grant fields.
    pub fn parse(headers: &HeaderMap, body: &[u8]) -> Result<Self, BodyError> {
        if body.is_empty() {
            return Ok(Self::default());
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") || content_type.contains("+json") {
            Ok(serde_json::from_slice(body)?)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            Ok(Self::from_form(body))
        } else {
            Ok(Self::default())
        }
    }

    fn from_form(body: &[u8]) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "type" => parsed.kind = Some(value.into_owned()),
                "code" => parsed.code = Some(value.into_owned()),
                "code_verifier" => parsed.code_verifier = Some(value.into_owned()),
                _ => {}
            }
        }
        parsed
    }
}

/// The OAuth2 grant forwarded to the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    ClientCredentials,
    AuthorizationCode {
        code: String,
        code_verifier: Option<String>,
    },
}

impl TokenGrant {
    pub fn from_body(body: TokenRequestBody) -> Self {
        match (body.kind.as_deref(), body.code) {
            (Some("code"), Some(code)) if !code.is_empty() => Self::AuthorizationCode {
                code,
                code_verifier: body.code_verifier,
            },
            _ => Self::ClientCredentials,
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::AuthorizationCode { .. } => "authorization_code",
        }
    }

    /// Form fields of the upstream token request, in wire order
    pub fn form_fields(&self, scope: &str) -> Vec<(&'static str, String)> {
        let mut fields = vec![("grant_type", self.grant_type().to_string())];
        match self {
            Self::ClientCredentials => fields.push(("scope", scope.to_string())),
            Self::AuthorizationCode {
                code,
                code_verifier,
            } => {
                fields.push(("code", code.clone()));
                if let Some(verifier) = code_verifier {
                    fields.push(("code_verifier", verifier.clone()));
                }
            }
        }
        fields
    }
}
