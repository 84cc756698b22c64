use crate::context::RequestContext;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

const AUTHORIZE_SCOPE: &str = "openid%20urn:iam:myscopes%20profile";

/// Endpoints the console needs to start an OAuth flow
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    pub api_url: String,
    pub authorize_url: String,
}

impl DiscoveryDocument {
    pub fn new(ctx: &RequestContext, client_id: &str) -> Self {
        let api_url = ctx.api_url();
        let authorize_url = format!(
            "{api_url}oauth2/v1/authorize?scope={AUTHORIZE_SCOPE}&client_id={client_id}\
             &response_type=code&X-CLIENT-TENANT-NAME=system"
        );
        Self {
            api_url,
            authorize_url,
        }
    }
}

async fn urls(State(state): State<AppState>, ctx: RequestContext) -> Json<DiscoveryDocument> {
    Json(DiscoveryDocument::new(
        &ctx,
        &state.config.credentials.client_id,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/urls", get(urls))
}
