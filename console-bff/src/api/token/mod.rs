//! Token exchange proxy
//!
//! The console never sees the OAuth client secret. It posts either nothing
//! (client-credentials grant) or an authorization code with its PKCE verifier,
//! and this module forwards a single token request to the identity provider
//! with the server-held credentials and tenant routing headers injected.

pub mod grant;
pub mod upstream;

use crate::context::RequestContext;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use grant::{TokenGrant, TokenRequestBody};
use log::{debug, info, warn};
use upstream::UpstreamTokenRequest;

async fn token(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.config.mode.is_production() && !ctx.referrer_matches_host() {
        warn!(
            "Rejected token request for host '{}' with referrer '{}'",
            ctx.host, ctx.referrer
        );
        return ApiError::unauthorized_client().into_response();
    }

    let body = match TokenRequestBody::parse(&headers, &body) {
        Ok(body) => body,
        Err(e) => {
            warn!("{}", e);
            return ApiError::bad_request("Invalid request body").into_response();
        }
    };
    let grant = TokenGrant::from_body(body);

    let request = match UpstreamTokenRequest::build(&state.config, &ctx, &grant) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    info!(
        "Exchanging {} grant for tenant '{}' via {}",
        grant.grant_type(),
        ctx.tenant,
        request.url
    );

    match request.forward(&state.upstream_client).await {
        Ok(response) => {
            debug!("Identity provider answered with {}", response.status);
            response.into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/token", get(token).post(token))
}
