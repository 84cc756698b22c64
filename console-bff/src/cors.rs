use crate::errors::ApiError;
use crate::origins::AllowList;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header::ORIGIN;
use http::request::Parts;
use http::{HeaderValue, Method};
use log::warn;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Rejects requests from browser origins outside the allow-list.
///
/// Must wrap the CORS layer, otherwise preflights from unknown origins would
/// be answered before reaching this check.
pub(crate) async fn origin_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let allowed = match request.headers().get(ORIGIN) {
        None => true,
        Some(origin) => match origin.to_str() {
            Ok(origin) => state.allow_list.allows(Some(origin)),
            Err(_) => false,
        },
    };

    if !allowed {
        warn!(
            "Rejected {} {} from origin {:?}: not allowed by CORS",
            request.method(),
            request.uri().path(),
            request.headers().get(ORIGIN)
        );
        return ApiError::forbidden("Not allowed by CORS").into_response();
    }

    next.run(request).await
}

/// CORS response headers: the origin is echoed only when allow-listed and
/// every requested header is accepted.
pub(crate) fn cors_layer(allow_list: Arc<AllowList>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|origin| allow_list.allows(Some(origin)))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
