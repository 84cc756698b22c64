pub(crate) mod assets;
pub(crate) mod discovery;
pub(crate) mod health;
pub(crate) mod token;

use crate::state::AppState;
use axum::Router;

/// Path the console is served under
pub const BASE_PATH: &str = "/adminconsole";
/// Versioned alias routed by the ingress in front of the identity provider
pub const VERSIONED_BASE_PATH: &str = "/default/ui/v1/adminconsole";

/// Combines all console routes and mounts them under both base paths
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest(BASE_PATH, console_routes(state))
        .nest(VERSIONED_BASE_PATH, console_routes(state))
}

fn console_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(discovery::router())
        .merge(token::router())
        // Anything else is part of the single-page app
        .fallback_service(assets::service(&state.config.static_dir))
}
