mod api;
mod config;
mod context;
mod cors;
mod errors;
mod origins;
mod server;
mod startup;
mod state;
#[cfg(test)]
mod test_utils;

use crate::config::{ConfigError, Settings};
use crate::startup::StartupError;
use crate::state::AppState;
use axum::{middleware, Router};
use log::{error, info};
use tower_http::catch_panic::CatchPanicLayer;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let state = match startup::prepare(settings) {
        Ok(state) => state,
        Err(StartupError::Config(ConfigError::MissingVariables(missing))) => {
            for name in missing {
                error!("Missing environment variable {}", name);
            }
            error!("Please refer to the README for the required environment variables");
            std::process::exit(1);
        }
        Err(StartupError::MissingTlsFiles(paths)) => {
            for path in paths {
                error!("TLS file \"{}\" does not exist", path.display());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let listen = state.config.listen.clone();
    let app = create_app(state).await;

    // Start the server and wait for it to finish
    if let Err(e) = server::serve(app, &listen).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Create a new application instance with a given state
pub async fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(api::router(&state))
        .layer(cors::cors_layer(state.allow_list.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors::origin_guard,
        ))
        .layer(CatchPanicLayer::custom(errors::panic_response))
        .with_state(state)
}
