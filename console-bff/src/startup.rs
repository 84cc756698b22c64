//! Startup checks run before any listener is bound

use crate::config::{AppConfig, ConfigError, DeploymentMode, Settings};
use crate::state::AppState;
use log::info;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("TLS files do not exist: {}", display_paths(.0))]
    MissingTlsFiles(Vec<PathBuf>),
    #[error("Failed to create identity provider client: {0}")]
    Client(#[from] reqwest::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Detect the deployment mode, validate the configuration and build the
/// application state. Any error here must stop the process.
pub fn prepare(settings: Settings) -> Result<AppState, StartupError> {
    // The mode is decided once and never re-evaluated
    let mode = DeploymentMode::detect(settings.dev_marker.trim());
    info!("Running in {} mode", mode);

    let config = AppConfig::resolve(settings, mode)?;

    if let Some(tls) = &config.listen.tls {
        let missing = tls.missing();
        if !missing.is_empty() {
            return Err(StartupError::MissingTlsFiles(
                missing.into_iter().map(PathBuf::from).collect(),
            ));
        }
    }

    Ok(AppState::new(config)?)
}
