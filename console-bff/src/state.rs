use crate::config::{AppConfig, UpstreamConfig};
use crate::origins::AllowList;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub allow_list: Arc<AllowList>,
    pub upstream_client: Arc<Client>,
}

impl AppState {
    fn create_upstream_client(config: &UpstreamConfig) -> Result<Client, reqwest::Error> {
        if !config.tls_verify {
            log::warn!(
                "TLS certificate verification towards the identity provider is DISABLED \
                 (UPSTREAM_TLS_VERIFY=false)"
            );
        }

        // One client for all token exchanges, each request makes exactly one call
        Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .danger_accept_invalid_certs(!config.tls_verify)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
    }

    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let upstream_client = Self::create_upstream_client(&config.upstream)?;
        let allow_list = AllowList::from_config(&config);
        log::debug!("CORS allow-list: {}", allow_list.origins().join(", "));
        Ok(Self {
            config: Arc::new(config),
            allow_list: Arc::new(allow_list),
            upstream_client: Arc::new(upstream_client),
        })
    }

    #[cfg(test)]
    pub fn for_testing(config: &AppConfig) -> Self {
        Self::new(config.clone()).expect("Failed to create test state")
    }
}
