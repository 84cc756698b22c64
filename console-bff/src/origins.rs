//! Browser origins allowed to call the console backend

use crate::config::AppConfig;
use std::str::FromStr;

/// Local development servers of the console and its sibling UIs
const LOCAL_DEV_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3010",
    "http://localhost:3020",
    "http://localhost:3030",
];

/// Shared UI development hosts
const UI_HOST: &str = "authui.broadcom.net";
const UI_PORTS: &[u16] = &[4200, 4210, 4220, 4230];

/// How an `Origin` header is compared against the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginMatching {
    /// The origin must equal one of the entries
    #[default]
    Exact,
    /// The origin may appear anywhere in the comma-joined list.
    /// Strictly more permissive than `Exact`: `http://localhost:30` passes.
    Substring,
}

impl FromStr for OriginMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "substring" => Ok(Self::Substring),
            other => Err(format!(
                "unknown origin matching '{other}', expected 'exact' or 'substring'"
            )),
        }
    }
}

/// Immutable set of allowed origins, built once at startup
#[derive(Debug, Clone)]
pub struct AllowList {
    origins: Vec<String>,
    matching: OriginMatching,
}

impl AllowList {
    pub fn new(origins: Vec<String>, matching: OriginMatching) -> Self {
        Self { origins, matching }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut origins = Vec::new();

        if let Some(origin) = &config.allowed_origin {
            origins.push(origin.clone());
        }
        origins.push(format!("https://{}", config.ssp_authority()));
        origins.extend(LOCAL_DEV_ORIGINS.iter().map(|o| o.to_string()));
        for port in UI_PORTS {
            origins.push(format!("http://{UI_HOST}:{port}"));
            origins.push(format!("https://{UI_HOST}:{port}"));
        }

        if let Some(internal) = &config.internal_service {
            origins.push(internal.origin().ascii_serialization());
        }

        if config.origin_matching == OriginMatching::Substring {
            log::warn!(
                "CORS origin matching uses legacy substring containment, \
                 partial origins will be accepted"
            );
        }

        Self::new(origins, config.origin_matching)
    }

    /// Whether a request carrying this `Origin` header may proceed.
    /// Requests without an origin are same-origin or non-browser callers.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };

        match self.matching {
            OriginMatching::Exact => self.origins.iter().any(|allowed| allowed == origin),
            OriginMatching::Substring => self.origins.join(",").contains(origin),
        }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploymentMode;

    #[test]
    fn test_development_allow_list() {
        let config = AppConfig::for_test(DeploymentMode::Development);
        let allow_list = AllowList::from_config(&config);

        assert_eq!(allow_list.origins()[0], "https://console.example.com");
        assert_eq!(allow_list.origins()[1], "https://ssp.example.com");
        assert!(allow_list.allows(Some("http://localhost:3010")));
        assert!(allow_list.allows(Some("https://authui.broadcom.net:4220")));
        assert!(allow_list.allows(Some("http://authui.broadcom.net:4200")));
        assert!(!allow_list.allows(Some("http://iam-service:8080")));
        assert_eq!(allow_list.origins().len(), 2 + 4 + 8);
    }

    #[test]
    fn test_production_includes_internal_service() {
        let config = AppConfig::for_test(DeploymentMode::Production);
        let allow_list = AllowList::from_config(&config);
        assert!(allow_list.allows(Some("http://iam-service:8080")));
    }

    #[test]
    fn test_ssp_port_is_part_of_origin() {
        let config = AppConfig {
            ssp_port: Some(8443),
            ..AppConfig::for_test(DeploymentMode::Development)
        };
        let allow_list = AllowList::from_config(&config);
        assert!(allow_list.allows(Some("https://ssp.example.com:8443")));
        assert!(!allow_list.allows(Some("https://ssp.example.com")));
    }

    #[test]
    fn test_missing_origin_is_allowed() {
        let allow_list = AllowList::new(Vec::new(), OriginMatching::Exact);
        assert!(allow_list.allows(None));
        assert!(!allow_list.allows(Some("https://evil.example.com")));
    }

    #[test]
    fn test_exact_matching_rejects_partial_origin() {
        let allow_list = AllowList::new(
            vec!["http://localhost:3000".to_string()],
            OriginMatching::Exact,
        );
        assert!(!allow_list.allows(Some("http://localhost:30")));
        assert!(!allow_list.allows(Some("http://localhost")));
    }

    #[test]
    fn test_substring_matching_accepts_partial_origin() {
        let allow_list = AllowList::new(
            vec![
                "http://localhost:3000".to_string(),
                "https://ssp.example.com".to_string(),
            ],
            OriginMatching::Substring,
        );
        assert!(allow_list.allows(Some("http://localhost:3000")));
        assert!(allow_list.allows(Some("http://localhost:30")));
        assert!(allow_list.allows(Some("3000,https://ssp")));
        assert!(!allow_list.allows(Some("https://evil.example.com")));
    }

    #[test]
    fn test_parse_origin_matching() {
        assert_eq!("exact".parse::<OriginMatching>(), Ok(OriginMatching::Exact));
        assert_eq!(
            " Substring ".parse::<OriginMatching>(),
            Ok(OriginMatching::Substring)
        );
        assert!("fuzzy".parse::<OriginMatching>().is_err());
    }
}
