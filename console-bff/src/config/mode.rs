use std::fmt;
use std::path::Path;

/// Deployment mode of the process, fixed once at startup.
///
/// Development builds still carry the frontend build-tool marker file in the
/// working directory; production images never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    /// Detect the mode from the presence of the marker file
    pub fn detect<P: AsRef<Path>>(marker: P) -> Self {
        if marker.as_ref().exists() {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}
