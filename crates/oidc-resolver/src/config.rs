//! Configuration for the authentication layer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the auth middleware, read from the `[auth]` table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
    /// Upper bound on one resolution, in milliseconds. Unset means unbounded.
    pub resolve_timeout_ms: Option<u64>,
    /// Realm advertised in `WWW-Authenticate` challenges.
    pub realm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    #[serde(default)]
    auth: AuthConfig,
}

impl AuthConfig {
    /// Time budget for one resolution, if configured.
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_ms.map(Duration::from_millis)
    }

    /// Parses the `[auth]` table of a TOML document. A missing table yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for a zero timeout.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let section: AuthSection = toml::from_str(document)?;
        section.auth.validate()
    }

    /// Loads the `[auth]` table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read, otherwise as
    /// [`AuthConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.resolve_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "auth.resolve_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
