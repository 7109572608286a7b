//! JWT validation settings, read from the `[jwt]` table.

use std::path::Path;
use std::time::Duration;

use oidc_resolver::ConfigError;
use serde::{Deserialize, Serialize};

/// Default TTL for cached JWKS keys (1 hour).
pub const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;

/// Default clock skew tolerated on `exp`/`nbf`.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// How access tokens are verified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// JWKS endpoint of the identity provider.
    pub jwks_url: String,
    /// Expected `aud`. Unset disables the audience check.
    pub audience: Option<String>,
    /// Accepted `iss` values. Empty disables the issuer check.
    pub issuers: Vec<String>,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// How long fetched keys stay fresh.
    pub jwks_cache_ttl_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            jwks_url: String::new(),
            audience: None,
            issuers: Vec::new(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
            jwks_cache_ttl_secs: DEFAULT_JWKS_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwtSection {
    jwt: JwtConfig,
}

#[derive(Debug, Default, Deserialize)]
struct OptionalJwtSection {
    #[serde(default)]
    jwt: JwtConfig,
}

impl JwtConfig {
    /// Config for a JWKS endpoint with every other setting defaulted.
    pub fn for_jwks_url(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            ..Self::default()
        }
    }

    /// Key cache TTL.
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    /// Parses the `[jwt]` table of a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the table is missing or malformed and
    /// [`ConfigError::Invalid`] if `jwks_url` is empty or the cache TTL is zero.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let section: JwtSection = toml::from_str(document)?;
        section.jwt.validate()
    }

    /// Loads the `[jwt]` table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read, otherwise as
    /// [`JwtConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    /// Parses the `[jwt]` table for validation against locally supplied keys.
    ///
    /// `jwks_url` is not required and a missing table yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] if the cache TTL is zero.
    pub fn from_toml_str_for_static_keys(document: &str) -> Result<Self, ConfigError> {
        let section: OptionalJwtSection = toml::from_str(document)?;
        section.jwt.validate_claim_checks()
    }

    /// Loads the `[jwt]` table from a TOML file for static-key validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read, otherwise as
    /// [`JwtConfig::from_toml_str_for_static_keys`].
    pub fn load_for_static_keys(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str_for_static_keys(&document)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.jwks_url.trim().is_empty() {
            return Err(ConfigError::Invalid("jwt.jwks_url is required".to_string()));
        }
        self.validate_claim_checks()
    }

    fn validate_claim_checks(self) -> Result<Self, ConfigError> {
        if self.jwks_cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "jwt.jwks_cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
