//! JWT access token validation for oidc-resolver.
//!
//! Implements [`oidc_resolver::TokenValidator`] for providers issuing signed JWTs:
//! - RS256 signature verification against the provider's JWKS
//! - Expiry, audience and issuer checks
//! - JWKS key caching with TTL-based refresh
//! - Payload decoding into [`Claims`]

mod config;

pub use config::{DEFAULT_JWKS_CACHE_TTL_SECS, DEFAULT_LEEWAY_SECS, JwtConfig};

use std::sync::RwLock;
use std::time::Instant;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use oidc_resolver::{AuthError, Claims, TokenValidator};

/// A single RSA JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID, matched against the JWT header's `kid`.
    pub kid: String,
    /// RSA modulus (base64url-encoded).
    pub n: String,
    /// RSA exponent (base64url-encoded).
    pub e: String,
}

/// A JWKS document. Keys that are not RSA keys with a `kid` are skipped.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<serde_json::Value>,
}

impl JwksResponse {
    fn into_rsa_keys(self) -> Vec<Jwk> {
        self.keys
            .into_iter()
            .filter_map(|k| serde_json::from_value(k).ok())
            .collect()
    }
}

/// Cached JWKS keys with fetch timestamp.
struct CachedKeys {
    keys: Vec<Jwk>,
    fetched_at: Instant,
}

/// JWKS-backed token validator.
pub struct JwksTokenValidator {
    cached: RwLock<Option<CachedKeys>>,
    config: JwtConfig,
    http_client: Option<reqwest::Client>,
}

impl JwksTokenValidator {
    /// Create a validator that fetches keys from `config.jwks_url`.
    pub fn new(config: JwtConfig) -> Self {
        Self {
            cached: RwLock::new(None),
            config,
            http_client: Some(reqwest::Client::new()),
        }
    }

    /// Create a validator with pre-loaded keys that never refreshes.
    pub fn with_static_keys(keys: Vec<Jwk>, config: JwtConfig) -> Self {
        Self {
            cached: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            })),
            config,
            http_client: None,
        }
    }

    /// Create a static-key validator from a JWKS JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::JwksFetchError`] if the document is not a JWKS.
    pub fn from_jwks_json(document: &str, config: JwtConfig) -> Result<Self, AuthError> {
        let response: JwksResponse = serde_json::from_str(document)
            .map_err(|e| AuthError::JwksFetchError(format!("invalid JWKS document: {e}")))?;
        Ok(Self::with_static_keys(response.into_rsa_keys(), config))
    }

    /// Verify signature and registered claims of a JWT.
    async fn verify(&self, token: &str) -> Result<(), AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidFormat(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidFormat("missing kid in JWT header".to_string()))?;

        let key = self.find_key(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

        decode::<serde_json::Value>(token, &decoding_key, &self.validation()).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                _ => AuthError::InvalidSignature(e.to_string()),
            }
        })?;

        log::debug!("Access token signature verified with key {kid}");
        Ok(())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.config.leeway_secs;
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if !self.config.issuers.is_empty() {
            validation.set_issuer(&self.config.issuers);
        }
        validation
    }

    /// Find a key by `kid`, fetching/refreshing the cache as needed.
    async fn find_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(key) = self.lookup_cached(kid) {
            return Ok(key);
        }

        if self.http_client.is_some() {
            self.refresh_keys().await?;
            if let Some(key) = self.lookup_cached(kid) {
                return Ok(key);
            }
        }

        Err(AuthError::NoMatchingKey(kid.to_string()))
    }

    fn lookup_cached(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cached.read().ok()?;
        let cached = cache.as_ref()?;

        if self.http_client.is_some() && cached.fetched_at.elapsed() > self.config.jwks_cache_ttl()
        {
            return None;
        }

        cached.keys.iter().find(|k| k.kid == kid).cloned()
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        let client = self.http_client.as_ref().ok_or_else(|| {
            AuthError::JwksFetchError("no HTTP client (static keys mode)".to_string())
        })?;

        log::debug!("Fetching JWKS from {}", self.config.jwks_url);
        let response: JwksResponse = client
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let mut cache = self
            .cached
            .write()
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        *cache = Some(CachedKeys {
            keys: response.into_rsa_keys(),
            fetched_at: Instant::now(),
        });

        Ok(())
    }
}

/// Decode the payload segment of a JWT into claims, without verifying it.
///
/// # Errors
///
/// Returns [`AuthError::InvalidFormat`] if the token is not three
/// dot-separated segments, [`AuthError::InvalidClaims`] if the payload is not
/// base64url-encoded JSON object.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(AuthError::InvalidFormat(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidClaims(format!("payload is not base64url: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidClaims(format!("payload is not JSON: {e}")))?;

    Claims::try_from(value)
        .map_err(|_| AuthError::InvalidClaims("payload is not a JSON object".to_string()))
}

#[async_trait]
impl TokenValidator for JwksTokenValidator {
    async fn validate_access_token(&self, token: &str) -> Result<(), AuthError> {
        self.verify(token).await
    }

    async fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode_claims(token)
    }
}
