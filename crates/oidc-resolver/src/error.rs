//! Error types for token handling, directory collaborators and configuration.

use std::path::PathBuf;

/// Errors raised while validating or decoding an access token.
///
/// Also used as the protocol-error arm of
/// [`IdentityResolver::resolve`](crate::IdentityResolver::resolve).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No bearer token present, or the token is empty.
    #[error("missing authentication token")]
    MissingToken,

    /// Token format is invalid (not a well-formed JWT).
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// JWT signature verification failed.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token audience doesn't match the configured client ID.
    #[error("invalid audience")]
    InvalidAudience,

    /// Token issuer is not one of the trusted issuers.
    #[error("invalid issuer")]
    InvalidIssuer,

    /// Token payload could not be read as a claims object.
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// The identity provider refused the token.
    #[error("identity provider rejected token: {0}")]
    Provider(String),

    /// Failed to fetch JWKS from the identity provider.
    #[error("failed to fetch JWKS: {0}")]
    JwksFetchError(String),

    /// No key in the JWKS matches the token's kid.
    #[error("no matching key for kid '{0}'")]
    NoMatchingKey(String),
}

impl AuthError {
    /// Whether this error is caused by the presented token (vs. a server-side failure).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::JwksFetchError(_))
    }
}

/// Errors reported by the user, domain and directory-binding collaborators.
///
/// Messages are carried verbatim into rejection diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DirectoryError {
    /// The requested record does not exist.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of record ("domain", "user", ...)
        kind: &'static str,
        /// Lookup key that matched nothing
        key: String,
    },

    /// A record with the same key already exists.
    #[error("{kind} already exists: {key}")]
    Conflict {
        /// Kind of record
        kind: &'static str,
        /// Conflicting key
        key: String,
    },

    /// The backing store could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure, message preserved as-is.
    #[error("{0}")]
    Backend(String),
}

impl DirectoryError {
    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        DirectoryError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(kind: &'static str, key: impl Into<String>) -> Self {
        DirectoryError::Conflict {
            kind,
            key: key.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        DirectoryError::Unavailable(message.into())
    }

    /// Creates a backend error carrying the message unchanged.
    pub fn backend(message: impl Into<String>) -> Self {
        DirectoryError::Backend(message.into())
    }
}

/// Result alias for directory collaborator calls.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid TOML for the expected shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
