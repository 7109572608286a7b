//! Capability traits the resolver is built from.
//!
//! Each external system the resolver talks to is one trait, injected as an
//! `Arc<dyn Trait>`. Implementations must be thread-safe; the resolver calls
//! them one at a time and never retries.

use async_trait::async_trait;

use crate::error::{AuthError, DirectoryResult};
use crate::model::{Claims, Domain, DomainId, User, UserProfile};

/// Verifies and decodes bearer access tokens.
///
/// Implement this for each identity provider.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Checks that the token is authentic and still valid.
    async fn validate_access_token(&self, token: &str) -> Result<(), AuthError>;

    /// Decodes the token's claims.
    async fn decode_token(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Context handed to [`UserDirectory::translate`].
#[derive(Debug, Clone, Copy)]
pub struct TranslationContext<'a> {
    /// Name of the authentication source, `"oidc"` for this resolver.
    pub provider: &'a str,
    /// Claims of the token being resolved.
    pub claims: &'a Claims,
}

/// Local user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by email. `Ok(None)` means no such user.
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<User>>;

    /// Creates a user from a profile. `Ok(None)` means nothing was created.
    async fn provision_user(&self, profile: UserProfile) -> DirectoryResult<Option<User>>;

    /// Normalizes a profile before provisioning. Identity by default.
    fn translate(&self, _context: &TranslationContext<'_>, profile: UserProfile) -> UserProfile {
        profile
    }
}

/// Domain registry.
#[async_trait]
pub trait DomainDirectory: Send + Sync {
    /// Looks up a domain by its DNS-style name.
    async fn get_by_name(&self, name: &str) -> DirectoryResult<Domain>;

    /// Loads a domain by identifier.
    async fn load(&self, id: &DomainId) -> DirectoryResult<Domain>;
}

/// External directory (e.g. LDAP) recording which domains an email is bound to.
#[async_trait]
pub trait DirectoryBinding: Send + Sync {
    /// Returns the domain IDs bound to `email`, most preferred first.
    ///
    /// `Ok(None)` and `Ok(Some(vec![]))` both mean "no binding".
    async fn find_domains_bound_to_email(
        &self,
        email: &str,
    ) -> DirectoryResult<Option<Vec<DomainId>>>;
}

/// Binding used when no external directory is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectoryBinding;

#[async_trait]
impl DirectoryBinding for NoDirectoryBinding {
    async fn find_domains_bound_to_email(
        &self,
        _email: &str,
    ) -> DirectoryResult<Option<Vec<DomainId>>> {
        Ok(None)
    }
}
