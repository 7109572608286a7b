//! Access token to local user resolution.
//!
//! [`IdentityResolver::resolve`] validates a bearer token, reads the asserted
//! email and maps it to a local [`User`], provisioning one in the email's
//! authoritative domain when none exists yet.
//!
//! Every collaborator failure becomes a [`Rejection`]; the `Err` arm of
//! `resolve` is reserved for protocol errors the resolver cannot classify.

use std::sync::Arc;
use std::time::Duration;

use crate::directory::{
    DirectoryBinding, DomainDirectory, TokenValidator, TranslationContext, UserDirectory,
};
use crate::error::{AuthError, DirectoryError};
use crate::model::{Domain, EmailAddress, User, UserProfile};

/// Prefix shared by every rejection diagnostic.
pub const REJECTION_PREFIX: &str = "Cannot validate OpenID Connect accessToken: ";

/// Provider name passed to [`UserDirectory::translate`].
pub const PROVIDER_NAME: &str = "oidc";

/// Why a token did not resolve to a user.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RejectionCause {
    /// The token validator refused the token.
    #[error("{0}")]
    InvalidToken(AuthError),

    /// The token could not be decoded into claims.
    #[error("{0}")]
    UndecodableToken(AuthError),

    /// The claims carry no `email`.
    #[error("API Auth - OIDC : Payload must contain required \"email\" field")]
    MissingEmail,

    /// The `email` claim is not a usable address.
    #[error("API Auth - OIDC : Payload \"email\" field is not a valid address")]
    InvalidEmail,

    /// Looking up the existing user failed.
    #[error("{0}")]
    UserLookup(DirectoryError),

    /// Neither the directory binding nor the email suffix led to a domain.
    #[error("Can not find any valid domain for {email}")]
    NoDomain {
        /// The email being resolved
        email: String,
    },

    /// The user directory failed to provision the user.
    #[error("{0}")]
    Provisioning(DirectoryError),

    /// Provisioning succeeded but returned no user.
    #[error("No user found nor created from accessToken")]
    NothingProvisioned,

    /// Resolution was cut short by the caller's time budget.
    #[error("identity resolution timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// A failed resolution with its diagnostic.
///
/// `Display` renders the full diagnostic, prefixed with [`REJECTION_PREFIX`].
#[derive(Debug, thiserror::Error)]
#[error("Cannot validate OpenID Connect accessToken: {cause}")]
pub struct Rejection {
    cause: RejectionCause,
}

impl Rejection {
    /// Wraps a cause.
    pub fn new(cause: RejectionCause) -> Self {
        Self { cause }
    }

    /// The specific cause.
    pub fn cause(&self) -> &RejectionCause {
        &self.cause
    }

    /// The full diagnostic message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the rejection came from a time budget rather than a collaborator.
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, RejectionCause::TimedOut(_))
    }
}

impl From<RejectionCause> for Rejection {
    fn from(cause: RejectionCause) -> Self {
        Self::new(cause)
    }
}

/// Result of resolving one access token.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// The token maps to this user (existing or freshly provisioned).
    Authenticated(User),
    /// Authentication did not succeed.
    Rejected(Rejection),
}

impl ResolutionOutcome {
    /// Whether a user was resolved.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, ResolutionOutcome::Authenticated(_))
    }

    /// The resolved user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            ResolutionOutcome::Authenticated(user) => Some(user),
            ResolutionOutcome::Rejected(_) => None,
        }
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ResolutionOutcome::Authenticated(_) => None,
            ResolutionOutcome::Rejected(rejection) => Some(rejection),
        }
    }

    /// Converts into a `Result`, rejection as the error.
    pub fn into_result(self) -> Result<User, Rejection> {
        match self {
            ResolutionOutcome::Authenticated(user) => Ok(user),
            ResolutionOutcome::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Resolves OpenID Connect access tokens to local users.
///
/// Stateless between calls; cheap to clone.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<dyn TokenValidator>,
    users: Arc<dyn UserDirectory>,
    domains: Arc<dyn DomainDirectory>,
    binding: Arc<dyn DirectoryBinding>,
}

impl IdentityResolver {
    /// Creates a resolver over the given collaborators.
    pub fn new(
        tokens: Arc<dyn TokenValidator>,
        users: Arc<dyn UserDirectory>,
        domains: Arc<dyn DomainDirectory>,
        binding: Arc<dyn DirectoryBinding>,
    ) -> Self {
        Self {
            tokens,
            users,
            domains,
            binding,
        }
    }

    /// Resolves an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] for an empty token. Every other
    /// failure is reported as [`ResolutionOutcome::Rejected`].
    pub async fn resolve(&self, access_token: &str) -> Result<ResolutionOutcome, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        match self.authenticate(access_token).await {
            Ok(user) => Ok(ResolutionOutcome::Authenticated(user)),
            Err(cause) => {
                let rejection = Rejection::new(cause);
                log::debug!("{rejection}");
                Ok(ResolutionOutcome::Rejected(rejection))
            }
        }
    }

    /// Resolves an access token within an optional time budget.
    ///
    /// An exhausted budget is reported as a [`RejectionCause::TimedOut`]
    /// rejection.
    ///
    /// # Errors
    ///
    /// As [`IdentityResolver::resolve`].
    pub async fn resolve_within(
        &self,
        access_token: &str,
        budget: Option<Duration>,
    ) -> Result<ResolutionOutcome, AuthError> {
        let Some(budget) = budget else {
            return self.resolve(access_token).await;
        };

        match tokio::time::timeout(budget, self.resolve(access_token)).await {
            Ok(resolution) => resolution,
            Err(_elapsed) => Ok(ResolutionOutcome::Rejected(Rejection::new(
                RejectionCause::TimedOut(budget),
            ))),
        }
    }

    async fn authenticate(&self, token: &str) -> Result<User, RejectionCause> {
        self.tokens
            .validate_access_token(token)
            .await
            .map_err(RejectionCause::InvalidToken)?;

        let claims = self
            .tokens
            .decode_token(token)
            .await
            .map_err(RejectionCause::UndecodableToken)?;

        let email = claims.email().ok_or(RejectionCause::MissingEmail)?;
        let email = EmailAddress::parse(email).ok_or(RejectionCause::InvalidEmail)?;

        if let Some(user) = self
            .users
            .find_by_email(email.as_str())
            .await
            .map_err(RejectionCause::UserLookup)?
        {
            log::debug!("Token resolved to existing user {} ({email})", user.id);
            return Ok(user);
        }

        let domain = self
            .resolve_domain(&email)
            .await
            .ok_or_else(|| RejectionCause::NoDomain {
                email: email.to_string(),
            })?;

        let context = TranslationContext {
            provider: PROVIDER_NAME,
            claims: &claims,
        };
        let profile = self
            .users
            .translate(&context, UserProfile::new(&email, &domain));

        let user = self
            .users
            .provision_user(profile)
            .await
            .map_err(RejectionCause::Provisioning)?
            .ok_or(RejectionCause::NothingProvisioned)?;

        log::info!(
            "Provisioned user {} for {email} in domain {}",
            user.id,
            domain.name
        );
        Ok(user)
    }

    /// Finds the domain authoritative for `email`.
    ///
    /// Only the first bound domain is tried; any failure falls back to the
    /// domain named by the email suffix.
    async fn resolve_domain(&self, email: &EmailAddress) -> Option<Domain> {
        let candidates = match self
            .binding
            .find_domains_bound_to_email(email.as_str())
            .await
        {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                log::debug!("Directory binding lookup failed for {email}: {e}");
                Vec::new()
            }
        };

        if let Some(first) = candidates.first() {
            match self.domains.load(first).await {
                Ok(domain) => return Some(domain),
                Err(e) => log::debug!("Bound domain {first} for {email} did not load: {e}"),
            }
        }

        match self.domains.get_by_name(email.domain_name()).await {
            Ok(domain) => Some(domain),
            Err(e) => {
                log::debug!("No domain named {} for {email}: {e}", email.domain_name());
                None
            }
        }
    }
}
