//! OpenID Connect identity resolution.
//!
//! Provides:
//! - [`IdentityResolver`]: Resolves a bearer access token to a local [`User`],
//!   provisioning one in the email's authoritative domain on first sight
//! - [`TokenValidator`], [`UserDirectory`], [`DomainDirectory`], [`DirectoryBinding`]:
//!   Capability traits for the systems the resolver consults
//! - [`ResolutionOutcome`] / [`Rejection`]: Authenticated user or diagnostic
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware running the resolver per request
//! - [`memory`]: In-memory directories for local runs and tests
//! - [`AuthConfig`]: Configuration for the auth layer

mod config;
mod directory;
mod error;
mod middleware;
mod model;
mod resolver;
mod user;

pub mod memory;

#[cfg(test)]
mod proptests;

pub use config::AuthConfig;
pub use directory::{
    DirectoryBinding, DomainDirectory, NoDirectoryBinding, TokenValidator, TranslationContext,
    UserDirectory,
};
pub use error::{AuthError, ConfigError, DirectoryError, DirectoryResult};
pub use middleware::{AuthLayer, AuthService};
pub use model::{Claims, Domain, DomainId, EmailAddress, User, UserId, UserProfile};
pub use resolver::{
    IdentityResolver, PROVIDER_NAME, REJECTION_PREFIX, Rejection, RejectionCause,
    ResolutionOutcome,
};
pub use user::{email_from_parts, user_from_parts};
