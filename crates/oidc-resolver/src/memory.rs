//! In-memory directory implementations.
//!
//! Thread-safe stand-ins for the user, domain and directory-binding stores,
//! used for local runs and tests. Email and domain-name keys are matched
//! case-insensitively.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::directory::{DirectoryBinding, DomainDirectory, TranslationContext, UserDirectory};
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{Domain, DomainId, User, UserId, UserProfile};

/// Hook applied to profiles before provisioning.
pub type TranslateFn = dyn Fn(&TranslationContext<'_>, UserProfile) -> UserProfile + Send + Sync;

fn key(value: &str) -> String {
    value.to_lowercase()
}

fn poisoned(store: &str) -> DirectoryError {
    DirectoryError::unavailable(format!("{store} store lock poisoned"))
}

/// User store keyed by email.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
    translator: Option<Box<TranslateFn>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with users.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (key(&u.email), u)).collect();
        Self {
            users: RwLock::new(users),
            translator: None,
        }
    }

    /// Installs a profile translation hook.
    #[must_use]
    pub fn with_translator<F>(mut self, translator: F) -> Self
    where
        F: Fn(&TranslationContext<'_>, UserProfile) -> UserProfile + Send + Sync + 'static,
    {
        self.translator = Some(Box::new(translator));
        self
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] if the store lock is poisoned.
    pub fn len(&self) -> DirectoryResult<usize> {
        let users = self.users.read().map_err(|_| poisoned("user"))?;
        Ok(users.len())
    }

    /// Whether the store is empty.
    ///
    /// # Errors
    ///
    /// As [`InMemoryUserDirectory::len`].
    pub fn is_empty(&self) -> DirectoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned("user"))?;
        Ok(users.get(&key(email)).cloned())
    }

    async fn provision_user(&self, profile: UserProfile) -> DirectoryResult<Option<User>> {
        let mut users = self.users.write().map_err(|_| poisoned("user"))?;
        let email_key = key(&profile.email);
        if users.contains_key(&email_key) {
            return Err(DirectoryError::conflict("user", profile.email));
        }

        let user = User {
            id: UserId::new(),
            email: profile.email,
            username: profile.username,
            domain_ids: vec![profile.domain_id],
        };
        users.insert(email_key, user.clone());
        Ok(Some(user))
    }

    fn translate(&self, context: &TranslationContext<'_>, profile: UserProfile) -> UserProfile {
        match &self.translator {
            Some(translate) => translate(context, profile),
            None => profile,
        }
    }
}

/// Domain registry keyed by identifier.
#[derive(Debug, Default)]
pub struct InMemoryDomainDirectory {
    domains: RwLock<HashMap<DomainId, Domain>>,
}

impl InMemoryDomainDirectory {
    /// Creates a registry seeded with domains.
    pub fn with_domains(domains: impl IntoIterator<Item = Domain>) -> Self {
        let domains = domains.into_iter().map(|d| (d.id.clone(), d)).collect();
        Self {
            domains: RwLock::new(domains),
        }
    }

}

#[async_trait]
impl DomainDirectory for InMemoryDomainDirectory {
    async fn get_by_name(&self, name: &str) -> DirectoryResult<Domain> {
        let domains = self.domains.read().map_err(|_| poisoned("domain"))?;
        domains
            .values()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| DirectoryError::not_found("domain", name))
    }

    async fn load(&self, id: &DomainId) -> DirectoryResult<Domain> {
        let domains = self.domains.read().map_err(|_| poisoned("domain"))?;
        domains
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found("domain", id.as_str()))
    }
}

/// Fixed email to domain-ID table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectoryBinding {
    bindings: HashMap<String, Vec<DomainId>>,
}

impl StaticDirectoryBinding {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an email to domains, most preferred first.
    #[must_use]
    pub fn bind(mut self, email: &str, domain_ids: impl IntoIterator<Item = DomainId>) -> Self {
        self.bindings
            .insert(key(email), domain_ids.into_iter().collect());
        self
    }
}

#[async_trait]
impl DirectoryBinding for StaticDirectoryBinding {
    async fn find_domains_bound_to_email(
        &self,
        email: &str,
    ) -> DirectoryResult<Option<Vec<DomainId>>> {
        Ok(self.bindings.get(&key(email)).cloned())
    }
}
