//! TOML description of a local directory.
//!
//! ```toml
//! [[domains]]
//! id = "1"
//! name = "open-paas.org"
//!
//! [[users]]
//! email = "chamerling@open-paas.org"
//! domain_ids = ["1"]
//!
//! [[bindings]]
//! email = "chamerling@open-paas.org"
//! domain_ids = ["1"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use oidc_resolver::memory::{InMemoryDomainDirectory, InMemoryUserDirectory, StaticDirectoryBinding};
use oidc_resolver::{Domain, DomainId, User, UserId};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DirectoryFile {
    pub domains: Vec<DomainEntry>,
    pub users: Vec<UserEntry>,
    pub bindings: Vec<BindingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DomainEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserEntry {
    pub id: Option<UserId>,
    pub email: String,
    pub username: Option<String>,
    #[serde(default)]
    pub domain_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BindingEntry {
    pub email: String,
    pub domain_ids: Vec<String>,
}

/// In-memory collaborators seeded from a directory file.
pub struct Directories {
    pub users: InMemoryUserDirectory,
    pub domains: InMemoryDomainDirectory,
    pub binding: StaticDirectoryBinding,
}

impl DirectoryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read directory file {}", path.display()))?;
        Self::from_toml_str(&document)
            .with_context(|| format!("invalid directory file {}", path.display()))
    }

    pub fn from_toml_str(document: &str) -> Result<Self> {
        let file: Self = toml::from_str(document)?;
        file.check()?;
        Ok(file)
    }

    fn check(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for domain in &self.domains {
            if !ids.insert(domain.id.as_str()) {
                bail!("duplicate domain id {:?}", domain.id);
            }
        }

        let mut emails = HashSet::new();
        for user in &self.users {
            if !emails.insert(user.email.to_lowercase()) {
                bail!("duplicate user email {:?}", user.email);
            }
            if let Some(unknown) = user.domain_ids.iter().find(|id| !ids.contains(id.as_str())) {
                bail!("user {:?} references unknown domain {unknown:?}", user.email);
            }
        }

        for binding in &self.bindings {
            if binding.domain_ids.is_empty() {
                log::warn!(
                    "binding for {} lists no domains; the email suffix will be used",
                    binding.email
                );
            }
        }
        Ok(())
    }

    pub fn into_directories(self) -> Directories {
        let domains = InMemoryDomainDirectory::with_domains(
            self.domains
                .into_iter()
                .map(|d| Domain::new(d.id, d.name)),
        );

        let users = InMemoryUserDirectory::with_users(self.users.into_iter().map(|u| User {
            id: u.id.unwrap_or_default(),
            username: u.username.unwrap_or_else(|| u.email.clone()),
            email: u.email,
            domain_ids: u.domain_ids.into_iter().map(DomainId::from).collect(),
        }));

        let binding = self
            .bindings
            .into_iter()
            .fold(StaticDirectoryBinding::new(), |binding, b| {
                binding.bind(&b.email, b.domain_ids.into_iter().map(DomainId::from))
            });

        Directories {
            users,
            domains,
            binding,
        }
    }
}
