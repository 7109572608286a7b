//! Identity and directory records handled during resolution.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of a domain in the domain directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(String);

impl DomainId {
    /// Creates a domain ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DomainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DomainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for DomainId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A domain known to the domain directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Directory identifier
    pub id: DomainId,
    /// DNS-style name, e.g. `open-paas.org`
    pub name: String,
}

impl Domain {
    /// Creates a domain record.
    pub fn new(id: impl Into<DomainId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Unique identifier for a local user, internally a UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A local user account, owned by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local identifier
    pub id: UserId,
    /// Primary email address
    pub email: String,
    /// Login name
    pub username: String,
    /// Domains the user belongs to
    #[serde(default)]
    pub domain_ids: Vec<DomainId>,
}

/// Creation payload handed to the user directory when provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Email asserted by the token
    pub email: String,
    /// Login name, the email unless translated
    pub username: String,
    /// Authoritative domain resolved for the email
    pub domain_id: DomainId,
}

impl UserProfile {
    /// Builds the default profile: username is the email, domain is the resolved one.
    pub fn new(email: &EmailAddress, domain: &Domain) -> Self {
        Self {
            email: email.as_str().to_string(),
            username: email.as_str().to_string(),
            domain_id: domain.id.clone(),
        }
    }
}

/// A syntactically usable email address: non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    raw: String,
    at: usize,
}

impl EmailAddress {
    /// Parses an address, splitting on the last `@`.
    ///
    /// Returns `None` when either side of the `@` is empty or the value
    /// contains whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        if value.chars().any(char::is_whitespace) {
            return None;
        }
        let at = value.rfind('@')?;
        if at == 0 || at + 1 == value.len() {
            return None;
        }
        Some(Self {
            raw: value.to_string(),
            at,
        })
    }

    /// The full address.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Part before the `@`.
    pub fn local_part(&self) -> &str {
        &self.raw[..self.at]
    }

    /// Part after the `@`, used as the fallback domain name.
    pub fn domain_name(&self) -> &str {
        &self.raw[self.at + 1..]
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Claims decoded from an access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns a raw claim value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a claim as a string, if it is one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// The `email` claim, when present as a non-empty string.
    pub fn email(&self) -> Option<&str> {
        self.get_str("email").filter(|e| !e.is_empty())
    }

    /// The `sub` claim.
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Claims {
    type Error = Value;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
