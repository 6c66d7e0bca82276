//! Core types for permission grants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while interpreting grant values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    #[error("invalid capability mode '{0}', expected Allow or Deny")]
    InvalidMode(String),

    #[error("invalid grantee entity type '{0}', expected users or groups")]
    InvalidEntityType(String),

    #[error("grantee must set exactly one of user ID or group ID (got '{user}' and '{group}')")]
    InvalidGrantee { user: String, group: String },
}

/// The principal a set of capabilities is granted to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grantee {
    User(String),
    Group(String),
}

impl Grantee {
    /// Build a grantee from the optional user/group pair used by state documents.
    ///
    /// Empty strings count as unset.
    pub fn from_pair(user_id: Option<&str>, group_id: Option<&str>) -> Result<Self, GrantError> {
        let user = user_id.unwrap_or_default();
        let group = group_id.unwrap_or_default();
        match (user.is_empty(), group.is_empty()) {
            (false, true) => Ok(Self::User(user.to_string())),
            (true, false) => Ok(Self::Group(group.to_string())),
            _ => Err(GrantError::InvalidGrantee {
                user: user.to_string(),
                group: group.to_string(),
            }),
        }
    }

    /// Build a grantee from a URL path segment (`users` / `groups`)
    pub fn from_entity(entity_type: &str, id: &str) -> Result<Self, GrantError> {
        match entity_type {
            "users" => Ok(Self::User(id.to_string())),
            "groups" => Ok(Self::Group(id.to_string())),
            other => Err(GrantError::InvalidEntityType(other.to_string())),
        }
    }

    /// Map key `"<userID>|<groupID>"`, exactly one side non-empty
    pub fn key(&self) -> String {
        match self {
            Self::User(id) => format!("{id}|"),
            Self::Group(id) => format!("|{id}"),
        }
    }

    /// Inverse of [`Grantee::key`]
    pub fn from_key(key: &str) -> Result<Self, GrantError> {
        let (user, group) = key.split_once('|').unwrap_or((key, ""));
        Self::from_pair(Some(user), Some(group))
    }

    /// Path segment used by the permissions API (`users` / `groups`)
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::User(_) => "users",
            Self::Group(_) => "groups",
        }
    }

    /// The user or group ID
    pub fn id(&self) -> &str {
        match self {
            Self::User(id) | Self::Group(id) => id,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        match self {
            Self::Group(id) => Some(id),
            Self::User(_) => None,
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}

/// Whether a capability is granted or explicitly denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityMode {
    Allow,
    Deny,
}

impl CapabilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl FromStr for CapabilityMode {
    type Err = GrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allow" => Ok(Self::Allow),
            "Deny" => Ok(Self::Deny),
            other => Err(GrantError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named capability and its mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub mode: CapabilityMode,
}

impl Capability {
    pub fn new(name: impl Into<String>, mode: CapabilityMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }

    pub fn allow(name: impl Into<String>) -> Self {
        Self::new(name, CapabilityMode::Allow)
    }

    pub fn deny(name: impl Into<String>) -> Self {
        Self::new(name, CapabilityMode::Deny)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.mode)
    }
}

/// A grantee with its ordered capability list
///
/// Capability names are unique within one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranteeCapability {
    pub grantee: Grantee,
    pub capabilities: Vec<Capability>,
}

impl GranteeCapability {
    pub fn new(grantee: Grantee, capabilities: Vec<Capability>) -> Self {
        Self {
            grantee,
            capabilities,
        }
    }
}

/// A single `(grantee, capability, mode)` grant to be removed remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub grantee: Grantee,
    pub capability: Capability,
}

impl fmt::Display for Revocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.grantee, self.capability)
    }
}

/// Outcome of one revoke call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevokeOutcome {
    Revoked,
    Failed { error: String },
}

impl RevokeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

/// Summary of a reconciliation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Grantees sent in the bulk write
    pub written: usize,
    pub revoked: usize,
    /// Revocations that failed, with their error text
    pub failed: Vec<(Revocation, String)>,
}

impl ReconcileSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.written + self.revoked
    }

    /// Record the outcome of a revoke call
    pub fn add_outcome(&mut self, revocation: &Revocation, outcome: &RevokeOutcome) {
        match outcome {
            RevokeOutcome::Revoked => self.revoked += 1,
            RevokeOutcome::Failed { error } => self.failed.push((revocation.clone(), error.clone())),
        }
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ReconcileSummary) {
        self.written += other.written;
        self.revoked += other.revoked;
        self.failed.extend(other.failed.iter().cloned());
    }
}
