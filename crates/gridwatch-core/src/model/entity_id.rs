// ── Core identity type ──
//
// Every persisted record carries an EntityId. Records created by the store
// get a random UUID; registry entries such as sites keep their human
// assigned code (e.g. "SITE-001").

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any gridwatch record.
///
/// Transparently wraps either a UUID (store-assigned) or a named code
/// (operator-assigned). Consumers never care which.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Named(String),
}

impl EntityId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self::Uuid(Uuid::new_v4())
    }

    /// Placeholder carried by records that have not been persisted yet.
    /// The store replaces it on `create`.
    pub fn unassigned() -> Self {
        Self::Uuid(Uuid::nil())
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Self::Uuid(u) if u.is_nil())
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            Self::Named(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(s) => Some(s),
            Self::Uuid(_) => None,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::unassigned()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Named(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}
