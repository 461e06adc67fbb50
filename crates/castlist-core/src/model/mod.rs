//! Roster vocabulary shared by every subsystem: definitions, members, and
//! the small identifier newtypes that travel between them.

mod member;
mod roster;


pub use member::*;
pub use roster::*;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

///
/// TenantId
///
/// One isolated roster namespace (a guild/workspace on the host platform).
///

#[derive(Clone, Debug, Deref, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

///
/// GroupRef
///
/// External platform group (role/tribe) identifier.
///

#[derive(Clone, Debug, Deref, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GroupRef(String);

impl GroupRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
