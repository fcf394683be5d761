//! Record identity: persisted row id or a local placeholder
//!
//! Optimistic creates insert a record before the database has assigned it an
//! id. Such records carry `Identity::Pending` until the write reconciles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique placeholder for a record that has not been saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalToken(u64);

impl LocalToken {
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LocalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity<Id = i64> {
    Persisted(Id),
    Pending(LocalToken),
}

impl<Id: Copy + fmt::Display> Identity<Id> {
    pub fn pending() -> Self {
        Identity::Pending(LocalToken::next())
    }

    pub fn persisted(&self) -> Option<Id> {
        match self {
            Identity::Persisted(id) => Some(*id),
            Identity::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Identity::Pending(_))
    }

    /// The row id, or `NotPersisted` for a placeholder
    pub fn require(&self, entity: &'static str) -> Result<Id> {
        match self {
            Identity::Persisted(id) => Ok(*id),
            Identity::Pending(token) => Err(Error::NotPersisted {
                entity,
                id: token.to_string(),
            }),
        }
    }
}

impl<Id: fmt::Display> fmt::Display for Identity<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Persisted(id) => id.fmt(f),
            Identity::Pending(token) => token.fmt(f),
        }
    }
}

impl<Id> From<Id> for Identity<Id> {
    fn from(id: Id) -> Self {
        Identity::Persisted(id)
    }
}
