//! Core domain types for the scriptwatch file registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// FileId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for file record identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub Uuid);

impl FileId {
    /// Generate a new time-sortable file identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// A registered remote JavaScript resource and its last known content.
///
/// Field names are part of the wire contract: every ingress channel and the
/// persisted row use exactly these names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique identifier, assigned at creation.
    pub id: FileId,
    /// Absolute URL of the remote resource; immutable after creation.
    pub url: String,
    /// Host component of `url`, derived once at creation.
    pub host: String,
    /// Last successfully fetched content; `None` until the first fetch.
    pub content: Option<String>,
    /// Fetch priority in the closed range [1, 5].
    pub priority: u8,
    /// Owning tenant.
    pub company_id: Uuid,
    /// Set together with `content` on every successful fetch.
    pub last_fetched: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// FileDescriptor
// ---------------------------------------------------------------------------

/// An incoming "register this file" request, prior to validation.
///
/// Fields arrive as raw caller input; the registry service validates and
/// normalizes them before any record is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Candidate URL; must be absolute with a path ending in `.js`.
    pub url: String,
    /// Candidate priority; must be within [1, 5].
    pub priority: i64,
    /// Candidate tenant identifier; must parse as a UUID.
    pub company_id: String,
}
