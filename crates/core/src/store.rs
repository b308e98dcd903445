//! DocumentStore trait: read-only access to user documents.
//!
//! The store is an external collaborator. The chat pipeline only needs a
//! profile lookup by user ID and the latest audit for a user (ordered by
//! timestamp descending, limit 1). There is no write path here.
//!
//! Calls are **blocking**; async callers must dispatch them to a blocking
//! pool (see `veridian-chat::ContextFetcher`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::Record;

/// One home-audit submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The user who submitted the audit
    pub user_id: String,

    /// When the audit was submitted
    pub timestamp: DateTime<Utc>,

    /// Survey answers keyed by question
    #[serde(default)]
    pub answers: Record,
}

/// The core DocumentStore trait.
///
/// Implementations: in-memory (for testing and seeding), JSON file directory.
/// "No document" is `Ok(None)`, never an error.
pub trait DocumentStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Fetch a user's profile document.
    fn get_profile(&self, user_id: &str) -> Result<Option<Record>, StoreError>;

    /// Fetch the most recent audit for a user.
    fn get_latest_audit(&self, user_id: &str) -> Result<Option<AuditRecord>, StoreError>;
}

/// Pick the newest audit. Ties keep the first one seen.
pub fn latest_audit<'a, I>(audits: I) -> Option<&'a AuditRecord>
where
    I: IntoIterator<Item = &'a AuditRecord>,
{
    audits
        .into_iter()
        .fold(None, |best: Option<&AuditRecord>, audit| match best {
            Some(b) if b.timestamp >= audit.timestamp => Some(b),
            _ => Some(audit),
        })
}
