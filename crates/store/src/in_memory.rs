//! In-memory backend: useful for testing and ephemeral deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use veridian_core::error::StoreError;
use veridian_core::record::Record;
use veridian_core::store::{AuditRecord, DocumentStore, latest_audit};

/// Profiles keyed by user ID plus a flat list of audits.
#[derive(Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, Record>>,
    audits: RwLock<Vec<AuditRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_profile(&self, user_id: impl Into<String>, profile: Record) {
        self.profiles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id.into(), profile);
    }

    pub fn add_audit(&self, audit: AuditRecord) {
        self.audits
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(audit);
    }
}

impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Record>, StoreError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| StoreError::Storage("profile map lock poisoned".into()))?;
        Ok(profiles.get(user_id).cloned())
    }

    fn get_latest_audit(&self, user_id: &str) -> Result<Option<AuditRecord>, StoreError> {
        let audits = self
            .audits
            .read()
            .map_err(|_| StoreError::Storage("audit list lock poisoned".into()))?;
        Ok(latest_audit(audits.iter().filter(|a| a.user_id == user_id)).cloned())
    }
}
