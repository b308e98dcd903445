//! File-based document store: one JSON document per file.
//!
//! Layout under the root directory:
//!
//! ```text
//! users/<user>.json            profile document
//! audits/<user>/<anything>.json  one AuditRecord per file
//! ```
//!
//! `<user>` is the user ID with every byte outside `[A-Za-z0-9_-]` written as
//! `%XX`, so IDs can never escape the root. Reads hit the disk on every call;
//! nothing is cached.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use veridian_core::error::StoreError;
use veridian_core::record::Record;
use veridian_core::store::{AuditRecord, DocumentStore, latest_audit};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        debug!(root = %root.display(), "File document store opened");
        Self { root }
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join("users")
            .join(format!("{}.json", encode_id(user_id)))
    }

    fn audit_dir(&self, user_id: &str) -> PathBuf {
        self.root.join("audits").join(encode_id(user_id))
    }

    /// Write (or replace) a user's profile. Used for seeding.
    pub fn put_profile(&self, user_id: &str, profile: &Record) -> Result<(), StoreError> {
        write_json(&self.profile_path(user_id), profile)
    }

    /// Store one audit under its user. Used for seeding.
    pub fn add_audit(&self, audit: &AuditRecord) -> Result<PathBuf, StoreError> {
        let name = format!("{}.json", audit.timestamp.format("%Y%m%dT%H%M%S%.3fZ"));
        let path = self.audit_dir(&audit.user_id).join(name);
        write_json(&path, audit)?;
        Ok(path)
    }
}

impl DocumentStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Record>, StoreError> {
        read_json(&self.profile_path(user_id))
    }

    fn get_latest_audit(&self, user_id: &str) -> Result<Option<AuditRecord>, StoreError> {
        let dir = self.audit_dir(user_id);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut audits = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&dir, e))?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            if let Some(audit) = read_json::<AuditRecord>(&path)? {
                if audit.user_id == user_id {
                    audits.push(audit);
                }
            }
        }

        debug!(user_id, scanned = audits.len(), "Latest audit resolved");
        Ok(latest_audit(&audits).cloned())
    }
}

fn encode_id(user_id: &str) -> String {
    let mut encoded = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Storage(format!("{}: {err}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            document: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Corrupt {
        document: path.display().to_string(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| io_error(path, e))
}
