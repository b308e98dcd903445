//! Context fetching: profile and latest audit for one user.
//!
//! `DocumentStore` calls block, so they run on tokio's blocking pool. A
//! semaphore caps how many lookups are in flight at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;
use veridian_core::chat::UserContext;
use veridian_core::error::ContextError;
use veridian_core::store::DocumentStore;

pub struct ContextFetcher {
    store: Arc<dyn DocumentStore>,
    permits: Arc<Semaphore>,
}

impl ContextFetcher {
    pub fn new(store: Arc<dyn DocumentStore>, max_concurrent: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Read the user's context. Missing documents are not errors.
    pub async fn fetch(&self, user_id: &str) -> Result<UserContext, ContextError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ContextError::Unavailable("context fetcher is shut down".into()))?;

        let store = self.store.clone();
        let user = user_id.to_string();
        // The permit moves into the closure: a dropped caller does not free
        // the slot while the blocking read is still running.
        let (profile, audit) = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let profile = store.get_profile(&user)?;
            let audit = store.get_latest_audit(&user)?;
            Ok::<_, ContextError>((profile, audit))
        })
        .await
        .map_err(|e| ContextError::Unavailable(format!("store lookup task failed: {e}")))??;

        debug!(
            user_id,
            has_profile = profile.is_some(),
            has_audit = audit.is_some(),
            "User context fetched"
        );
        Ok(UserContext::new(profile, audit.map(|a| a.answers)))
    }
}
